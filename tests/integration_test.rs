mod common;

use anyhow::Result;
use cardledger::application::AppError;
use cardledger::domain::CardView;
use common::{test_service, Cardholder};
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_list_users() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let grace = service
        .create_user("Grace".into(), "grace@example.com".into())
        .await?;
    service
        .create_user("Alan".into(), "alan@example.com".into())
        .await?;

    let users = service.list_users().await?;
    let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Alan", "Grace"]);

    let fetched = service.get_user(grace.id).await?;
    assert_eq!(fetched.email, "grace@example.com");

    Ok(())
}

#[tokio::test]
async fn test_create_user_rejects_blank_fields() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.create_user("  ".into(), "x@example.com".into()).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));

    let result = service.create_user("Bob".into(), "".into()).await;
    assert!(matches!(result, Err(AppError::InvalidInput(_))));

    Ok(())
}

#[tokio::test]
async fn test_delete_user_removes_cards() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Cardholder::create(&service, "4111").await?;

    service.delete_user(holder.user.id).await?;

    assert!(matches!(
        service.get_user(holder.user.id).await,
        Err(AppError::UserNotFound(_))
    ));
    assert!(matches!(
        service.get_card("4111").await,
        Err(AppError::CardNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_delete_unknown_user() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.delete_user(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::UserNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_add_card_and_list() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Cardholder::create(&service, "4111").await?;

    service
        .add_card(holder.user.id, "Amex".into(), "3782".into())
        .await?;

    let cards = service.list_cards_for_user(holder.user.id).await?;
    assert_eq!(cards.len(), 2);
    assert!(cards.contains(&CardView {
        issuance_bank: "Amex".into(),
        number: "3782".into(),
    }));

    Ok(())
}

#[tokio::test]
async fn test_add_card_to_unknown_user() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .add_card(Uuid::new_v4(), "Chase".into(), "4111".into())
        .await;
    assert!(matches!(result, Err(AppError::UserNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_card_number_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Cardholder::create(&service, "4111").await?;

    let result = service
        .add_card(holder.user.id, "Other".into(), "4111".into())
        .await;
    assert!(matches!(result, Err(AppError::CardAlreadyExists(_))));

    Ok(())
}

#[tokio::test]
async fn test_list_cards_for_unknown_user() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.list_cards_for_user(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::UserNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_user_id_for_card() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let holder = Cardholder::create(&service, "4111").await?;

    assert_eq!(service.get_user_id_for_card("4111").await?, holder.user.id);
    assert!(matches!(
        service.get_user_id_for_card("0000").await,
        Err(AppError::CardNotFound(_))
    ));

    Ok(())
}
