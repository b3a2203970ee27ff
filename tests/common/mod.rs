// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use cardledger::application::CardService;
use cardledger::domain::{CreditCard, User};
use chrono::NaiveDate;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(CardService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = CardService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a YYYY-MM-DD date
pub fn date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Test fixture: one user holding one card
pub struct Cardholder {
    pub user: User,
    pub card: CreditCard,
}

impl Cardholder {
    pub async fn create(service: &CardService, card_number: &str) -> Result<Self> {
        let user = service
            .create_user("Ada Lovelace".into(), format!("{}@example.com", card_number))
            .await?;
        let card = service
            .add_card(user.id, "Test Bank".into(), card_number.into())
            .await?;
        Ok(Self { user, card })
    }
}

/// Overwrite a card's stored balance history behind the service's back
pub async fn overwrite_balance_history(
    temp: &TempDir,
    card_number: &str,
    history: &str,
) -> Result<()> {
    let db_url = format!("sqlite:{}", temp.path().join("test.db").display());
    let pool = sqlx::SqlitePool::connect(&db_url).await?;
    sqlx::query("UPDATE credit_cards SET balance_history = ? WHERE number = ?")
        .bind(history)
        .bind(card_number)
        .execute(&pool)
        .await?;
    pool.close().await;
    Ok(())
}
