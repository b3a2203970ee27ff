use chrono::NaiveDate;

use crate::domain::{group_by_card, BalanceUpdate, CardView, Cents, CreditCard, User, UserId};
use crate::storage::Repository;

use super::AppError;

/// Application service providing high-level operations on users, cards
/// and card balance histories.
/// This is the primary interface for any client (CLI, importers, tests).
pub struct CardService {
    repo: Repository,
}

/// Outcome of applying one batch of balance updates
#[derive(Debug, Clone, Default)]
pub struct UpdateSummary {
    pub cards_updated: usize,
    pub updates_applied: usize,
}

/// Balance of a card on a date
#[derive(Debug, Clone)]
pub struct BalanceEntry {
    pub card_number: String,
    pub date: Option<NaiveDate>,
    pub balance: Cents,
}

/// Filter for a balance history window
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl CardService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // User operations
    // ========================

    pub async fn create_user(&self, name: String, email: String) -> Result<User, AppError> {
        let name = name.trim().to_string();
        let email = email.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("User name must not be empty".into()));
        }
        if email.is_empty() {
            return Err(AppError::InvalidInput("User email must not be empty".into()));
        }

        let user = User::new(name, email);
        self.repo.save_user(&user).await?;
        tracing::info!(user_id = %user.id, "created user");
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.repo.list_users().await?)
    }

    /// Delete a user together with their cards.
    pub async fn delete_user(&self, id: UserId) -> Result<(), AppError> {
        if !self.repo.delete_user(id).await? {
            return Err(AppError::UserNotFound(id.to_string()));
        }
        tracing::info!(user_id = %id, "deleted user");
        Ok(())
    }

    // ========================
    // Credit card operations
    // ========================

    /// Issue a new card to an existing user. Card numbers are unique.
    pub async fn add_card(
        &self,
        user_id: UserId,
        issuance_bank: String,
        number: String,
    ) -> Result<CreditCard, AppError> {
        let number = number.trim().to_string();
        if number.is_empty() {
            return Err(AppError::InvalidInput("Card number must not be empty".into()));
        }

        let user = self.get_user(user_id).await?;
        if self.repo.get_card_by_number(&number).await?.is_some() {
            return Err(AppError::CardAlreadyExists(number));
        }

        let card = CreditCard::new(user.id, issuance_bank, number);
        self.repo.save_card(&card).await?;
        tracing::info!(card_id = %card.id, user_id = %user.id, "added credit card");
        Ok(card)
    }

    pub async fn get_card(&self, number: &str) -> Result<CreditCard, AppError> {
        self.repo
            .get_card_by_number(number)
            .await?
            .ok_or_else(|| AppError::CardNotFound(number.to_string()))
    }

    pub async fn list_cards_for_user(&self, user_id: UserId) -> Result<Vec<CardView>, AppError> {
        let user = self.get_user(user_id).await?;
        let cards = self.repo.list_cards_for_user(user.id).await?;
        Ok(cards.iter().map(CreditCard::view).collect())
    }

    pub async fn get_user_id_for_card(&self, number: &str) -> Result<UserId, AppError> {
        Ok(self.get_card(number).await?.owner)
    }

    // ========================
    // Balance history operations
    // ========================

    /// Apply a batch of balance updates.
    ///
    /// Updates are grouped by card and each group is applied in date order.
    /// Every card is resolved and updated in memory before anything is
    /// written, so an unknown card number or an out-of-range balance rejects
    /// the whole batch.
    pub async fn update_balances(
        &self,
        updates: Vec<BalanceUpdate>,
    ) -> Result<UpdateSummary, AppError> {
        let batches = group_by_card(updates);

        let mut cards = Vec::with_capacity(batches.len());
        let mut summary = UpdateSummary::default();
        for batch in batches {
            let mut card = self.get_card(&batch.card_number).await?;
            summary.updates_applied += batch.updates.len();
            if let Err(e) = card.balance_history.apply_updates(batch.updates) {
                tracing::warn!(card = %card.number, error = %e, "balance batch rejected");
                return Err(e.into());
            }
            cards.push(card);
        }

        for card in cards {
            self.repo
                .save_balance_history(card.id, &card.balance_history)
                .await?;
            summary.cards_updated += 1;
            tracing::info!(
                card = %card.number,
                entries = card.balance_history.len(),
                "updated balance history"
            );
        }

        Ok(summary)
    }

    /// Record a single balance for a card.
    pub async fn record_balance(
        &self,
        number: &str,
        date: NaiveDate,
        amount: Cents,
    ) -> Result<Cents, AppError> {
        let mut card = self.get_card(number).await?;
        let delta = card.balance_history.record_balance(date, amount)?;
        self.repo
            .save_balance_history(card.id, &card.balance_history)
            .await?;
        tracing::info!(card = %number, %date, delta, "recorded balance");
        Ok(delta)
    }

    /// Remove the balance recorded on `date` for a card.
    /// Returns the removed balance.
    pub async fn remove_balance(&self, number: &str, date: NaiveDate) -> Result<Cents, AppError> {
        let mut card = self.get_card(number).await?;
        let removed = match card.balance_history.remove_balance(date) {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(card = %number, %date, error = %e, "balance removal rejected");
                return Err(e.into());
            }
        };
        self.repo
            .save_balance_history(card.id, &card.balance_history)
            .await?;
        tracing::info!(card = %number, %date, removed, "removed balance");
        Ok(removed)
    }

    pub async fn balance_on(&self, number: &str, date: NaiveDate) -> Result<BalanceEntry, AppError> {
        let card = self.get_card(number).await?;
        Ok(BalanceEntry {
            balance: card.balance_history.balance_on(date),
            card_number: card.number,
            date: Some(date),
        })
    }

    /// Latest recorded balance. `date` is the date of that entry, if any.
    pub async fn current_balance(&self, number: &str) -> Result<BalanceEntry, AppError> {
        let card = self.get_card(number).await?;
        Ok(BalanceEntry {
            balance: card.balance_history.current_balance(),
            date: card.balance_history.last_date(),
            card_number: card.number,
        })
    }

    /// Recorded entries for a card within the filter window, ascending.
    pub async fn balance_history(
        &self,
        number: &str,
        filter: HistoryFilter,
    ) -> Result<Vec<(NaiveDate, Cents)>, AppError> {
        let card = self.get_card(number).await?;
        Ok(card
            .balance_history
            .range(filter.from, filter.to)
            .collect())
    }
}
