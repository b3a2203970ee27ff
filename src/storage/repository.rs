use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{BalanceLedger, CardId, CreditCard, User, UserId};

use super::MIGRATION_001_INITIAL;

const CARD_COLUMNS: &str = "id, owner_id, issuance_bank, number, balance_history, created_at";

/// Repository for persisting users and credit cards.
///
/// A card's balance history lives in the `balance_history` column in the
/// form produced by [`BalanceLedger::save`].
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        tracing::debug!("migrations applied");
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // User operations
    // ========================

    pub async fn save_user(&self, user: &User) -> Result<()> {
        sqlx::query("INSERT INTO users (id, name, email, created_at) VALUES (?, ?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to save user")?;
        Ok(())
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name, email, created_at FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT id, name, email, created_at FROM users ORDER BY name, email")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        rows.iter().map(Self::row_to_user).collect()
    }

    /// Delete a user and every card they own.
    /// Returns false if no such user exists.
    pub async fn delete_user(&self, id: UserId) -> Result<bool> {
        let id = id.to_string();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM credit_cards WHERE owner_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete user's cards")?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete user")?;

        tx.commit().await.context("Failed to commit user deletion")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(User {
            id: Uuid::parse_str(&id_str).context("Invalid user ID")?,
            name: row.get("name"),
            email: row.get("email"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Credit card operations
    // ========================

    pub async fn save_card(&self, card: &CreditCard) -> Result<()> {
        let history = card
            .balance_history
            .save()
            .context("Failed to serialize balance history")?;
        sqlx::query(
            r#"
            INSERT INTO credit_cards (id, owner_id, issuance_bank, number, balance_history, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(card.id.to_string())
        .bind(card.owner.to_string())
        .bind(&card.issuance_bank)
        .bind(&card.number)
        .bind(history)
        .bind(card.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save credit card")?;
        Ok(())
    }

    /// Get a card by its number, with its balance history loaded.
    pub async fn get_card_by_number(&self, number: &str) -> Result<Option<CreditCard>> {
        let row = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM credit_cards WHERE number = ?"
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch credit card")?;

        row.as_ref().map(Self::row_to_card).transpose()
    }

    pub async fn list_cards_for_user(&self, owner: UserId) -> Result<Vec<CreditCard>> {
        let rows = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM credit_cards WHERE owner_id = ? ORDER BY created_at, number"
        ))
        .bind(owner.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list credit cards")?;

        rows.iter().map(Self::row_to_card).collect()
    }

    /// Write a card's balance history back to its row.
    pub async fn save_balance_history(&self, card_id: CardId, ledger: &BalanceLedger) -> Result<()> {
        let history = ledger.save().context("Failed to serialize balance history")?;
        let result = sqlx::query("UPDATE credit_cards SET balance_history = ? WHERE id = ?")
            .bind(history)
            .bind(card_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to save balance history")?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Credit card {} disappeared before its history was saved", card_id);
        }
        Ok(())
    }

    fn row_to_card(row: &sqlx::sqlite::SqliteRow) -> Result<CreditCard> {
        let id_str: String = row.get("id");
        let owner_str: String = row.get("owner_id");
        let number: String = row.get("number");
        let history: Option<String> = row.get("balance_history");
        let created_at_str: String = row.get("created_at");

        let balance_history = BalanceLedger::load_optional(history.as_deref())
            .with_context(|| format!("Corrupt balance history for card {}", number))?;

        Ok(CreditCard {
            id: Uuid::parse_str(&id_str).context("Invalid card ID")?,
            owner: Uuid::parse_str(&owner_str).context("Invalid owner ID")?,
            issuance_bank: row.get("issuance_bank"),
            number,
            balance_history,
            created_at: parse_timestamp(&created_at_str)?,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .context("Invalid created_at timestamp")?
        .with_timezone(&Utc))
}
