use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BalanceLedger, UserId};

pub type CardId = Uuid;

/// A credit card and the balance history it exclusively owns.
///
/// The history is hydrated by the repository when the card is loaded and
/// written back as a single opaque column when the card is saved.
#[derive(Debug, Clone)]
pub struct CreditCard {
    pub id: CardId,
    pub owner: UserId,
    pub issuance_bank: String,
    pub number: String,
    pub balance_history: BalanceLedger,
    pub created_at: DateTime<Utc>,
}

impl CreditCard {
    pub fn new(owner: UserId, issuance_bank: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            issuance_bank: issuance_bank.into(),
            number: number.into(),
            balance_history: BalanceLedger::new(),
            created_at: Utc::now(),
        }
    }

    pub fn view(&self) -> CardView {
        CardView {
            issuance_bank: self.issuance_bank.clone(),
            number: self.number.clone(),
        }
    }
}

/// Public projection of a card, without its history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub issuance_bank: String,
    pub number: String,
}
