use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Cents;

/// An instruction that the balance on `date` for card `card_number`
/// should become `amount_cents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub card_number: String,
    pub date: NaiveDate,
    pub amount_cents: Cents,
}

impl BalanceUpdate {
    pub fn new(card_number: impl Into<String>, date: NaiveDate, amount_cents: Cents) -> Self {
        Self {
            card_number: card_number.into(),
            date,
            amount_cents,
        }
    }
}

/// Updates for one card, ordered by date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardBatch {
    pub card_number: String,
    pub updates: Vec<(NaiveDate, Cents)>,
}

/// Group a batch by card number and order each group by date.
///
/// Forward propagation is only correct when a card's updates are applied
/// earliest first. The sort is stable: two updates for the same card and
/// date keep their arrival order, so the later one wins when applied.
/// Groups come back in order of each card's first appearance.
pub fn group_by_card(updates: impl IntoIterator<Item = BalanceUpdate>) -> Vec<CardBatch> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut batches: Vec<CardBatch> = Vec::new();

    for update in updates {
        let slot = *index.entry(update.card_number.clone()).or_insert_with(|| {
            batches.push(CardBatch {
                card_number: update.card_number.clone(),
                updates: Vec::new(),
            });
            batches.len() - 1
        });
        batches[slot].updates.push((update.date, update.amount_cents));
    }

    for batch in &mut batches {
        batch.updates.sort_by_key(|(date, _)| *date);
    }
    batches
}
