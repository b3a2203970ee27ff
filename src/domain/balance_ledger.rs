use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included, Unbounded};

use chrono::NaiveDate;
use thiserror::Error;

use super::Cents;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("No balance recorded on {0}")]
    EntryNotFound(NaiveDate),

    #[error("Balance history is empty")]
    EmptySeries,

    #[error("Malformed balance history: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Balance on or after {0} is out of range")]
    Overflow(NaiveDate),
}

/// Sparse, date-ordered balance history for a single card.
///
/// Each entry is the end-of-day balance on its date. Dates without an entry
/// carry the balance of the closest earlier entry. Correcting the balance on
/// a date shifts every later entry by the same amount, so the history stays
/// consistent with the correction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceLedger {
    entries: BTreeMap<NaiveDate, Cents>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a ledger from its stored form.
    /// An empty string yields an empty ledger.
    pub fn load(stored: &str) -> Result<Self, LedgerError> {
        if stored.trim().is_empty() {
            return Ok(Self::new());
        }
        let entries: BTreeMap<NaiveDate, Cents> = serde_json::from_str(stored)?;
        Ok(Self { entries })
    }

    /// Restore a ledger from a nullable column.
    pub fn load_optional(stored: Option<&str>) -> Result<Self, LedgerError> {
        stored.map_or_else(|| Ok(Self::new()), Self::load)
    }

    /// Serialize to the stored form: a JSON object of `"YYYY-MM-DD": cents`
    /// pairs in ascending date order.
    pub fn save(&self) -> Result<String, LedgerError> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Set the balance on `date` and shift every later entry by the
    /// difference from the balance previously implied for that date.
    /// Returns the applied difference. On overflow nothing changes.
    pub fn record_balance(
        &mut self,
        date: NaiveDate,
        amount: Cents,
    ) -> Result<Cents, LedgerError> {
        let delta = amount
            .checked_sub(self.balance_on(date))
            .ok_or(LedgerError::Overflow(date))?;
        self.shift_after(date, delta)?;
        self.entries.insert(date, amount);
        Ok(delta)
    }

    /// Apply a batch of `(date, amount)` updates in ascending date order.
    /// Updates on the same date keep their relative order, so the last one wins.
    /// If any update fails the ledger is left as it was.
    pub fn apply_updates<I>(&mut self, updates: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = (NaiveDate, Cents)>,
    {
        let mut updates: Vec<_> = updates.into_iter().collect();
        updates.sort_by_key(|(date, _)| *date);

        let mut staged = self.clone();
        for (date, amount) in updates {
            staged.record_balance(date, amount)?;
        }
        *self = staged;
        Ok(())
    }

    /// Delete the entry on `date` and add its value back to every later entry.
    /// Returns the removed value.
    pub fn remove_balance(&mut self, date: NaiveDate) -> Result<Cents, LedgerError> {
        if self.entries.is_empty() {
            return Err(LedgerError::EmptySeries);
        }
        let removed = self
            .entries
            .get(&date)
            .copied()
            .ok_or(LedgerError::EntryNotFound(date))?;
        self.shift_after(date, removed)?;
        self.entries.remove(&date);
        Ok(removed)
    }

    /// Balance on `date`, falling back to the closest earlier entry, or 0.
    pub fn balance_on(&self, date: NaiveDate) -> Cents {
        self.entries
            .range(..=date)
            .next_back()
            .map(|(_, balance)| *balance)
            .unwrap_or(0)
    }

    /// Balance of the latest entry, or 0 for an empty ledger.
    pub fn current_balance(&self) -> Cents {
        self.entries
            .last_key_value()
            .map(|(_, balance)| *balance)
            .unwrap_or(0)
    }

    /// Explicit entry on `date`, without fallback.
    pub fn get(&self, date: NaiveDate) -> Option<Cents> {
        self.entries.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first_key_value().map(|(date, _)| *date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last_key_value().map(|(date, _)| *date)
    }

    /// All entries in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Cents)> + '_ {
        self.entries.iter().map(|(date, balance)| (*date, *balance))
    }

    /// Entries between `from` and `to` (both inclusive, either open).
    pub fn range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> impl Iterator<Item = (NaiveDate, Cents)> + '_ {
        let lower = from.map_or(Unbounded, Included);
        let upper = to.map_or(Unbounded, Included);
        let empty = matches!((from, to), (Some(f), Some(t)) if f > t);
        // BTreeMap::range panics on an inverted range.
        let bounds = if empty {
            (Unbounded, Excluded(NaiveDate::MIN))
        } else {
            (lower, upper)
        };
        self.entries
            .range(bounds)
            .map(|(date, balance)| (*date, *balance))
    }

    /// Add `delta` to every entry after `date`. Checks the whole suffix
    /// before writing, so an overflow leaves every entry untouched.
    fn shift_after(&mut self, date: NaiveDate, delta: Cents) -> Result<(), LedgerError> {
        if delta == 0 {
            return Ok(());
        }
        let later = (Excluded(date), Unbounded);
        let overflow = self
            .entries
            .range(later)
            .any(|(_, balance)| balance.checked_add(delta).is_none());
        if overflow {
            return Err(LedgerError::Overflow(date));
        }

        let mut shifted = 0;
        for (_, balance) in self.entries.range_mut(later) {
            *balance += delta;
            shifted += 1;
        }
        if shifted > 0 {
            tracing::debug!(%date, delta, shifted, "propagated balance change");
        }
        Ok(())
    }
}
