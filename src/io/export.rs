use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{CardService, HistoryFilter};
use crate::domain::Cents;

/// Balance history of one card, as exported to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub card_number: String,
    pub issuance_bank: String,
    pub current_balance_cents: Cents,
    pub entries: Vec<HistoryRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub balance_cents: Cents,
}

/// Exporter for a card's balance history
pub struct Exporter<'a> {
    service: &'a CardService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a CardService) -> Self {
        Self { service }
    }

    /// Export a card's history as `date,balance_cents` CSV rows.
    pub async fn export_history_csv<W: Write>(
        &self,
        card_number: &str,
        filter: HistoryFilter,
        writer: W,
    ) -> Result<usize> {
        let entries = self.service.balance_history(card_number, filter).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["date", "balance_cents"])?;
        for (date, balance) in &entries {
            csv_writer.write_record([date.to_string(), balance.to_string()])?;
        }

        csv_writer.flush()?;
        Ok(entries.len())
    }

    /// Export a card's history as a JSON snapshot.
    pub async fn export_history_json<W: Write>(
        &self,
        card_number: &str,
        filter: HistoryFilter,
        mut writer: W,
    ) -> Result<HistorySnapshot> {
        let card = self.service.get_card(card_number).await?;
        let entries = card
            .balance_history
            .range(filter.from, filter.to)
            .map(|(date, balance_cents)| HistoryRow { date, balance_cents })
            .collect();

        let snapshot = HistorySnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            current_balance_cents: card.balance_history.current_balance(),
            card_number: card.number,
            issuance_bank: card.issuance_bank,
            entries,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
