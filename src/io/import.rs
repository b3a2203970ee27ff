use anyhow::Result;
use chrono::NaiveDate;
use std::io::Read;

use crate::application::{AppError, CardService, UpdateSummary};
use crate::domain::{parse_cents, BalanceUpdate};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    /// Rows that parsed into a balance update
    pub accepted: usize,
    pub summary: Option<UpdateSummary>,
    pub errors: Vec<ImportError>,
}

/// Error on a single input row
#[derive(Debug, Clone)]
pub struct ImportError {
    pub line: usize,
    pub field: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Parse and validate only; nothing is written.
    pub dry_run: bool,
}

/// Loads balance-update batches into card histories.
///
/// All rows of one input form a single batch, so each card's updates are
/// applied in date order whatever order the file lists them in.
pub struct Importer<'a> {
    service: &'a CardService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a CardService) -> Self {
        Self { service }
    }

    /// Import from CSV with a `card_number,date,amount` header.
    /// `amount` is a decimal such as `"220.50"`.
    pub async fn import_updates_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let (updates, errors) = parse_updates_csv(reader);
        self.apply(updates, errors, options).await
    }

    /// Import from a JSON array of `{card_number, date, amount_cents}`.
    pub async fn import_updates_json<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let updates: Vec<BalanceUpdate> = serde_json::from_reader(reader)?;
        self.apply(updates, Vec::new(), options).await
    }

    async fn apply(
        &self,
        updates: Vec<BalanceUpdate>,
        mut errors: Vec<ImportError>,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let accepted = updates.len();

        if options.dry_run {
            // Unknown cards would reject the batch, so report them here too.
            let mut seen = std::collections::HashSet::new();
            for update in &updates {
                if !seen.insert(update.card_number.as_str()) {
                    continue;
                }
                match self.service.get_card(&update.card_number).await {
                    Ok(_) => {}
                    Err(AppError::CardNotFound(number)) => errors.push(ImportError {
                        line: 0,
                        field: Some("card_number".to_string()),
                        error: format!("Unknown credit card: {}", number),
                    }),
                    Err(e) => return Err(e.into()),
                }
            }
            return Ok(ImportResult {
                accepted,
                summary: None,
                errors,
            });
        }

        let summary = if updates.is_empty() {
            UpdateSummary::default()
        } else {
            self.service.update_balances(updates).await?
        };

        Ok(ImportResult {
            accepted,
            summary: Some(summary),
            errors,
        })
    }
}

/// Parse CSV rows into balance updates, collecting row-level errors.
pub fn parse_updates_csv<R: Read>(reader: R) -> (Vec<BalanceUpdate>, Vec<ImportError>) {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut updates = Vec::new();
    let mut errors = Vec::new();

    for (line_num, result) in csv_reader.records().enumerate() {
        let line = line_num + 2; // +2 for header and 0-indexing

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                errors.push(ImportError {
                    line,
                    field: None,
                    error: format!("CSV parse error: {}", e),
                });
                continue;
            }
        };

        let card_number = record.get(0).unwrap_or("");
        let date_str = record.get(1).unwrap_or("");
        let amount_str = record.get(2).unwrap_or("");

        if card_number.is_empty() {
            errors.push(ImportError {
                line,
                field: Some("card_number".to_string()),
                error: "Missing card number".to_string(),
            });
            continue;
        }

        let date = match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                errors.push(ImportError {
                    line,
                    field: Some("date".to_string()),
                    error: format!("Invalid date '{}': {}", date_str, e),
                });
                continue;
            }
        };

        let amount_cents = match parse_cents(amount_str) {
            Ok(a) => a,
            Err(e) => {
                errors.push(ImportError {
                    line,
                    field: Some("amount".to_string()),
                    error: format!("Invalid amount: {}", e),
                });
                continue;
            }
        };

        updates.push(BalanceUpdate::new(card_number, date, amount_cents));
    }

    (updates, errors)
}
