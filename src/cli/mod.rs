use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use uuid::Uuid;

use crate::application::{CardService, HistoryFilter};
use crate::domain::{format_cents, parse_cents};
use crate::io::{Exporter, ImportOptions, ImportResult, Importer};

/// cardledger - Credit card balance history
#[derive(Parser)]
#[command(name = "cardledger")]
#[command(about = "Track per-card balance histories with forward-propagating corrections")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "CARDLEDGER_DATABASE", default_value = "cardledger.db")]
    pub database: String,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Credit card management commands
    #[command(subcommand)]
    Card(CardCommands),

    /// Balance history commands
    #[command(subcommand)]
    Balance(BalanceCommands),

    /// Import a batch of balance updates from CSV or JSON
    Import {
        /// Input file (stdin if omitted)
        input: Option<String>,

        /// Format: csv, json (default: from file extension, else csv)
        #[arg(short, long)]
        format: Option<String>,

        /// Validate without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Export a card's balance history to CSV or JSON
    Export {
        /// Card number
        card: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a new user
    Create {
        /// Full name
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,
    },

    /// Delete a user and all their cards
    Delete {
        /// User ID
        id: String,
    },

    /// List all users
    List,

    /// Show a user and their cards
    Show {
        /// User ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum CardCommands {
    /// Add a credit card to a user
    Add {
        /// Card number (must be unique)
        number: String,

        /// Owner's user ID
        #[arg(short, long)]
        user: String,

        /// Issuing bank
        #[arg(short, long)]
        bank: String,
    },

    /// List a user's cards
    List {
        /// User ID
        user: String,
    },

    /// Show the owner of a card
    Owner {
        /// Card number
        number: String,
    },
}

#[derive(Subcommand)]
pub enum BalanceCommands {
    /// Record the balance of a card on a date
    Update {
        /// Card number
        card: String,

        /// Balance (e.g., "220.50" or "-12")
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Date of the balance (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Remove the balance recorded on a date
    Remove {
        /// Card number
        card: String,

        /// Date of the entry (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },

    /// Show the balance on a date, or the latest balance
    Show {
        /// Card number
        card: String,

        /// Date to query (YYYY-MM-DD, omit for latest)
        #[arg(long)]
        date: Option<String>,
    },

    /// List recorded balances
    History {
        /// Card number
        card: String,

        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                CardService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::User(cmd) => {
                let service = CardService::connect(&self.database).await?;
                run_user_command(&service, cmd).await?;
            }

            Commands::Card(cmd) => {
                let service = CardService::connect(&self.database).await?;
                run_card_command(&service, cmd).await?;
            }

            Commands::Balance(cmd) => {
                let service = CardService::connect(&self.database).await?;
                run_balance_command(&service, cmd).await?;
            }

            Commands::Import {
                input,
                format,
                dry_run,
            } => {
                let service = CardService::connect(&self.database).await?;
                run_import_command(&service, input, format, dry_run).await?;
            }

            Commands::Export {
                card,
                output,
                format,
                from,
                to,
            } => {
                let service = CardService::connect(&self.database).await?;
                let filter = parse_date_range(from, to)?;
                run_export_command(&service, &card, filter, output, &format).await?;
            }
        }

        Ok(())
    }
}

async fn run_user_command(service: &CardService, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Create { name, email } => {
            let user = service.create_user(name, email).await?;
            println!("Created user: {} <{}> ({})", user.name, user.email, user.id);
        }

        UserCommands::Delete { id } => {
            let id = parse_uuid(&id)?;
            service.delete_user(id).await?;
            println!("Deleted user: {}", id);
        }

        UserCommands::List => {
            let users = service.list_users().await?;
            if users.is_empty() {
                println!("No users found.");
            } else {
                println!("{:<38} {:<20} {}", "ID", "NAME", "EMAIL");
                println!("{}", "-".repeat(80));
                for user in users {
                    println!("{:<38} {:<20} {}", user.id, user.name, user.email);
                }
            }
        }

        UserCommands::Show { id } => {
            let user = service.get_user(parse_uuid(&id)?).await?;
            let cards = service.list_cards_for_user(user.id).await?;

            println!("User: {}", user.name);
            println!("  ID:       {}", user.id);
            println!("  Email:    {}", user.email);
            println!("  Created:  {}", user.created_at.format("%Y-%m-%d %H:%M:%S"));
            println!("  Cards:    {}", cards.len());
            for card in cards {
                println!("    {} ({})", card.number, card.issuance_bank);
            }
        }
    }
    Ok(())
}

async fn run_card_command(service: &CardService, cmd: CardCommands) -> Result<()> {
    match cmd {
        CardCommands::Add { number, user, bank } => {
            let card = service.add_card(parse_uuid(&user)?, bank, number).await?;
            println!(
                "Added card: {} ({}) -> user {}",
                card.number, card.issuance_bank, card.owner
            );
        }

        CardCommands::List { user } => {
            let cards = service.list_cards_for_user(parse_uuid(&user)?).await?;
            if cards.is_empty() {
                println!("No cards found.");
            } else {
                println!("{:<24} {}", "NUMBER", "BANK");
                println!("{}", "-".repeat(44));
                for card in cards {
                    println!("{:<24} {}", card.number, card.issuance_bank);
                }
            }
        }

        CardCommands::Owner { number } => {
            let user_id = service.get_user_id_for_card(&number).await?;
            println!("{}", user_id);
        }
    }
    Ok(())
}

async fn run_balance_command(service: &CardService, cmd: BalanceCommands) -> Result<()> {
    match cmd {
        BalanceCommands::Update { card, amount, date } => {
            let amount = parse_cents(&amount)
                .context("Invalid amount format. Use '220.50' or '220'")?;
            let date = match date {
                Some(s) => parse_date(&s)?,
                None => Utc::now().date_naive(),
            };

            let delta = service.record_balance(&card, date, amount).await?;
            println!("Recorded {} on {} for card {}", format_cents(amount), date, card);
            if delta != 0 {
                println!("  Later entries shifted by {}", format_cents(delta));
            }
        }

        BalanceCommands::Remove { card, date } => {
            let date = parse_date(&date)?;
            let removed = service.remove_balance(&card, date).await?;
            println!("Removed {} on {} for card {}", format_cents(removed), date, card);
        }

        BalanceCommands::Show { card, date } => {
            let entry = match date {
                Some(s) => service.balance_on(&card, parse_date(&s)?).await?,
                None => service.current_balance(&card).await?,
            };
            let balance = format_cents(entry.balance);
            match entry.date {
                Some(date) => println!("{} on {}: {}", entry.card_number, date, balance),
                None => println!("{}: {} (no history)", entry.card_number, balance),
            }
        }

        BalanceCommands::History { card, from, to } => {
            let entries = service.balance_history(&card, parse_date_range(from, to)?).await?;
            if entries.is_empty() {
                println!("No balances recorded.");
            } else {
                println!("{:<12} {:>15}", "DATE", "BALANCE");
                println!("{}", "-".repeat(28));
                for (date, balance) in entries {
                    println!("{:<12} {:>15}", date, format_cents(balance));
                }
            }
        }
    }
    Ok(())
}

async fn run_import_command(
    service: &CardService,
    input: Option<String>,
    format: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let format = format.unwrap_or_else(|| match &input {
        Some(path) if path.ends_with(".json") => "json".to_string(),
        _ => "csv".to_string(),
    });
    let reader: Box<dyn io::Read> = match &input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    let importer = Importer::new(service);
    let options = ImportOptions { dry_run };
    let result = match format.as_str() {
        "csv" => importer.import_updates_csv(reader, options).await?,
        "json" => importer.import_updates_json(reader, options).await?,
        other => anyhow::bail!("Unknown import format '{}'. Use csv or json", other),
    };

    print_import_result(&result, dry_run);
    Ok(())
}

fn print_import_result(result: &ImportResult, dry_run: bool) {
    if dry_run {
        println!("Validation complete");
    } else {
        println!("Import complete");
    }
    println!("  Accepted: {}", result.accepted);
    if let Some(summary) = &result.summary {
        println!("  Applied:  {}", summary.updates_applied);
        println!("  Cards:    {}", summary.cards_updated);
    }
    println!("  Errors:   {}", result.errors.len());

    if !result.errors.is_empty() {
        println!("\nErrors:");
        for error in result.errors.iter().take(10) {
            println!(
                "  Line {}: {}{}",
                error.line,
                error
                    .field
                    .as_ref()
                    .map(|f| format!("[{}] ", f))
                    .unwrap_or_default(),
                error.error
            );
        }
        if result.errors.len() > 10 {
            println!("  ... and {} more errors", result.errors.len() - 10);
        }
    }
}

async fn run_export_command(
    service: &CardService,
    card: &str,
    filter: HistoryFilter,
    output: Option<String>,
    format: &str,
) -> Result<()> {
    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let exporter = Exporter::new(service);
    let count = match format {
        "csv" => exporter.export_history_csv(card, filter, writer).await?,
        "json" => exporter
            .export_history_json(card, filter, writer)
            .await?
            .entries
            .len(),
        other => anyhow::bail!("Unknown export format '{}'. Use csv or json", other),
    };

    eprintln!("Exported {} balance entries", count);
    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", s))
}

fn parse_date_range(from: Option<String>, to: Option<String>) -> Result<HistoryFilter> {
    Ok(HistoryFilter {
        from: from.as_deref().map(parse_date).transpose()?,
        to: to.as_deref().map(parse_date).transpose()?,
    })
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).with_context(|| format!("Invalid ID '{}' (expected UUID)", s))
}
