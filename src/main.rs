//! PesaGuru CLI
//!
//! Command-line front end for the loan calculator and the client store.
//!
//! # Commands
//!
//! - `pesaguru amortize --principal 100000 --rate 15 --term 12`
//! - `pesaguru store get|set|remove|keys|logout|set-token|token`

use std::fs::File;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;

use pesaguru_core::loan::{format_kes, write_schedule_csv, AmortizationEngine, LoanParameters, PaymentFrequency};
use pesaguru_core::{FileStore, SecureExpiringStore, Store, StoreConfig};

/// PesaGuru loan calculator and client store
#[derive(Parser)]
#[command(name = "pesaguru")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a loan amortization schedule
    Amortize {
        /// Amount borrowed (KES)
        #[arg(short, long)]
        principal: f64,

        /// Annual interest rate in percent
        #[arg(short, long)]
        rate: f64,

        /// Number of payment periods
        #[arg(short, long)]
        term: u32,

        /// Payment frequency (monthly, biweekly, weekly)
        #[arg(short, long, default_value = "monthly")]
        frequency: String,

        /// Calculation date for due dates (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start_date: Option<String>,

        /// Number of schedule rows to print
        #[arg(long, default_value = "12")]
        rows: usize,

        /// Write the full schedule to this CSV file
        #[arg(long)]
        csv: Option<String>,
    },

    /// Inspect or modify the file-backed client store
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Print the value stored under a key
    Get { key: String },

    /// Store a JSON value under a key
    Set {
        key: String,

        /// JSON value (bare words are stored as strings)
        value: String,

        /// Minutes until the value expires
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Remove a key
    Remove { key: String },

    /// List keys present in the store
    Keys,

    /// Remove every registered key
    Logout,

    /// Encrypt and store an auth token (needs PESAGURU_TOKEN_SECRET)
    SetToken {
        token: String,

        /// Minutes until the stored token expires
        #[arg(long)]
        ttl: Option<u64>,
    },

    /// Print the stored auth token and whether its claim has expired
    Token,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Amortize {
            principal,
            rate,
            term,
            frequency,
            start_date,
            rows,
            csv,
        } => run_amortize(principal, rate, term, &frequency, start_date.as_deref(), rows, csv.as_deref()),
        Commands::Store { action } => run_store(action),
    }
}

fn run_amortize(
    principal: f64,
    rate: f64,
    term: u32,
    frequency: &str,
    start_date: Option<&str>,
    rows: usize,
    csv: Option<&str>,
) -> Result<()> {
    let frequency: PaymentFrequency = frequency.parse()?;
    let params = LoanParameters::new(principal, rate, term).with_frequency(frequency);

    let engine = match start_date {
        Some(date) => AmortizationEngine::with_calculation_date(
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("invalid start date {}", date))?,
        ),
        None => AmortizationEngine::new(),
    };

    let result = engine.compute(&params)?;
    let summary = result.summary();

    println!("Loan: {} at {}% over {} {} periods", format_kes(principal), rate, term, frequency.as_str());
    println!("  Periodic payment: {}", format_kes(summary.periodic_payment));
    println!("  Total payment:    {}", format_kes(summary.total_payment));
    println!("  Total interest:   {}", format_kes(summary.total_interest));
    println!("  Interest share:   {:.1}%", summary.interest_share * 100.0);
    println!();

    println!("{:>6} {:>12} {:>18} {:>18} {:>18} {:>20}",
        "Period", "Due", "Payment", "Principal", "Interest", "Balance");
    println!("{}", "-".repeat(97));

    for entry in result.schedule.iter().take(rows) {
        println!("{:>6} {:>12} {:>18} {:>18} {:>18} {:>20}",
            entry.period_index,
            entry.due_date.format("%Y-%m-%d").to_string(),
            format_kes(entry.total_payment),
            format_kes(entry.principal_component),
            format_kes(entry.interest_component),
            format_kes(entry.remaining_balance),
        );
    }

    if result.schedule.len() > rows {
        println!("... ({} more periods)", result.schedule.len() - rows);
    }

    if let Some(path) = csv {
        let file = File::create(path).with_context(|| format!("unable to create {}", path))?;
        write_schedule_csv(file, &result)?;
        info!("Wrote {} schedule rows to {}", result.schedule.len(), path);
        println!("\nFull schedule written to: {}", path);
    }

    Ok(())
}

fn run_store(action: StoreAction) -> Result<()> {
    let config = StoreConfig::from_env();
    let backend = FileStore::open(&config.store_path)
        .with_context(|| format!("unable to open store {}", config.store_path.display()))?;
    let store = SecureExpiringStore::new(backend, config);

    match action {
        StoreAction::Get { key } => match store.get_optional::<serde_json::Value>(&key) {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => println!("(absent)"),
        },
        StoreAction::Set { key, value, ttl } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
            if !store.set_item(&key, &value, ttl) {
                bail!("failed to store {}", key);
            }
        }
        StoreAction::Remove { key } => {
            if !store.remove_item(&key) {
                bail!("failed to remove {}", key);
            }
        }
        StoreAction::Keys => {
            let mut keys = store.store().keys()?;
            keys.sort();
            for key in keys {
                println!("{}", key);
            }
        }
        StoreAction::Logout => {
            if !store.logout() {
                bail!("some keys could not be removed");
            }
        }
        StoreAction::SetToken { token, ttl } => {
            let ttl = ttl.unwrap_or(store.config().token_ttl_minutes);
            if !store.set_auth_token_with_ttl(&token, ttl) {
                bail!("failed to store auth token (is PESAGURU_TOKEN_SECRET set?)");
            }
        }
        StoreAction::Token => match store.get_auth_token() {
            Some(token) => {
                println!("{}", token);
                println!("expired: {}", store.is_token_expired());
            }
            None => println!("(no token)"),
        },
    }

    Ok(())
}
