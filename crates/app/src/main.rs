use accounts_helper_core::{Category, Currency, Payer, ReconcilableAccount};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "accounts-helper", version, about = "Categorise and reconcile personal accounts")]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database file, overriding the config.
    #[arg(long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a transaction. Without --category the payee is auto-matched.
    Add {
        #[arg(long)]
        date: NaiveDate,
        /// Positive for a debit, negative for a credit.
        #[arg(long, allow_hyphen_values = true)]
        amount: Decimal,
        #[arg(long, default_value = "GBP")]
        currency: Currency,
        #[arg(long)]
        account: ReconcilableAccount,
        #[arg(long)]
        payee: String,
        #[arg(long)]
        payer: Payer,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        rate: Option<Decimal>,
        #[arg(long, default_value = "0")]
        commission: Decimal,
        #[arg(long, allow_hyphen_values = true)]
        split_amount: Option<Decimal>,
        #[arg(long)]
        split_category: Option<Category>,
        #[arg(long)]
        explanation: Option<String>,
    },
    /// Learn that a payee belongs to a category.
    Teach { payee: String, category: Category },
    /// Show which category a payee would be given.
    Match { payee: String },
    /// Categorise stored uncategorised transactions from learned mappings.
    Reapply,
    /// Credits, debits and balances for one account and month.
    Summary {
        #[arg(long)]
        account: ReconcilableAccount,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        /// Starting balance; defaults to the stored reconciliation's.
        #[arg(long, allow_hyphen_values = true)]
        start: Option<Decimal>,
        #[arg(long)]
        json: bool,
    },
    /// Totals per category.
    Breakdown {
        #[arg(long)]
        account: Option<ReconcilableAccount>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        /// Allocate split transactions to their split categories.
        #[arg(long)]
        split: bool,
        /// Convert to GBP before grouping (implies --split).
        #[arg(long)]
        base: bool,
    },
    /// Compare an account's computed balance with a statement.
    Reconcile {
        #[arg(long)]
        account: ReconcilableAccount,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        #[arg(long, allow_hyphen_values = true)]
        statement_balance: Decimal,
        #[arg(long)]
        statement_date: Option<NaiveDate>,
        /// Previous ending balance when no earlier period is stored.
        #[arg(long, allow_hyphen_values = true)]
        previous: Option<Decimal>,
        /// Finalise the period if it balances.
        #[arg(long)]
        close: bool,
    },
    /// Suggest the linked account for an account + category.
    Counter {
        account: ReconcilableAccount,
        category: Category,
    },
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.clone().or_else(config::default_config_path) {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::default(),
    };
    init_tracing(&config.log_filter);

    let db_path = cli
        .database
        .clone()
        .or_else(|| config.database_path.clone())
        .or_else(config::default_database_path)
        .context("Could not determine a database location; pass --database")?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let pool = accounts_helper_storage::create_db(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    tracing::debug!("Using database: {}", db_path.display());

    let result = commands::run(cli.command, &pool, &config).await;
    if let Err(e) = &result {
        tracing::warn!("Command failed: {e:#}");
    }
    result
}
