use accounts_helper_core::{
    base_currency_breakdown, category_breakdown, split_category_breakdown, AccountingPeriod,
    AmountFormat, Category, Currency, CounterPair, CounterTrigger, ReconcilableAccount,
    Reconciliation, TransactionRecord,
};
use accounts_helper_import::CategoryMatcher;
use accounts_helper_storage::{DbPool, TransactionFilter};
use anyhow::{bail, Context};
use chrono::{NaiveTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::config::AppConfig;
use crate::Command;

pub async fn run(command: Command, db: &DbPool, config: &AppConfig) -> anyhow::Result<()> {
    match command {
        Command::Add {
            date,
            amount,
            currency,
            account,
            payee,
            payer,
            category,
            rate,
            commission,
            split_amount,
            split_category,
            explanation,
        } => {
            let mut tx = TransactionRecord::new(
                date.and_time(NaiveTime::MIN).and_utc(),
                amount,
                currency,
                account,
                &payee,
            )
            .with_payer(payer)
            .with_commission(commission);
            if let Some(rate) = rate {
                tx.exchange_rate = rate;
            }
            if let Some(split) = split_amount {
                tx = tx.with_split(split, split_category.unwrap_or(Category::Unknown));
            }
            tx.explanation = explanation;
            add_transaction(db, config, tx, category).await
        }
        Command::Teach { payee, category } => {
            let taught = accounts_helper_storage::teach_category_mapping(
                db,
                &payee,
                category,
                config.matcher.seed_usage_count,
            )
            .await?
            .context("Payee is empty")?;
            println!(
                "'{}' -> {} (used {} times)",
                taught.normalized_key, taught.category, taught.usage_count
            );
            Ok(())
        }
        Command::Match { payee } => {
            let matcher = CategoryMatcher::new(accounts_helper_storage::get_category_mappings(db).await?);
            match matcher.match_detail(&payee) {
                Some(outcome) => println!(
                    "{} ({:?} match on '{}')",
                    outcome.mapping.category, outcome.tier, outcome.mapping.normalized_key
                ),
                None => println!("{}", Category::Unknown),
            }
            Ok(())
        }
        Command::Reapply => {
            let outcome = accounts_helper_storage::reapply_learned_mappings(db).await?;
            println!("Categorised {} transaction(s)", outcome.changes.len());
            Ok(())
        }
        Command::Summary {
            account,
            year,
            month,
            start,
            json,
        } => {
            let period = parse_period(year, month)?;
            let reconciliation = load_or_start(db, account, period, start).await?;
            let txs = accounts_helper_storage::get_transactions(
                db,
                &TransactionFilter::for_period(account, period),
            )
            .await?;
            let summary = reconciliation.summary(&txs);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                let fmt = &config.format;
                let currency = account.currency();
                println!("{} {}", account, period);
                println!("  start    {}", fmt.format_amount(summary.start_balance, currency, true));
                println!("  credits  {}", fmt.format_amount(summary.total_credits, currency, true));
                println!("  debits   {}", fmt.format_amount(summary.total_debits, currency, true));
                println!("  net      {}", fmt.format_amount(summary.net_total, currency, true));
                println!("  ending   {}", fmt.format_amount(summary.ending_balance, currency, true));
            }
            Ok(())
        }
        Command::Breakdown {
            account,
            year,
            month,
            split,
            base,
        } => {
            let period = match (year, month) {
                (Some(y), Some(m)) => Some(parse_period(y, m)?),
                (None, None) => None,
                _ => bail!("--year and --month must be given together"),
            };
            let filter = TransactionFilter {
                account,
                category: None,
                period,
            };
            let txs = accounts_helper_storage::get_transactions(db, &filter).await?;
            let (totals, currency) = if base {
                (base_currency_breakdown(&txs), Currency::Gbp)
            } else if split {
                (split_category_breakdown(&txs), single_currency(&txs))
            } else {
                (category_breakdown(&txs), single_currency(&txs))
            };
            print_breakdown(&config.format, &totals, currency);
            Ok(())
        }
        Command::Reconcile {
            account,
            year,
            month,
            statement_balance,
            statement_date,
            previous,
            close,
        } => {
            let period = parse_period(year, month)?;
            let statement_date = match statement_date {
                Some(d) => d,
                None => period.end_date().context("Period has no end date")?,
            };
            let stored = load_or_start(db, account, period, previous).await?;
            if stored.closed {
                bail!("{account} {period} is already closed");
            }
            let mut reconciliation = stored.with_statement(statement_date, statement_balance);
            let txs = accounts_helper_storage::get_transactions(
                db,
                &TransactionFilter::for_period(account, period),
            )
            .await?;

            let fmt = &config.format;
            let currency = account.currency();
            let ending = reconciliation.ending_balance(&txs);
            let gap = reconciliation.gap(&txs);
            println!(
                "{} {}: computed {}, statement {}, gap {}",
                account,
                period,
                fmt.format_amount(ending, currency, true),
                fmt.format_amount(statement_balance, currency, true),
                fmt.format_amount(gap, currency, true),
            );

            if close {
                reconciliation.close(&txs)?;
                println!("Closed {period}");
            }
            accounts_helper_storage::save_reconciliation(db, &reconciliation).await?;
            Ok(())
        }
        Command::Counter { account, category } => {
            match CounterTrigger::trigger(account, category) {
                Some(counterpart) => {
                    let name = CounterPair::between(account, counterpart)
                        .map(|p| p.name)
                        .unwrap_or("linked transaction");
                    println!("{name}: also record on {counterpart}");
                }
                None => println!("No linked account"),
            }
            Ok(())
        }
    }
}

async fn add_transaction(
    db: &DbPool,
    config: &AppConfig,
    mut tx: TransactionRecord,
    category: Option<Category>,
) -> anyhow::Result<()> {
    let mut used_mapping = None;
    match category {
        Some(category) => tx.category = category,
        None => {
            let mut matcher =
                CategoryMatcher::new(accounts_helper_storage::get_category_mappings(db).await?);
            let (category, used) = matcher.apply_category(&tx.payee);
            tracing::debug!(payee = %tx.payee, %category, "Auto-matched category");
            tx.category = category;
            used_mapping = used;
        }
    }

    let issues = tx.validation_issues_at(Utc::now());
    if !issues.is_empty() {
        for issue in &issues {
            tracing::warn!(field_issue = %issue, "Transaction rejected");
        }
        let reasons: Vec<String> = issues.iter().map(ToString::to_string).collect();
        bail!("Invalid transaction: {}", reasons.join("; "));
    }

    // The usage bump only counts once the transaction itself is stored.
    accounts_helper_storage::save_transaction_with_mapping(db, &tx, used_mapping.as_ref()).await?;
    tracing::info!(id = %tx.id, "Transaction saved");
    println!(
        "Saved {} {} ({}) as {}",
        tx.id,
        config.format.format_amount(tx.amount, tx.currency, true),
        tx.payee,
        tx.category
    );
    if let Some(counterpart) = CounterTrigger::trigger(tx.account, tx.category) {
        println!("Hint: also record the matching entry on {counterpart}");
    }
    Ok(())
}

fn parse_period(year: i32, month: u32) -> anyhow::Result<AccountingPeriod> {
    AccountingPeriod::new(year, month).with_context(|| format!("Invalid month: {month}"))
}

/// The stored reconciliation for `period`, or a fresh one starting from
/// `start`, the latest earlier stored period carried forward, or zero, in
/// that order.
async fn load_or_start(
    db: &DbPool,
    account: ReconcilableAccount,
    period: AccountingPeriod,
    start: Option<Decimal>,
) -> anyhow::Result<Reconciliation> {
    if let Some(mut stored) = accounts_helper_storage::get_reconciliation(db, account, period).await? {
        if let Some(start) = start {
            stored.previous_ending_balance = start;
        }
        return Ok(stored);
    }
    if let Some(start) = start {
        return Ok(Reconciliation::new(account, period, start));
    }

    let earlier: Vec<Reconciliation> = accounts_helper_storage::get_reconciliations(db, account)
        .await?
        .into_iter()
        .filter(|r| r.period < period)
        .collect();
    match earlier.last() {
        Some(prev) => {
            let txs = accounts_helper_storage::get_transactions(
                db,
                &TransactionFilter {
                    account: Some(account),
                    category: None,
                    period: None,
                },
            )
            .await?;
            Ok(prev.carry_forward(period, &txs)?)
        }
        None => Ok(Reconciliation::new(account, period, Decimal::ZERO)),
    }
}

/// The currency shared by every transaction, or `Unknown` when mixed.
fn single_currency(txs: &[TransactionRecord]) -> Currency {
    let mut currencies = txs.iter().map(|t| t.currency);
    match currencies.next() {
        Some(first) if currencies.all(|c| c == first) => first,
        Some(_) => Currency::Unknown,
        None => Currency::Gbp,
    }
}

fn print_breakdown(fmt: &AmountFormat, totals: &BTreeMap<Category, Decimal>, currency: Currency) {
    for (category, total) in totals {
        println!("{:<24} {:>14}", category.description(), fmt.format_amount(*total, currency, true));
    }
}
