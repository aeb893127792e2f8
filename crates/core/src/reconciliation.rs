use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::account::ReconcilableAccount;
use super::period::AccountingPeriod;
use super::taxonomy::Category;
use super::transaction::TransactionRecord;

/// Totals over a set of transactions.
///
/// Credits are negative and debits positive, so money going out (net debits)
/// reduces the tracked balance: `ending = start - net`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub start_balance: Decimal,
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub net_total: Decimal,
    pub ending_balance: Decimal,
}

impl BalanceSummary {
    pub fn gap(&self, statement_balance: Decimal) -> Decimal {
        statement_balance - self.ending_balance
    }

    pub fn is_balanced_against(&self, statement_balance: Decimal) -> bool {
        self.gap(statement_balance).is_zero()
    }
}

pub fn summarize(transactions: &[TransactionRecord], starting_balance: Decimal) -> BalanceSummary {
    let mut total_credits = Decimal::ZERO;
    let mut total_debits = Decimal::ZERO;
    for tx in transactions {
        if tx.amount.is_zero() {
            continue;
        }
        if tx.amount.is_sign_negative() {
            total_credits += tx.amount;
        } else {
            total_debits += tx.amount;
        }
    }
    let net_total = total_credits + total_debits;
    BalanceSummary {
        start_balance: starting_balance,
        total_credits,
        total_debits,
        net_total,
        ending_balance: starting_balance - net_total,
    }
}

/// The balance after each transaction, in date order (ties keep input order).
pub fn running_balances(
    transactions: &[TransactionRecord],
    starting_balance: Decimal,
) -> Vec<(&TransactionRecord, Decimal)> {
    let mut ordered: Vec<&TransactionRecord> = transactions.iter().collect();
    ordered.sort_by_key(|tx| tx.transaction_date);

    let mut balance = starting_balance;
    ordered
        .into_iter()
        .map(|tx| {
            balance -= tx.amount;
            (tx, balance)
        })
        .collect()
}

fn empty_breakdown() -> BTreeMap<Category, Decimal> {
    Category::ALL.iter().map(|c| (*c, Decimal::ZERO)).collect()
}

/// Raw `amount` per category. Every category is present, zero if unused.
pub fn category_breakdown(transactions: &[TransactionRecord]) -> BTreeMap<Category, Decimal> {
    let mut totals = empty_breakdown();
    for tx in transactions {
        *totals.entry(tx.category).or_default() += tx.amount;
    }
    totals
}

/// Per-category totals honouring splits, in transaction currency.
///
/// A split record gives `split_amount + commission` to its split category and
/// `amount - split_amount` to the remainder category. An unsplit record gives
/// `amount + commission` to its category.
pub fn split_category_breakdown(
    transactions: &[TransactionRecord],
) -> BTreeMap<Category, Decimal> {
    let mut totals = empty_breakdown();
    for tx in transactions {
        if tx.is_split() {
            *totals.entry(tx.split_category).or_default() += tx.split_amount + tx.commission;
            *totals.entry(tx.split_remainder_category()).or_default() +=
                tx.split_remainder_amount();
        } else {
            *totals.entry(tx.category).or_default() += tx.amount + tx.commission;
        }
    }
    totals
}

/// Same allocation as [`split_category_breakdown`] on GBP-normalized values,
/// so records in different currencies can be added together.
pub fn base_currency_breakdown(
    transactions: &[TransactionRecord],
) -> BTreeMap<Category, Decimal> {
    let mut totals = empty_breakdown();
    for tx in transactions {
        if tx.is_split() {
            *totals.entry(tx.split_category).or_default() += tx.split_amount_in_base_currency();
            *totals.entry(tx.split_remainder_category()).or_default() +=
                tx.split_remainder_in_base_currency();
        } else {
            *totals.entry(tx.category).or_default() += tx.total_in_base_currency();
        }
    }
    totals
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconciliationError {
    #[error("Reconciliation for {0} is already closed")]
    AlreadyClosed(AccountingPeriod),
    #[error("Reconciliation is out of balance by {0}")]
    OutOfBalance(Decimal),
    #[error("Cannot carry {from} forward to {to}")]
    PeriodOrder {
        from: AccountingPeriod,
        to: AccountingPeriod,
    },
}

/// One account's statement for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub account: ReconcilableAccount,
    pub period: AccountingPeriod,
    pub previous_ending_balance: Decimal,
    pub statement_date: Option<NaiveDate>,
    pub statement_ending_balance: Decimal,
    pub closed: bool,
}

impl Reconciliation {
    pub fn new(
        account: ReconcilableAccount,
        period: AccountingPeriod,
        previous_ending_balance: Decimal,
    ) -> Self {
        Reconciliation {
            account,
            period,
            previous_ending_balance,
            statement_date: None,
            statement_ending_balance: Decimal::ZERO,
            closed: false,
        }
    }

    pub fn with_statement(mut self, date: NaiveDate, ending_balance: Decimal) -> Self {
        self.statement_date = Some(date);
        self.statement_ending_balance = ending_balance;
        self
    }

    /// Transactions on this account dated inside the period. Opening balances
    /// have no transactions of their own.
    pub fn in_scope<'a>(
        &self,
        transactions: &'a [TransactionRecord],
    ) -> Vec<&'a TransactionRecord> {
        transactions
            .iter()
            .filter(|tx| {
                tx.account == self.account && self.period.contains(tx.transaction_date.date_naive())
            })
            .collect()
    }

    pub fn summary(&self, transactions: &[TransactionRecord]) -> BalanceSummary {
        let scoped: Vec<TransactionRecord> =
            self.in_scope(transactions).into_iter().cloned().collect();
        summarize(&scoped, self.previous_ending_balance)
    }

    pub fn ending_balance(&self, transactions: &[TransactionRecord]) -> Decimal {
        self.summary(transactions).ending_balance
    }

    /// `statement - computed`; zero when the books agree with the bank.
    pub fn gap(&self, transactions: &[TransactionRecord]) -> Decimal {
        self.statement_ending_balance - self.ending_balance(transactions)
    }

    pub fn is_balanced(&self, transactions: &[TransactionRecord]) -> bool {
        self.gap(transactions).is_zero()
    }

    /// Marks the period finalized. Refuses while there is a gap.
    pub fn close(&mut self, transactions: &[TransactionRecord]) -> Result<Decimal, ReconciliationError> {
        if self.closed {
            return Err(ReconciliationError::AlreadyClosed(self.period));
        }
        let gap = self.gap(transactions);
        if !gap.is_zero() {
            return Err(ReconciliationError::OutOfBalance(gap));
        }
        self.closed = true;
        Ok(self.ending_balance(transactions))
    }

    /// Opens the reconciliation for a later period, starting from this
    /// period's computed ending balance.
    ///
    /// Transactions on this account dated after this period and before
    /// `period` (months nobody reconciled) are applied to the carried balance.
    pub fn carry_forward(
        &self,
        period: AccountingPeriod,
        transactions: &[TransactionRecord],
    ) -> Result<Reconciliation, ReconciliationError> {
        if period <= self.period || period.is_opening_balances() {
            return Err(ReconciliationError::PeriodOrder {
                from: self.period,
                to: period,
            });
        }
        let after = self.period.end_date();
        let before = period.start_date();
        let skipped: Decimal = transactions
            .iter()
            .filter(|tx| tx.account == self.account)
            .filter(|tx| {
                let date = tx.transaction_date.date_naive();
                after.map_or(true, |a| date > a) && before.is_some_and(|b| date < b)
            })
            .map(|tx| tx.amount)
            .sum();
        Ok(Reconciliation::new(
            self.account,
            period,
            self.ending_balance(transactions) - skipped,
        ))
    }
}
