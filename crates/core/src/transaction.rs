use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::account::ReconcilableAccount;
use super::money::round_money;
use super::taxonomy::{Category, Currency, DebitCredit, Payer};

/// Rates at or above this for JPY are almost certainly quoted per 100 yen.
pub const JPY_MAX_EXCHANGE_RATE: Decimal = Decimal::from_parts(300, 0, 0, false, 0);

/// A single entry on an account.
///
/// Amounts are signed in the account's own terms: positive is a debit (money
/// going out), negative a credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub transaction_date: DateTime<Utc>,
    pub amount: Decimal,
    pub currency: Currency,
    /// Multiplier converting `amount` to GBP.
    pub exchange_rate: Decimal,
    /// Fee added after conversion, already in GBP.
    pub commission: Decimal,
    pub category: Category,
    /// Portion of `amount` attributed to `split_category`. Zero means unsplit.
    pub split_amount: Decimal,
    pub split_category: Category,
    /// Category of `amount - split_amount`; `None` means "same as `category`".
    pub split_remainder_category: Option<Category>,
    pub account: ReconcilableAccount,
    pub payer: Payer,
    pub payee: String,
    pub debit_credit: DebitCredit,
    pub explanation: Option<String>,
    pub reference: Option<String>,
}

/// Why a record failed validation, one variant per field rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationIssue {
    #[error("Amount must not be zero")]
    ZeroAmount,
    #[error("Category is not set")]
    UnknownCategory,
    #[error("Currency is not set")]
    UnknownCurrency,
    #[error("Exchange rate must be non-zero (and below 300 for JPY)")]
    InvalidExchangeRate,
    #[error("Debit/credit indicator is not set")]
    UnknownDebitCredit,
    #[error("Payee is empty")]
    EmptyPayee,
    #[error("Payer is not set")]
    UnknownPayer,
    #[error("Account is not set")]
    UnknownAccount,
    #[error("Transaction date is in the future")]
    FutureDate,
    #[error("Split transaction needs both split and remainder categories")]
    IncompleteSplit,
}

impl TransactionRecord {
    /// A fresh, uncategorised record. Non-GBP records start with a zero rate,
    /// which fails validation until a real rate is set.
    pub fn new(
        transaction_date: DateTime<Utc>,
        amount: Decimal,
        currency: Currency,
        account: ReconcilableAccount,
        payee: &str,
    ) -> Self {
        TransactionRecord {
            id: Uuid::new_v4(),
            transaction_date,
            amount,
            currency,
            exchange_rate: default_exchange_rate(currency),
            commission: Decimal::ZERO,
            category: Category::Unknown,
            split_amount: Decimal::ZERO,
            split_category: Category::Unknown,
            split_remainder_category: None,
            account,
            payer: Payer::Unknown,
            payee: payee.to_string(),
            debit_credit: DebitCredit::from_amount(amount),
            explanation: None,
            reference: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_payer(mut self, payer: Payer) -> Self {
        self.payer = payer;
        self
    }

    pub fn with_exchange_rate(mut self, rate: Decimal) -> Self {
        self.exchange_rate = rate;
        self
    }

    pub fn with_commission(mut self, commission: Decimal) -> Self {
        self.commission = commission;
        self
    }

    pub fn with_split(mut self, split_amount: Decimal, split_category: Category) -> Self {
        self.split_amount = split_amount;
        self.split_category = split_category;
        self
    }

    /// Changes currency, resetting the rate to 1 for GBP.
    pub fn set_currency(&mut self, currency: Currency) {
        self.currency = currency;
        if currency == Currency::Gbp {
            self.exchange_rate = Decimal::ONE;
        }
    }

    pub fn is_split(&self) -> bool {
        !self.split_amount.is_zero()
    }

    pub fn split_remainder_amount(&self) -> Decimal {
        self.amount - self.split_amount
    }

    pub fn split_remainder_category(&self) -> Category {
        self.split_remainder_category.unwrap_or(self.category)
    }

    /// GBP is always converted at 1 regardless of the stored rate.
    pub fn effective_exchange_rate(&self) -> Decimal {
        if self.currency == Currency::Gbp {
            Decimal::ONE
        } else {
            self.exchange_rate
        }
    }

    /// `amount * rate + commission`, rounded to pence half away from zero.
    pub fn total_in_base_currency(&self) -> Decimal {
        round_money(self.amount * self.effective_exchange_rate() + self.commission)
    }

    /// The split side in GBP. Commission always lands here, never on the
    /// remainder.
    pub fn split_amount_in_base_currency(&self) -> Decimal {
        if !self.is_split() {
            return Decimal::ZERO;
        }
        round_money(self.split_amount * self.effective_exchange_rate() + self.commission)
    }

    /// Whatever of the GBP total the split side did not take, so the two
    /// sides always add up to [`Self::total_in_base_currency`].
    pub fn split_remainder_in_base_currency(&self) -> Decimal {
        self.total_in_base_currency() - self.split_amount_in_base_currency()
    }

    pub fn is_amount_valid(&self) -> bool {
        !self.amount.is_zero()
    }

    pub fn is_category_valid(&self) -> bool {
        !self.category.is_unknown()
    }

    pub fn is_currency_valid(&self) -> bool {
        self.currency != Currency::Unknown
    }

    pub fn is_exchange_rate_valid(&self) -> bool {
        match self.currency {
            Currency::Gbp => true,
            Currency::Jpy => {
                !self.exchange_rate.is_zero() && self.exchange_rate < JPY_MAX_EXCHANGE_RATE
            }
            _ => !self.exchange_rate.is_zero(),
        }
    }

    pub fn is_debit_credit_valid(&self) -> bool {
        self.debit_credit != DebitCredit::Unknown
    }

    pub fn is_payee_valid(&self) -> bool {
        !self.payee.trim().is_empty()
    }

    pub fn is_payer_valid(&self) -> bool {
        self.payer != Payer::Unknown
    }

    pub fn is_account_valid(&self) -> bool {
        !self.account.is_unknown()
    }

    pub fn is_date_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.transaction_date <= now
    }

    pub fn is_split_valid(&self) -> bool {
        !self.is_split()
            || (!self.split_category.is_unknown() && !self.split_remainder_category().is_unknown())
    }

    /// Every failing rule, in field order. Empty means the record is valid.
    pub fn validation_issues_at(&self, now: DateTime<Utc>) -> Vec<ValidationIssue> {
        let checks = [
            (self.is_amount_valid(), ValidationIssue::ZeroAmount),
            (self.is_category_valid(), ValidationIssue::UnknownCategory),
            (self.is_currency_valid(), ValidationIssue::UnknownCurrency),
            (self.is_exchange_rate_valid(), ValidationIssue::InvalidExchangeRate),
            (self.is_debit_credit_valid(), ValidationIssue::UnknownDebitCredit),
            (self.is_payee_valid(), ValidationIssue::EmptyPayee),
            (self.is_payer_valid(), ValidationIssue::UnknownPayer),
            (self.is_account_valid(), ValidationIssue::UnknownAccount),
            (self.is_date_valid_at(now), ValidationIssue::FutureDate),
            (self.is_split_valid(), ValidationIssue::IncompleteSplit),
        ];
        checks
            .into_iter()
            .filter(|(ok, _)| !ok)
            .map(|(_, issue)| issue)
            .collect()
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.validation_issues_at(now).is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

fn default_exchange_rate(currency: Currency) -> Decimal {
    if currency == Currency::Gbp {
        Decimal::ONE
    } else {
        Decimal::ZERO
    }
}
