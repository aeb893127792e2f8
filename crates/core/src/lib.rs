pub mod account;
pub mod counter;
pub mod format;
pub mod money;
pub mod period;
pub mod reconciliation;
pub mod taxonomy;
pub mod transaction;

pub use account::ReconcilableAccount;
pub use counter::{CounterPair, CounterTrigger};
pub use format::{format_amount, AmountFormat};
pub use money::{decimal_to_minor_units, minor_units_to_decimal, round_money, round_to_scale, RoundingMode};
pub use period::{AccountingPeriod, DateRange};
pub use reconciliation::{
    base_currency_breakdown, category_breakdown, running_balances, split_category_breakdown,
    summarize, BalanceSummary, Reconciliation, ReconciliationError,
};
pub use taxonomy::{Category, Currency, DebitCredit, Payer, TaxonomyError};
pub use transaction::{TransactionRecord, ValidationIssue};
