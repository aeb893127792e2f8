//! Static tables linking accounts that settle one another.
//!
//! When a transaction is entered on one side of a pair (say, cash drawn at an
//! ATM), the other side usually needs recording too (the debit on the current
//! account). These tables drive that prompt.

use crate::account::ReconcilableAccount;
use crate::taxonomy::Category;

/// Two accounts that move money between each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterPair {
    pub name: &'static str,
    pub account: ReconcilableAccount,
    pub counterpart: ReconcilableAccount,
}

/// `account` + `category` on a new transaction suggests `counterpart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterTrigger {
    pub account: ReconcilableAccount,
    pub category: Category,
    pub counterpart: ReconcilableAccount,
}

use ReconcilableAccount as A;

pub const COUNTER_PAIRS: &[CounterPair] = &[
    CounterPair { name: "ATM withdrawal", account: A::CurrentAccountGbp, counterpart: A::CashGbp },
    CounterPair { name: "Amex settlement", account: A::CurrentAccountGbp, counterpart: A::AmexGbp },
    CounterPair { name: "Visa settlement", account: A::CurrentAccountGbp, counterpart: A::VisaGbp },
    CounterPair { name: "Savings transfer", account: A::CurrentAccountGbp, counterpart: A::SavingsGbp },
    CounterPair { name: "PayPal top-up", account: A::CurrentAccountGbp, counterpart: A::PaypalGbp },
    CounterPair { name: "Yen ATM withdrawal", account: A::BankJpy, counterpart: A::CashJpy },
    CounterPair { name: "Yen card settlement", account: A::BankJpy, counterpart: A::VisaJpy },
    CounterPair { name: "Dollar ATM withdrawal", account: A::CheckingUsd, counterpart: A::CashUsd },
];

pub const COUNTER_TRIGGERS: &[CounterTrigger] = &[
    CounterTrigger { account: A::CashGbp, category: Category::CashWithdrawal, counterpart: A::CurrentAccountGbp },
    CounterTrigger { account: A::CurrentAccountGbp, category: Category::CashWithdrawal, counterpart: A::CashGbp },
    CounterTrigger { account: A::CashJpy, category: Category::CashWithdrawal, counterpart: A::BankJpy },
    CounterTrigger { account: A::BankJpy, category: Category::CashWithdrawal, counterpart: A::CashJpy },
    CounterTrigger { account: A::CashUsd, category: Category::CashWithdrawal, counterpart: A::CheckingUsd },
    CounterTrigger { account: A::AmexGbp, category: Category::CardPayment, counterpart: A::CurrentAccountGbp },
    CounterTrigger { account: A::VisaGbp, category: Category::CardPayment, counterpart: A::CurrentAccountGbp },
    CounterTrigger { account: A::VisaJpy, category: Category::CardPayment, counterpart: A::BankJpy },
    CounterTrigger { account: A::SavingsGbp, category: Category::Transfer, counterpart: A::CurrentAccountGbp },
    CounterTrigger { account: A::PaypalGbp, category: Category::Transfer, counterpart: A::CurrentAccountGbp },
];

impl CounterTrigger {
    /// The account a linked transaction should be recorded on, if any.
    pub fn trigger(account: ReconcilableAccount, category: Category) -> Option<ReconcilableAccount> {
        COUNTER_TRIGGERS
            .iter()
            .find(|t| t.account == account && t.category == category)
            .map(|t| t.counterpart)
    }
}

impl CounterPair {
    /// Pairs in which `account` appears on either side.
    pub fn involving(account: ReconcilableAccount) -> impl Iterator<Item = &'static CounterPair> {
        COUNTER_PAIRS
            .iter()
            .filter(move |p| p.account == account || p.counterpart == account)
    }

    /// The named pair linking `a` and `b`, in either order.
    pub fn between(a: ReconcilableAccount, b: ReconcilableAccount) -> Option<&'static CounterPair> {
        COUNTER_PAIRS.iter().find(|p| {
            (p.account == a && p.counterpart == b) || (p.account == b && p.counterpart == a)
        })
    }
}
