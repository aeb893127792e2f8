use crate::taxonomy::{coded_enum, Currency};

coded_enum! {
    /// An account or payment method that appears on a statement and can be
    /// reconciled.
    pub enum ReconcilableAccount {
        Unknown = 0 => ("unknown", "Unknown account"),
        CashGbp = 1 => ("cash-gbp", "Cash (GBP)"),
        CashUsd = 2 => ("cash-usd", "Cash (USD)"),
        CashJpy = 3 => ("cash-jpy", "Cash (JPY)"),
        CashEur = 4 => ("cash-eur", "Cash (EUR)"),
        CurrentAccountGbp = 10 => ("current-gbp", "Current account"),
        SavingsGbp = 11 => ("savings-gbp", "Savings account"),
        CheckingUsd = 12 => ("checking-usd", "US checking account"),
        BankJpy = 13 => ("bank-jpy", "Japanese bank account"),
        AmexGbp = 20 => ("amex-gbp", "Amex card"),
        VisaGbp = 21 => ("visa-gbp", "Visa card"),
        VisaJpy = 22 => ("visa-jpy", "Japanese Visa card"),
        PaypalGbp = 30 => ("paypal-gbp", "PayPal"),
    }
}

impl ReconcilableAccount {
    /// The currency statements for this account are issued in.
    pub fn currency(self) -> Currency {
        match self {
            ReconcilableAccount::CashGbp
            | ReconcilableAccount::CurrentAccountGbp
            | ReconcilableAccount::SavingsGbp
            | ReconcilableAccount::AmexGbp
            | ReconcilableAccount::VisaGbp
            | ReconcilableAccount::PaypalGbp => Currency::Gbp,
            ReconcilableAccount::CashUsd | ReconcilableAccount::CheckingUsd => Currency::Usd,
            ReconcilableAccount::CashJpy
            | ReconcilableAccount::BankJpy
            | ReconcilableAccount::VisaJpy => Currency::Jpy,
            ReconcilableAccount::CashEur => Currency::Eur,
            ReconcilableAccount::Unknown => Currency::Unknown,
        }
    }

    pub fn is_card(self) -> bool {
        matches!(
            self,
            ReconcilableAccount::AmexGbp | ReconcilableAccount::VisaGbp | ReconcilableAccount::VisaJpy
        )
    }

    pub fn is_cash(self) -> bool {
        matches!(
            self,
            ReconcilableAccount::CashGbp
                | ReconcilableAccount::CashUsd
                | ReconcilableAccount::CashJpy
                | ReconcilableAccount::CashEur
        )
    }

    pub fn is_unknown(self) -> bool {
        self == ReconcilableAccount::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_account_has_a_known_currency() {
        for account in ReconcilableAccount::ALL {
            assert_eq!(account.is_unknown(), account.currency() == Currency::Unknown);
        }
    }

    #[test]
    fn intrinsic_currencies() {
        assert_eq!(ReconcilableAccount::VisaJpy.currency(), Currency::Jpy);
        assert_eq!(ReconcilableAccount::CheckingUsd.currency(), Currency::Usd);
        assert_eq!(ReconcilableAccount::AmexGbp.currency(), Currency::Gbp);
    }

    #[test]
    fn codes_are_stable_and_sparse() {
        assert_eq!(ReconcilableAccount::CurrentAccountGbp.code(), 10);
        assert_eq!(ReconcilableAccount::from_code(5), None);
        assert_eq!(
            ReconcilableAccount::from_code(30),
            Some(ReconcilableAccount::PaypalGbp)
        );
    }

    #[test]
    fn parses_short_name() {
        assert_eq!(
            "amex-gbp".parse::<ReconcilableAccount>(),
            Ok(ReconcilableAccount::AmexGbp)
        );
    }

    #[test]
    fn kind_predicates() {
        assert!(ReconcilableAccount::CashEur.is_cash());
        assert!(!ReconcilableAccount::CashEur.is_card());
        assert!(ReconcilableAccount::VisaGbp.is_card());
    }
}
