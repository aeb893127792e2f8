//! Closed enumerations persisted by integer code.
//!
//! Every variant carries an explicit code. Codes are stored in the database, so
//! reordering or inserting variants must never change an existing code.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyError {
    #[error("Unknown {kind}: '{name}'")]
    UnknownName { kind: &'static str, name: String },
    #[error("Unknown {kind} code: {code}")]
    UnknownCode { kind: &'static str, code: i32 },
}

/// Declares a coded enum: stable code, short name (used by `FromStr`), and a
/// human-readable description.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident = $code:literal => ($short:literal, $desc:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $( $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            pub fn code(self) -> i32 {
                match self {
                    $( $name::$variant => $code ),+
                }
            }

            pub fn from_code(code: i32) -> Option<Self> {
                match code {
                    $( $code => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Like [`Self::from_code`], for callers that need an error value.
            pub fn try_from_code(code: i32) -> Result<Self, $crate::taxonomy::TaxonomyError> {
                Self::from_code(code).ok_or($crate::taxonomy::TaxonomyError::UnknownCode {
                    kind: stringify!($name),
                    code,
                })
            }

            pub fn short_name(self) -> &'static str {
                match self {
                    $( $name::$variant => $short ),+
                }
            }

            pub fn description(self) -> &'static str {
                match self {
                    $( $name::$variant => $desc ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.description())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::taxonomy::TaxonomyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.short_name().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| $crate::taxonomy::TaxonomyError::UnknownName {
                        kind: stringify!($name),
                        name: wanted.to_string(),
                    })
            }
        }
    };
}

pub(crate) use coded_enum;

coded_enum! {
    pub enum Currency {
        Unknown = 0 => ("unknown", "Unknown currency"),
        Gbp = 1 => ("GBP", "Pound sterling"),
        Usd = 2 => ("USD", "US dollar"),
        Jpy = 3 => ("JPY", "Japanese yen"),
        Eur = 4 => ("EUR", "Euro"),
    }
}

impl Currency {
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            Currency::Gbp => Some("£"),
            Currency::Usd => Some("$"),
            Currency::Jpy => Some("¥"),
            Currency::Eur => Some("€"),
            Currency::Unknown => None,
        }
    }

    /// Number of fractional digits in the currency's minor unit.
    pub fn minor_digits(self) -> u32 {
        match self {
            Currency::Jpy => 0,
            _ => 2,
        }
    }
}

coded_enum! {
    pub enum Category {
        Unknown = 0 => ("unknown", "Uncategorised"),
        Groceries = 1 => ("groceries", "Groceries"),
        DiningOut = 2 => ("dining", "Eating out"),
        Transport = 3 => ("transport", "Transport"),
        Travel = 4 => ("travel", "Travel & holidays"),
        Utilities = 5 => ("utilities", "Utilities"),
        Housing = 6 => ("housing", "Rent & mortgage"),
        Insurance = 7 => ("insurance", "Insurance"),
        Healthcare = 8 => ("health", "Healthcare"),
        Entertainment = 9 => ("entertainment", "Entertainment"),
        Shopping = 10 => ("shopping", "Shopping"),
        Subscriptions = 11 => ("subscriptions", "Subscriptions"),
        Education = 12 => ("education", "Education"),
        Gifts = 13 => ("gifts", "Gifts"),
        Charity = 14 => ("charity", "Charity"),
        Fees = 15 => ("fees", "Bank fees & commission"),
        Tax = 16 => ("tax", "Tax"),
        Salary = 17 => ("salary", "Salary"),
        Interest = 18 => ("interest", "Interest"),
        Refund = 19 => ("refund", "Refund"),
        CashWithdrawal = 20 => ("cash", "Cash withdrawal"),
        CardPayment = 21 => ("cardpayment", "Card payment"),
        Transfer = 22 => ("transfer", "Transfer"),
        Other = 99 => ("other", "Other"),
    }
}

impl Category {
    pub fn is_unknown(self) -> bool {
        self == Category::Unknown
    }
}

coded_enum! {
    pub enum Payer {
        Unknown = 0 => ("unknown", "Unknown payer"),
        Primary = 1 => ("primary", "Primary account holder"),
        Partner = 2 => ("partner", "Partner"),
        Joint = 3 => ("joint", "Joint"),
        Business = 4 => ("business", "Business"),
    }
}

coded_enum! {
    pub enum DebitCredit {
        Unknown = 0 => ("unknown", "Unknown"),
        Debit = 1 => ("DR", "Debit"),
        Credit = 2 => ("CR", "Credit"),
    }
}

impl DebitCredit {
    /// Debits are positive, credits negative. Zero has no direction.
    pub fn from_amount(amount: rust_decimal::Decimal) -> Self {
        if amount.is_sign_positive() && !amount.is_zero() {
            DebitCredit::Debit
        } else if amount.is_sign_negative() && !amount.is_zero() {
            DebitCredit::Credit
        } else {
            DebitCredit::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    #[test]
    fn codes_round_trip_through_reverse_lookup() {
        for c in Category::ALL {
            assert_eq!(Category::from_code(c.code()), Some(*c));
        }
        for c in Currency::ALL {
            assert_eq!(Currency::from_code(c.code()), Some(*c));
        }
    }

    #[test]
    fn codes_are_unique() {
        let codes: HashSet<i32> = Category::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes.len(), Category::ALL.len());
    }

    #[test]
    fn codes_are_pinned() {
        assert_eq!(Currency::Gbp.code(), 1);
        assert_eq!(Currency::Jpy.code(), 3);
        assert_eq!(Category::Other.code(), 99);
        assert_eq!(DebitCredit::Credit.code(), 2);
    }

    #[test]
    fn unknown_code_is_none() {
        assert_eq!(Category::from_code(1234), None);
        assert!(matches!(
            Currency::try_from_code(-1),
            Err(TaxonomyError::UnknownCode { kind: "Currency", code: -1 })
        ));
    }

    #[test]
    fn parses_short_names_case_insensitively() {
        assert_eq!("gbp".parse::<Currency>(), Ok(Currency::Gbp));
        assert_eq!(" Groceries ".parse::<Category>(), Ok(Category::Groceries));
        assert_eq!("cr".parse::<DebitCredit>(), Ok(DebitCredit::Credit));
        assert!("pesos".parse::<Currency>().is_err());
    }

    #[test]
    fn currency_symbols_and_digits() {
        assert_eq!(Currency::Gbp.symbol(), Some("£"));
        assert_eq!(Currency::Unknown.symbol(), None);
        assert_eq!(Currency::Jpy.minor_digits(), 0);
        assert_eq!(Currency::Eur.minor_digits(), 2);
    }

    #[test]
    fn debit_credit_follows_sign() {
        assert_eq!(DebitCredit::from_amount(Decimal::new(10, 0)), DebitCredit::Debit);
        assert_eq!(DebitCredit::from_amount(Decimal::new(-10, 0)), DebitCredit::Credit);
        assert_eq!(DebitCredit::from_amount(Decimal::ZERO), DebitCredit::Unknown);
    }

    #[test]
    fn display_uses_description() {
        assert_eq!(Category::Fees.to_string(), "Bank fees & commission");
    }
}
