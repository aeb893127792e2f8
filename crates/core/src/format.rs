use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{round_to_scale, RoundingMode};
use crate::taxonomy::Currency;

/// Presentation settings for amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmountFormat {
    /// Rendered in place of an amount that is exactly zero.
    pub zero_representation: String,
}

impl Default for AmountFormat {
    fn default() -> Self {
        Self {
            zero_representation: "-".to_string(),
        }
    }
}

impl AmountFormat {
    /// With `show_symbol`, amounts are grouped and rendered with the
    /// currency's symbol and minor-unit digits (`-£1,234.56`, `¥1,235`).
    /// Without it, every currency gets a plain two-decimal string.
    pub fn format_amount(&self, amount: Decimal, currency: Currency, show_symbol: bool) -> String {
        if amount.is_zero() {
            return self.zero_representation.clone();
        }
        if !show_symbol {
            return format!("{:.2}", round_to_scale(amount, 2, RoundingMode::HalfUp));
        }

        let digits = currency.minor_digits();
        let rounded = round_to_scale(amount.abs(), digits, RoundingMode::HalfUp);
        let plain = format!("{:.*}", digits as usize, rounded);
        let (int_part, frac_part) = match plain.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (plain.as_str(), None),
        };

        let mut out = String::new();
        if amount.is_sign_negative() {
            out.push('-');
        }
        if let Some(symbol) = currency.symbol() {
            out.push_str(symbol);
        }
        out.push_str(&group_thousands(int_part));
        if let Some(frac) = frac_part {
            out.push('.');
            out.push_str(frac);
        }
        out
    }
}

/// Formats with the default zero representation.
pub fn format_amount(amount: Decimal, currency: Currency, show_symbol: bool) -> String {
    AmountFormat::default().format_amount(amount, currency, show_symbol)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
