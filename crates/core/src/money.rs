use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Toward negative infinity.
    Floor,
    /// Toward positive infinity.
    Ceiling,
    /// Toward zero.
    Down,
    /// Nearest, ties away from zero (2.555 -> 2.56, -2.555 -> -2.56).
    HalfUp,
    /// Nearest, ties to even (banker's rounding).
    HalfEven,
}

impl From<RoundingMode> for RoundingStrategy {
    fn from(mode: RoundingMode) -> Self {
        match mode {
            RoundingMode::Floor => RoundingStrategy::ToNegativeInfinity,
            RoundingMode::Ceiling => RoundingStrategy::ToPositiveInfinity,
            RoundingMode::Down => RoundingStrategy::ToZero,
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
        }
    }
}

pub fn round_to_scale(value: Decimal, scale: u32, mode: RoundingMode) -> Decimal {
    value.round_dp_with_strategy(scale, mode.into())
}

/// Rounds to pence the way every stored total is rounded.
pub fn round_money(value: Decimal) -> Decimal {
    round_to_scale(value, 2, RoundingMode::HalfUp)
}

/// Converts to integer minor units (x100, ties away from zero).
///
/// Returns `None` only when the result does not fit in an `i64`.
pub fn decimal_to_minor_units(value: Decimal) -> Option<i64> {
    value
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

pub fn minor_units_to_decimal(units: i64) -> Decimal {
    Decimal::new(units, 2)
}
