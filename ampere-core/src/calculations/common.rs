//! Common utility functions for money calculations.
//!
//! Rounding and small comparisons shared by the line-item, totals and
//! budget code.

use rust_decimal::Decimal;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// This follows standard financial rounding conventions where values at exactly
/// 0.005 are rounded up to 0.01 (away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use ampere_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// assert_eq!(round_half_up(dec!(250)).to_string(), "250.00");
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
    // Keep the scale at 2 so whole amounts print as `250.00`.
    rounded.rescale(2);
    rounded
}

/// Returns the maximum of two decimal values.
///
/// ```
/// use rust_decimal_macros::dec;
/// use ampere_core::calculations::common::max;
///
/// assert_eq!(max(dec!(-12.50), dec!(0)), dec!(0));
/// assert_eq!(max(dec!(200.00), dec!(100.00)), dec!(200.00));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}
