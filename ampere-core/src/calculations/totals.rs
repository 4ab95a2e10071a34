//! Subtotal, GST and grand total for a list of line items.
//!
//! # Algorithm
//!
//! | Step | Value |
//! |------|-------|
//! | 1    | subtotal = Σ round(quantity × unit price) |
//! | 2    | gst = round(subtotal × GST rate) |
//! | 3    | total = round(subtotal + gst − discount) |
//! | 4    | total floored at zero when [`NegativeTotals::ClampToZero`] |
//!
//! Each line is rounded to cents first, so the subtotal always equals the sum
//! of the printed line totals. Rounding is half-up to two places. Every step
//! is checked: an amount outside the `Decimal` range is an
//! [`AmountOverflow`], never a panic.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use ampere_core::calculations::{PricingConfig, TotalsCalculator};
//! use ampere_core::models::{Category, LineItem};
//!
//! let items = vec![
//!     LineItem::new("1", "Distribution board", dec!(2), "pcs", dec!(100), Category::Materials),
//!     LineItem::new("2", "Installation", dec!(1), "lot", dec!(50), Category::Labour),
//! ];
//!
//! let calculator = TotalsCalculator::new(PricingConfig::default()).unwrap();
//! let totals = calculator.calculate(&items, dec!(10)).unwrap();
//!
//! assert_eq!(totals.subtotal, dec!(250.00));
//! assert_eq!(totals.gst, dec!(17.50));
//! assert_eq!(totals.total_amount, dec!(257.50));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::{max, round_half_up};
use crate::models::LineItem;

/// Singapore GST used by the firm.
const DEFAULT_GST_RATE: Decimal = Decimal::from_parts(7, 0, 0, false, 2);

/// Errors raised when building a [`TotalsCalculator`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingConfigError {
    /// The GST rate must lie in `[0, 1)`.
    #[error("GST rate must be between 0 and 1, got {0}")]
    InvalidGstRate(Decimal),
}

/// An amount too large for `Decimal`.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("amount is too large")]
pub struct AmountOverflow;

/// What to do when the discount exceeds subtotal plus GST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeTotals {
    /// Keep the negative amount (credit-note style).
    #[default]
    Allow,
    /// Floor the total at zero.
    ClampToZero,
}

/// Pricing parameters, normally read from the `[pricing]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// GST multiplier applied to the subtotal.
    pub gst_rate: Decimal,

    /// Handling of discounts larger than subtotal + GST.
    pub negative_totals: NegativeTotals,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            gst_rate: DEFAULT_GST_RATE,
            negative_totals: NegativeTotals::Allow,
        }
    }
}

/// Computed money figures for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Decimal,
    pub gst: Decimal,
    pub total_amount: Decimal,
}

/// Rounded price of a single line: `round(quantity × unit_price)`.
pub fn line_total(
    quantity: Decimal,
    unit_price: Decimal,
) -> Result<Decimal, AmountOverflow> {
    quantity
        .checked_mul(unit_price)
        .map(round_half_up)
        .ok_or(AmountOverflow)
}

/// Pure totals calculator.
///
/// The calculator trusts its input: negative quantities or prices are
/// rejected by validation before documents reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalsCalculator {
    config: PricingConfig,
}

impl TotalsCalculator {
    /// Build a calculator after checking the configuration.
    pub fn new(config: PricingConfig) -> Result<Self, PricingConfigError> {
        if config.gst_rate < Decimal::ZERO || config.gst_rate >= Decimal::ONE {
            return Err(PricingConfigError::InvalidGstRate(config.gst_rate));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Compute subtotal, GST and total for `items` less a flat `discount`.
    ///
    /// # Errors
    /// [`AmountOverflow`] when a line, the subtotal or the total does not
    /// fit in a `Decimal`.
    pub fn calculate(
        &self,
        items: &[LineItem],
        discount: Decimal,
    ) -> Result<Totals, AmountOverflow> {
        let subtotal = items.iter().try_fold(Decimal::ZERO, |sum, item| {
            item.total_price()
                .and_then(|price| sum.checked_add(price))
                .ok_or(AmountOverflow)
        })?;

        let subtotal = round_half_up(subtotal);
        let gst = round_half_up(
            subtotal
                .checked_mul(self.config.gst_rate)
                .ok_or(AmountOverflow)?,
        );
        let total_amount = round_half_up(
            subtotal
                .checked_add(gst)
                .and_then(|gross| gross.checked_sub(discount))
                .ok_or(AmountOverflow)?,
        );

        let total_amount = match self.config.negative_totals {
            NegativeTotals::Allow => total_amount,
            NegativeTotals::ClampToZero => round_half_up(max(total_amount, Decimal::ZERO)),
        };

        Ok(Totals {
            subtotal,
            gst,
            total_amount,
        })
    }
}

impl Default for TotalsCalculator {
    fn default() -> Self {
        Self {
            config: PricingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::Category;

    fn item(
        id: &str,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> LineItem {
        LineItem::new(id, "Item", quantity, "pcs", unit_price, Category::Materials)
    }

    fn totals(
        calculator: &TotalsCalculator,
        items: &[LineItem],
        discount: Decimal,
    ) -> Totals {
        calculator.calculate(items, discount).unwrap()
    }

    fn clamping() -> TotalsCalculator {
        TotalsCalculator::new(PricingConfig {
            negative_totals: NegativeTotals::ClampToZero,
            ..PricingConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn default_gst_rate_is_seven_percent() {
        assert_eq!(PricingConfig::default().gst_rate, dec!(0.07));
    }

    #[test]
    fn rejects_gst_rate_of_one_or_more() {
        let result = TotalsCalculator::new(PricingConfig {
            gst_rate: dec!(1),
            ..PricingConfig::default()
        });

        assert_eq!(result, Err(PricingConfigError::InvalidGstRate(dec!(1))));
    }

    #[test]
    fn rejects_negative_gst_rate() {
        let result = TotalsCalculator::new(PricingConfig {
            gst_rate: dec!(-0.07),
            ..PricingConfig::default()
        });

        assert!(matches!(result, Err(PricingConfigError::InvalidGstRate(_))));
    }

    #[test]
    fn two_item_quotation_with_discount() {
        let items = vec![item("1", dec!(2), dec!(100)), item("2", dec!(1), dec!(50))];

        let totals = totals(&TotalsCalculator::default(), &items, dec!(10));

        assert_eq!(
            totals,
            Totals {
                subtotal: dec!(250.00),
                gst: dec!(17.50),
                total_amount: dec!(257.50),
            }
        );
    }

    #[test]
    fn purchase_order_sample_matches_stored_figures() {
        let items = vec![item("1", dec!(20), dec!(45.50)), item("2", dec!(100), dec!(3.25))];

        let totals = totals(&TotalsCalculator::default(), &items, Decimal::ZERO);

        assert_eq!(totals.subtotal, dec!(1235.00));
        assert_eq!(totals.gst, dec!(86.45));
        assert_eq!(totals.total_amount, dec!(1321.45));
    }

    #[test]
    fn empty_item_list_totals_are_zero_less_discount() {
        let totals = totals(&TotalsCalculator::default(), &[], dec!(5));

        assert_eq!(totals.subtotal, dec!(0));
        assert_eq!(totals.gst, dec!(0));
        assert_eq!(totals.total_amount, dec!(-5));
    }

    #[test]
    fn subtotal_is_the_sum_of_rounded_line_totals() {
        // 0.004 and 3 × 0.335 = 1.005 both round at the line, not at the sum.
        let items = vec![
            item("1", dec!(1), dec!(0.004)),
            item("2", dec!(1), dec!(0.004)),
            item("3", dec!(3), dec!(0.335)),
        ];

        let totals = totals(&TotalsCalculator::default(), &items, Decimal::ZERO);

        let per_line: Decimal = items.iter().filter_map(|i| i.total_price()).sum();
        assert_eq!(per_line, dec!(1.01));
        assert_eq!(totals.subtotal, per_line);
    }

    #[test]
    fn tax_is_rounded_subtotal_times_rate() {
        let items = vec![item("1", dec!(1), dec!(10.05))];

        let totals = totals(&TotalsCalculator::default(), &items, Decimal::ZERO);

        // 10.05 × 0.07 = 0.7035
        assert_eq!(totals.gst, dec!(0.70));
        assert_eq!(totals.total_amount, dec!(10.75));
    }

    #[test]
    fn discount_larger_than_total_goes_negative_by_default() {
        let items = vec![item("1", dec!(1), dec!(100))];

        let totals = totals(&TotalsCalculator::default(), &items, dec!(200));

        assert_eq!(totals.total_amount, dec!(-93.00));
    }

    #[test]
    fn discount_larger_than_total_clamps_when_configured() {
        let items = vec![item("1", dec!(1), dec!(100))];

        let totals = totals(&clamping(), &items, dec!(200));

        assert_eq!(totals.subtotal, dec!(100.00));
        assert_eq!(totals.gst, dec!(7.00));
        assert_eq!(totals.total_amount, dec!(0));
    }

    #[test]
    fn clamping_leaves_positive_totals_alone() {
        let items = vec![item("1", dec!(2), dec!(100)), item("2", dec!(1), dec!(50))];

        assert_eq!(
            totals(&clamping(), &items, dec!(10)).total_amount,
            dec!(257.50)
        );
    }

    #[test]
    fn calculation_is_idempotent() {
        let items = vec![item("1", dec!(2.5), dec!(19.99)), item("2", dec!(7), dec!(3.333))];
        let calculator = TotalsCalculator::default();

        let first = totals(&calculator, &items, dec!(1.23));
        let second = totals(&calculator, &items, dec!(1.23));

        assert_eq!(first, second);
    }

    #[test]
    fn custom_gst_rate_is_applied() {
        let calculator = TotalsCalculator::new(PricingConfig {
            gst_rate: dec!(0.09),
            ..PricingConfig::default()
        })
        .unwrap();

        let totals = totals(&calculator, &[item("1", dec!(1), dec!(100))], Decimal::ZERO);

        assert_eq!(totals.gst, dec!(9.00));
        assert_eq!(totals.total_amount, dec!(109.00));
    }

    #[test]
    fn line_total_rounds_half_up() {
        assert_eq!(line_total(dec!(3), dec!(0.335)), Ok(dec!(1.01)));
        assert_eq!(line_total(dec!(20), dec!(45.50)), Ok(dec!(910.00)));
    }

    #[test]
    fn oversized_line_is_an_error() {
        assert_eq!(line_total(dec!(1e15), dec!(1e15)), Err(AmountOverflow));

        let items = vec![item("1", dec!(1e15), dec!(1e15))];

        assert_eq!(
            TotalsCalculator::default().calculate(&items, Decimal::ZERO),
            Err(AmountOverflow)
        );
    }

    #[test]
    fn oversized_sum_is_an_error() {
        let big = Decimal::MAX / dec!(2);
        let items = vec![
            item("1", dec!(1), big),
            item("2", dec!(1), big),
            item("3", dec!(1), big),
        ];

        assert_eq!(
            TotalsCalculator::default().calculate(&items, Decimal::ZERO),
            Err(AmountOverflow)
        );
    }
}
