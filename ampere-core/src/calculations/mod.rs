//! Money calculations for quotations and purchase orders.
//!
//! Everything in here is pure: no storage, no clock, no logging side effects
//! beyond what the caller asks for.

pub mod common;
pub mod totals;

pub use totals::{
    AmountOverflow, NegativeTotals, PricingConfig, PricingConfigError, Totals, TotalsCalculator,
    line_total,
};
