//! Field-level validation of documents before they are stored.
//!
//! Field keys match the form keys of the admin front end (`clientId`,
//! `item_0_quantity`, ...) so callers can show each message next to its input.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::LineItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every problem found in one pass; empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize)]
#[error("validation failed: {}", summary(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        field: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message recorded for `field`.
    pub fn message(
        &self,
        field: &str,
    ) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn contains(
        &self,
        field: &str,
    ) -> bool {
        self.message(field).is_some()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

pub(crate) fn require_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    message: &str,
) {
    if value.trim().is_empty() {
        errors.push(field, message);
    }
}

pub(crate) fn check_discount(
    errors: &mut ValidationErrors,
    discount: Decimal,
) {
    if discount < Decimal::ZERO {
        errors.push("discount", "Discount cannot be negative");
    }
}

/// At least one item, and every item with a description, positive
/// quantity and unit price, and a line total that fits in a `Decimal`.
pub(crate) fn check_items(
    errors: &mut ValidationErrors,
    items: &[LineItem],
) {
    if items.is_empty() {
        errors.push("items", "At least one item is required");
        return;
    }

    for (index, item) in items.iter().enumerate() {
        if item.description.trim().is_empty() {
            errors.push(format!("item_{index}_description"), "Item description is required");
        }
        if item.quantity() <= Decimal::ZERO {
            errors.push(format!("item_{index}_quantity"), "Quantity must be greater than 0");
        }
        if item.unit_price() <= Decimal::ZERO {
            errors.push(format!("item_{index}_unitPrice"), "Unit price must be greater than 0");
        }
        if item.total_price().is_none() {
            errors.push(format!("item_{index}_quantity"), "Amount is too large");
        }
    }
}

/// A deadline may be today but not earlier.
pub(crate) fn check_not_past(
    errors: &mut ValidationErrors,
    field: &str,
    deadline: NaiveDate,
    today: NaiveDate,
    message: &str,
) {
    if deadline < today {
        errors.push(field, message);
    }
}
