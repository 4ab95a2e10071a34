use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::{AmountOverflow, line_total};
use crate::models::Category;

fn default_unit() -> String {
    "pcs".to_string()
}

/// One quoted or purchased row of a document.
///
/// `total_price` is always `round(quantity × unit_price)`: it has no setter
/// and is recomputed when a stored item is deserialized. It is `None` while
/// the product does not fit in a `Decimal`; validation rejects such rows, and
/// reading one back from storage is a deserialization error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "LineItemRecord")]
pub struct LineItem {
    pub id: String,
    pub description: String,
    quantity: Decimal,
    pub unit: String,
    unit_price: Decimal,
    total_price: Option<Decimal>,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_quantity: Option<Decimal>,
}

/// Wire shape accepted when reading items back; any stored `totalPrice` is ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineItemRecord {
    id: String,
    description: String,
    quantity: Decimal,
    #[serde(default = "default_unit")]
    unit: String,
    unit_price: Decimal,
    #[serde(default)]
    category: Category,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    received_quantity: Option<Decimal>,
}

impl TryFrom<LineItemRecord> for LineItem {
    type Error = AmountOverflow;

    fn try_from(record: LineItemRecord) -> Result<Self, Self::Error> {
        let mut item = LineItem::new(
            record.id,
            record.description,
            record.quantity,
            record.unit,
            record.unit_price,
            record.category,
        );
        item.notes = record.notes;
        item.received_quantity = record.received_quantity;
        if item.total_price.is_none() {
            return Err(AmountOverflow);
        }
        Ok(item)
    }
}

impl LineItem {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        quantity: Decimal,
        unit: impl Into<String>,
        unit_price: Decimal,
        category: Category,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            quantity,
            unit: unit.into(),
            unit_price,
            total_price: line_total(quantity, unit_price).ok(),
            category,
            notes: None,
            received_quantity: None,
        }
    }

    /// Materialize a draft row under the given id.
    pub fn from_new(
        id: impl Into<String>,
        new: NewLineItem,
    ) -> Self {
        let mut item = Self::new(
            id,
            new.description,
            new.quantity,
            new.unit,
            new.unit_price,
            new.category,
        );
        item.notes = new.notes;
        item.received_quantity = new.received_quantity;
        item
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// `None` when `quantity × unit_price` is too large to represent.
    pub fn total_price(&self) -> Option<Decimal> {
        self.total_price
    }

    pub fn set_quantity(
        &mut self,
        quantity: Decimal,
    ) {
        self.quantity = quantity;
        self.total_price = line_total(self.quantity, self.unit_price).ok();
    }

    pub fn set_unit_price(
        &mut self,
        unit_price: Decimal,
    ) {
        self.unit_price = unit_price;
        self.total_price = line_total(self.quantity, self.unit_price).ok();
    }

    /// Merge `patch` into this item; absent fields are kept.
    pub fn apply(
        &mut self,
        patch: LineItemPatch,
    ) {
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(received) = patch.received_quantity {
            self.received_quantity = Some(received);
        }
        if let Some(quantity) = patch.quantity {
            self.set_quantity(quantity);
        }
        if let Some(unit_price) = patch.unit_price {
            self.set_unit_price(unit_price);
        }
    }
}

/// A line as entered by the user, before it gets an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub description: String,
    pub quantity: Decimal,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub received_quantity: Option<Decimal>,
}

impl NewLineItem {
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        unit: impl Into<String>,
        unit_price: Decimal,
        category: Category,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit: unit.into(),
            unit_price,
            category,
            notes: None,
            received_quantity: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItemPatch {
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub category: Option<Category>,
    pub notes: Option<String>,
    pub received_quantity: Option<Decimal>,
}
