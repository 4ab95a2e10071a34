use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Category, LineItem, NewLineItem};

/// A frequently used item offered when filling in documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub description: String,
    pub unit: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub category: Category,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    /// Default items ship with the system and cannot be deleted.
    #[serde(default)]
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn active_by_default() -> bool {
    true
}

impl CatalogItem {
    pub fn from_new(
        id: String,
        new: NewCatalogItem,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            description: new.description,
            unit: new.unit,
            unit_price: new.unit_price,
            category: new.category,
            is_active: true,
            is_default: new.is_default,
            created_at: now,
            updated_at: now,
        }
    }

    /// Draft row for a document, priced from the catalog.
    pub fn to_new_line_item(
        &self,
        quantity: Decimal,
    ) -> NewLineItem {
        NewLineItem::new(self.description.clone(), quantity, self.unit.clone(), self.unit_price, self.category)
    }

    pub fn to_line_item(
        &self,
        id: impl Into<String>,
        quantity: Decimal,
    ) -> LineItem {
        LineItem::from_new(id, self.to_new_line_item(quantity))
    }

    pub fn apply(
        &mut self,
        patch: CatalogItemPatch,
    ) {
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(unit_price) = patch.unit_price {
            self.unit_price = unit_price;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCatalogItem {
    pub description: String,
    pub unit: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub is_default: bool,
}

impl NewCatalogItem {
    pub fn new(
        description: impl Into<String>,
        unit: impl Into<String>,
        unit_price: Decimal,
        category: Category,
    ) -> Self {
        Self {
            description: description.into(),
            unit: unit.into(),
            unit_price,
            category,
            is_default: false,
        }
    }
}

/// `is_default` is fixed at creation and cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogItemPatch {
    pub description: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub category: Option<Category>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn breaker() -> CatalogItem {
        CatalogItem::from_new(
            "3".into(),
            NewCatalogItem::new("Circuit Breakers", "pcs", dec!(45.50), Category::Materials),
            Utc::now(),
        )
    }

    #[test]
    fn new_items_start_active() {
        let item = breaker();

        assert!(item.is_active);
        assert!(!item.is_default);
    }

    #[test]
    fn to_line_item_prices_from_catalog() {
        let line = breaker().to_line_item("1", dec!(20));

        assert_eq!(line.description, "Circuit Breakers");
        assert_eq!(line.total_price(), Some(dec!(910.00)));
    }

    #[test]
    fn patch_updates_present_fields() {
        let mut item = breaker();

        item.apply(CatalogItemPatch {
            unit_price: Some(dec!(48)),
            is_active: Some(false),
            ..CatalogItemPatch::default()
        });

        assert_eq!(item.unit_price, dec!(48));
        assert!(!item.is_active);
        assert_eq!(item.unit, "pcs");
    }
}
