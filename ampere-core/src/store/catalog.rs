use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::clock::Clock;
use crate::db::SnapshotStorage;
use crate::document::next_numeric_id;
use crate::models::{CatalogItem, CatalogItemPatch, Category, NewCatalogItem, NewLineItem};
use crate::store::error::StoreError;
use crate::store::snapshot::{self, Loaded};
use crate::validation::{self, ValidationErrors};

pub const CATALOG_KEY: &str = "ampere_frequently_used_items";

/// Items every new installation starts with. They can be deactivated but
/// never deleted.
fn default_items(now: DateTime<Utc>) -> Vec<CatalogItem> {
    [
        ("Site Supervision (Daily Rate)", "days", Decimal::new(350, 0), Category::Labour),
        ("Project Management (Monthly Rate)", "months", Decimal::new(8500, 0), Category::Labour),
        ("Concrete Works", "cubic meter", Decimal::new(180, 0), Category::Materials),
        ("Steel Reinforcement", "kg", Decimal::new(12, 1), Category::Materials),
        ("Scaffolding Rental", "sqm", Decimal::new(85, 1), Category::Equipment),
        ("Excavation Works", "cubic meter", Decimal::new(45, 0), Category::Labour),
    ]
    .into_iter()
    .enumerate()
    .map(|(index, (description, unit, unit_price, category))| {
        let mut new = NewCatalogItem::new(description, unit, unit_price, category);
        new.is_default = true;
        CatalogItem::from_new((index + 1).to_string(), new, now)
    })
    .collect()
}

/// Frequently used items offered when filling in documents.
pub struct Catalog {
    storage: Arc<dyn SnapshotStorage>,
    clock: Arc<dyn Clock>,
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// A storage with no catalog yet is seeded with the default items.
    pub async fn open(
        storage: Arc<dyn SnapshotStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let loaded = snapshot::load(storage.as_ref(), CATALOG_KEY).await;
        let seed = matches!(loaded, Loaded::Missing);
        let mut catalog = Self {
            storage,
            items: loaded.into_vec(),
            clock,
        };
        if seed {
            catalog.items = default_items(catalog.clock.now());
            tracing::info!(count = catalog.items.len(), "seeded default catalog");
            catalog.persist().await;
        }
        catalog
    }

    pub fn get(
        &self,
        id: &str,
    ) -> Option<&CatalogItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Exact, case-insensitive match on description and unit.
    pub fn find(
        &self,
        description: &str,
        unit: &str,
    ) -> Option<&CatalogItem> {
        self.items.iter().find(|i| {
            i.description.eq_ignore_ascii_case(description.trim()) && i.unit.eq_ignore_ascii_case(unit.trim())
        })
    }

    pub fn all(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn active(&self) -> Vec<&CatalogItem> {
        self.items.iter().filter(|i| i.is_active).collect()
    }

    /// Active items whose description contains `query`, ignoring case.
    pub fn search(
        &self,
        query: &str,
    ) -> Vec<&CatalogItem> {
        let needle = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|i| i.is_active && i.description.to_lowercase().contains(&needle))
            .collect()
    }

    /// Draft document row priced from the catalog.
    pub fn to_line_item(
        &self,
        id: &str,
        quantity: Decimal,
    ) -> Option<NewLineItem> {
        self.get(id).map(|item| item.to_new_line_item(quantity))
    }

    pub async fn add(
        &mut self,
        new: NewCatalogItem,
    ) -> Result<CatalogItem, StoreError> {
        validate(&new.description, new.unit_price)?;
        let id = next_numeric_id(self.items.iter().map(|i| i.id.as_str()));
        let item = CatalogItem::from_new(id, new, self.clock.now());

        tracing::info!(id = %item.id, description = %item.description, "catalog item added");
        self.items.push(item.clone());
        self.persist().await;
        Ok(item)
    }

    /// Returns `Ok(false)` when `id` is unknown.
    pub async fn update(
        &mut self,
        id: &str,
        patch: CatalogItemPatch,
    ) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let Some(existing) = self.items.iter_mut().find(|i| i.id == id) else {
            return Ok(false);
        };
        let mut item = existing.clone();
        item.apply(patch);
        validate(&item.description, item.unit_price)?;
        item.updated_at = now;
        *existing = item;

        tracing::info!(id, "catalog item updated");
        self.persist().await;
        Ok(true)
    }

    /// Returns `Ok(false)` when `id` is unknown.
    ///
    /// # Errors
    /// [`StoreError::DefaultItem`] for items shipped with the system.
    pub async fn delete(
        &mut self,
        id: &str,
    ) -> Result<bool, StoreError> {
        let Some(index) = self.items.iter().position(|i| i.id == id) else {
            return Ok(false);
        };
        if self.items[index].is_default {
            tracing::warn!(id, "refusing to delete default catalog item");
            return Err(StoreError::DefaultItem { id: id.to_string() });
        }
        self.items.remove(index);
        tracing::info!(id, "catalog item deleted");
        self.persist().await;
        Ok(true)
    }

    /// Flip `is_active`; returns the new state, or `None` for an unknown id.
    pub async fn toggle_active(
        &mut self,
        id: &str,
    ) -> Option<bool> {
        let now = self.clock.now();
        let item = self.items.iter_mut().find(|i| i.id == id)?;
        item.is_active = !item.is_active;
        item.updated_at = now;
        let active = item.is_active;

        tracing::info!(id, active, "catalog item toggled");
        self.persist().await;
        Some(active)
    }

    pub async fn reload(&mut self) {
        self.items = snapshot::load(self.storage.as_ref(), CATALOG_KEY).await.into_vec();
    }

    async fn persist(&self) {
        snapshot::save(self.storage.as_ref(), CATALOG_KEY, &self.items).await;
    }
}

fn validate(
    description: &str,
    unit_price: Decimal,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    validation::require_text(&mut errors, "description", description, "Description is required");
    if unit_price <= Decimal::ZERO {
        errors.push("unitPrice", "Unit price must be greater than 0");
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::clock::FixedClock;
    use crate::db::MemoryStorage;

    async fn catalog() -> (Catalog, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let catalog = Catalog::open(storage.clone(), Arc::new(FixedClock::on(2024, 1, 15))).await;
        (catalog, storage)
    }

    fn cable_tray() -> NewCatalogItem {
        NewCatalogItem::new("Cable Tray 100mm", "m", dec!(14.80), Category::Materials)
    }

    // ============================================================
    // seeding
    // ============================================================

    #[tokio::test]
    async fn empty_storage_is_seeded_with_defaults() {
        let (catalog, storage) = catalog().await;

        assert_eq!(catalog.all().len(), 6);
        assert!(catalog.all().iter().all(|i| i.is_default && i.is_active));
        assert!(storage.payload(CATALOG_KEY).is_some());
    }

    #[tokio::test]
    async fn existing_catalog_is_not_reseeded() {
        let storage = Arc::new(MemoryStorage::with_entry(CATALOG_KEY, "[]"));

        let catalog = Catalog::open(storage, Arc::new(FixedClock::on(2024, 1, 15))).await;

        assert!(catalog.all().is_empty());
    }

    // ============================================================
    // mutations
    // ============================================================

    #[tokio::test]
    async fn add_assigns_next_id() {
        let (mut catalog, _) = catalog().await;

        let item = catalog.add(cable_tray()).await.unwrap();

        assert_eq!(item.id, "7");
        assert!(!item.is_default);
    }

    #[tokio::test]
    async fn add_rejects_free_items() {
        let (mut catalog, _) = catalog().await;
        let mut new = cable_tray();
        new.unit_price = Decimal::ZERO;

        let err = catalog.add(new).await.unwrap_err();

        assert_eq!(
            err.validation().and_then(|e| e.message("unitPrice")),
            Some("Unit price must be greater than 0")
        );
    }

    #[tokio::test]
    async fn default_items_cannot_be_deleted() {
        let (mut catalog, _) = catalog().await;

        let err = catalog.delete("1").await.unwrap_err();

        assert_eq!(err, StoreError::DefaultItem { id: "1".into() });
        assert!(catalog.get("1").is_some());
    }

    #[tokio::test]
    async fn custom_items_can_be_deleted() {
        let (mut catalog, _) = catalog().await;
        let item = catalog.add(cable_tray()).await.unwrap();

        assert_eq!(catalog.delete(&item.id).await, Ok(true));
        assert_eq!(catalog.delete(&item.id).await, Ok(false));
    }

    #[tokio::test]
    async fn toggle_hides_item_from_search() {
        let (mut catalog, _) = catalog().await;

        assert_eq!(catalog.search("works").len(), 2);
        assert_eq!(catalog.toggle_active("3").await, Some(false));
        assert_eq!(catalog.search("WORKS").len(), 1);
        assert_eq!(catalog.active().len(), 5);
        assert_eq!(catalog.toggle_active("404").await, None);
    }

    #[tokio::test]
    async fn update_keeps_default_flag() {
        let (mut catalog, _) = catalog().await;

        let updated = catalog
            .update(
                "4",
                CatalogItemPatch {
                    unit_price: Some(dec!(1.35)),
                    ..CatalogItemPatch::default()
                },
            )
            .await;

        assert_eq!(updated, Ok(true));
        assert_eq!(catalog.get("4").unwrap().unit_price, dec!(1.35));
        assert!(catalog.get("4").unwrap().is_default);
    }

    #[tokio::test]
    async fn to_line_item_uses_catalog_price() {
        let (catalog, _) = catalog().await;

        let line = catalog.to_line_item("1", dec!(5)).unwrap();

        assert_eq!(line.description, "Site Supervision (Daily Rate)");
        assert_eq!(line.unit_price, dec!(350));
        assert_eq!(line.category, Category::Labour);
    }

    #[tokio::test]
    async fn find_matches_description_and_unit() {
        let (catalog, _) = catalog().await;

        assert_eq!(catalog.find("concrete works", "Cubic Meter").map(|i| i.id.as_str()), Some("3"));
        assert!(catalog.find("concrete works", "kg").is_none());
    }
}
