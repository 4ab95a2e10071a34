use std::sync::Arc;

use ampere_core::{
    BudgetLedger, Catalog, Clock, DocumentStore, PurchaseOrderBook, QuotationStore,
    SnapshotStorage, StorageRegistry, TotalsCalculator,
};
use ampere_db_sqlite::SqliteStorageFactory;
use anyhow::{Context, Result};
use tracing::debug;

use crate::config::AppConfig;

/// Built-in backends plus SQLite.
pub fn build_registry() -> StorageRegistry {
    let mut registry = StorageRegistry::with_builtin();
    registry.register(Box::new(SqliteStorageFactory));
    registry
}

/// Every store the commands work on, sharing one storage backend.
pub struct Stores {
    pub quotations: QuotationStore,
    pub purchase_orders: PurchaseOrderBook,
    pub catalog: Catalog,
}

impl Stores {
    pub async fn open(
        storage: Arc<dyn SnapshotStorage>,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let calculator =
            TotalsCalculator::new(config.pricing.clone()).context("Invalid [pricing] config")?;

        let quotations = DocumentStore::open(
            storage.clone(),
            calculator.clone(),
            config.numbering.quotations(),
            clock.clone(),
        )
        .await;
        let orders = DocumentStore::open(
            storage.clone(),
            calculator,
            config.numbering.purchase_orders(),
            clock.clone(),
        )
        .await;
        let ledger = BudgetLedger::open(storage.clone(), clock.clone()).await;
        let catalog = Catalog::open(storage, clock).await;

        Ok(Self {
            quotations,
            purchase_orders: PurchaseOrderBook::new(orders, ledger),
            catalog,
        })
    }

    /// Create the configured backend and open every store on it.
    pub async fn connect(
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        debug!(backend = %config.storage.backend, "connecting to storage");
        let storage = build_registry().create(&config.storage).await.with_context(|| {
            format!(
                "Failed to open {} storage at: {}",
                config.storage.backend, config.storage.connection_string
            )
        })?;
        Self::open(storage, config, clock).await
    }
}

#[cfg(test)]
mod tests {
    use ampere_core::{FixedClock, StorageConfig};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn registry_knows_every_backend() {
        assert_eq!(build_registry().available_backends(), vec!["json", "memory", "sqlite"]);
    }

    #[tokio::test]
    async fn connect_to_memory() {
        let config = AppConfig {
            storage: StorageConfig {
                backend: "memory".to_string(),
                connection_string: String::new(),
            },
            ..AppConfig::default()
        };

        let stores = Stores::connect(&config, Arc::new(FixedClock::on(2024, 5, 2)))
            .await
            .unwrap();

        assert!(stores.quotations.is_empty());
        assert_eq!(stores.catalog.all().len(), 6);
    }

    #[tokio::test]
    async fn unknown_backend_is_reported() {
        let config = AppConfig::default().with_overrides(Some("postgres".into()), None);

        let err = Stores::connect(&config, Arc::new(FixedClock::on(2024, 5, 2)))
            .await
            .err()
            .expect("postgres is not registered");

        assert!(format!("{err:#}").contains("unknown backend 'postgres'"));
    }

    #[tokio::test]
    async fn bad_gst_rate_is_reported() {
        let mut config = AppConfig::default().with_overrides(Some("memory".into()), None);
        config.pricing.gst_rate = dec!(1.5);

        let result = Stores::connect(&config, Arc::new(FixedClock::on(2024, 5, 2))).await;

        assert!(result.is_err());
    }
}
