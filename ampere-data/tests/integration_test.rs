//! Integration tests for catalog loading against real storage backends.

use std::sync::Arc;

use ampere_core::db::MemoryStorage;
use ampere_core::{Catalog, Category, FixedClock, SnapshotStorage, StoreError};
use ampere_data::{CatalogLoader, CatalogLoaderError, LoadSummary};
use ampere_db_sqlite::SqliteStorage;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

const TEST_CSV: &str = include_str!("../test-data/catalog.csv");

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::on(2024, 6, 3))
}

async fn setup_sqlite() -> Arc<SqliteStorage> {
    let storage = SqliteStorage::new(":memory:")
        .await
        .expect("Failed to create in-memory database");
    storage
        .run_migrations()
        .await
        .expect("Failed to run migrations");
    Arc::new(storage)
}

#[tokio::test]
async fn test_load_into_seeded_catalog() {
    let storage = Arc::new(MemoryStorage::new());
    let mut catalog = Catalog::open(storage, clock()).await;
    let records = CatalogLoader::parse(TEST_CSV.as_bytes()).unwrap();

    let summary = CatalogLoader::load(&mut catalog, &records).await.unwrap();

    assert_eq!(summary, LoadSummary { added: 6, updated: 1 });
    assert_eq!(catalog.all().len(), 12);

    let concrete = catalog.find("concrete works", "Cubic Meter").unwrap();
    assert_eq!(concrete.unit_price, dec!(185));
    assert!(concrete.is_default);

    let permit = catalog.find("BCA Permit Submission", "lot").unwrap();
    assert_eq!(permit.category, Category::PermitsAndFees);
    assert_eq!(permit.id, "12");
}

#[tokio::test]
async fn test_load_is_idempotent() {
    let storage = Arc::new(MemoryStorage::new());
    let mut catalog = Catalog::open(storage, clock()).await;
    let records = CatalogLoader::parse(TEST_CSV.as_bytes()).unwrap();

    CatalogLoader::load(&mut catalog, &records).await.unwrap();
    let summary = CatalogLoader::load(&mut catalog, &records).await.unwrap();

    assert_eq!(summary, LoadSummary { added: 0, updated: 7 });
    assert_eq!(catalog.all().len(), 12);
}

#[tokio::test]
async fn test_default_flag_protects_imported_item() {
    let storage = Arc::new(MemoryStorage::new());
    let mut catalog = Catalog::open(storage, clock()).await;
    let records = CatalogLoader::parse(TEST_CSV.as_bytes()).unwrap();
    CatalogLoader::load(&mut catalog, &records).await.unwrap();

    let electrician = catalog
        .find("Electrician (Daily Rate)", "days")
        .unwrap()
        .id
        .clone();
    let cables = catalog.find("Electrical Cables", "meters").unwrap().id.clone();

    assert!(matches!(
        catalog.delete(&electrician).await,
        Err(StoreError::DefaultItem { .. })
    ));
    assert_eq!(catalog.delete(&cables).await, Ok(true));
}

#[tokio::test]
async fn test_invalid_category_writes_nothing() {
    let storage = Arc::new(MemoryStorage::new());
    let mut catalog = Catalog::open(storage.clone(), clock()).await;
    let writes = storage.save_count();
    let csv = "description,unit,unit_price,category\nGlass Panel,pcs,90,Materials\nWidget,pcs,5,Gadgets\n";
    let records = CatalogLoader::parse(csv.as_bytes()).unwrap();

    let result = CatalogLoader::load(&mut catalog, &records).await;

    assert!(matches!(result, Err(CatalogLoaderError::InvalidCategory { .. })));
    assert_eq!(storage.save_count(), writes);
    assert_eq!(catalog.all().len(), 6);
}

#[tokio::test]
async fn test_zero_price_is_rejected() {
    let storage = Arc::new(MemoryStorage::new());
    let mut catalog = Catalog::open(storage, clock()).await;
    let csv = "description,unit,unit_price,category\nFree Sample,pcs,0,Materials\n";
    let records = CatalogLoader::parse(csv.as_bytes()).unwrap();

    let err = CatalogLoader::load(&mut catalog, &records).await.unwrap_err();

    match err {
        CatalogLoaderError::Rejected { description, source } => {
            assert_eq!(description, "Free Sample");
            let errors = source.validation().expect("validation failure");
            assert_eq!(
                errors.message("unitPrice"),
                Some("Unit price must be greater than 0")
            );
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_load_into_sqlite_survives_reopen() {
    let storage = setup_sqlite().await;
    let mut catalog = Catalog::open(storage.clone(), clock()).await;
    let records = CatalogLoader::parse(TEST_CSV.as_bytes()).unwrap();

    CatalogLoader::load(&mut catalog, &records).await.unwrap();

    let reopened = Catalog::open(storage.clone(), clock()).await;
    assert_eq!(reopened.all().len(), 12);
    assert_eq!(
        reopened
            .search("circuit")
            .into_iter()
            .map(|i| i.unit_price)
            .collect::<Vec<_>>(),
        vec![dec!(45.50)]
    );
    assert_eq!(
        storage.keys().await.unwrap(),
        vec!["ampere_frequently_used_items"]
    );
}
