use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use ampere_core::{Catalog, StorageConfig, StorageRegistry, SystemClock};
use ampere_data::CatalogLoader;
use ampere_db_sqlite::SqliteStorageFactory;
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Load frequently used items from a CSV file into the catalog.
///
/// The CSV file should have the following columns:
/// - description: Item text (e.g., "Circuit Breakers")
/// - unit: Unit label (e.g., pcs, days, cubic meter)
/// - unit_price: Price per unit before GST
/// - category: Labour, Materials, Equipment, Transportation, Permits & Fees, Overhead or Other
/// - is_default: Optional; true marks the item as undeletable
///
/// Rows matching an existing item on description and unit update its price
/// and category instead of adding a duplicate.
#[derive(Parser, Debug)]
#[command(name = "ampere-catalog-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing catalog items
    #[arg(short, long)]
    file: PathBuf,

    /// Storage backend (memory, json or sqlite)
    #[arg(short, long, default_value = "json")]
    backend: String,

    /// Data directory for json, database path for sqlite
    #[arg(short, long, default_value = "data")]
    connection: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut registry = StorageRegistry::with_builtin();
    registry.register(Box::new(SqliteStorageFactory));

    let config = StorageConfig {
        backend: args.backend.clone(),
        connection_string: args.connection.clone(),
    };
    let storage = registry
        .create(&config)
        .await
        .with_context(|| format!("Failed to open {} storage at: {}", args.backend, args.connection))?;

    let mut catalog = Catalog::open(storage, Arc::new(SystemClock)).await;

    println!("Loading catalog items from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = CatalogLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let summary = CatalogLoader::load(&mut catalog, &records)
        .await
        .context("Failed to load catalog items")?;

    println!(
        "Added {} and updated {} items; the catalog now holds {}.",
        summary.added,
        summary.updated,
        catalog.all().len()
    );

    Ok(())
}
