use std::io::Read;

use ampere_core::{Catalog, CatalogItemPatch, Category, NewCatalogItem, StoreError};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when importing catalog items.
#[derive(Debug, Error)]
pub enum CatalogLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid category '{category}' for '{description}'")]
    InvalidCategory { description: String, category: String },

    #[error("Rejected '{description}': {source}")]
    Rejected {
        description: String,
        #[source]
        source: StoreError,
    },
}

impl From<csv::Error> for CatalogLoaderError {
    fn from(err: csv::Error) -> Self {
        CatalogLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of a catalog CSV file.
///
/// - `description`: item text shown on documents
/// - `unit`: unit label (e.g. `pcs`, `days`)
/// - `unit_price`: price per unit
/// - `category`: one of the category labels (e.g. `Materials`, `Permits & Fees`)
/// - `is_default`: optional; `true` protects the item from deletion
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogRecord {
    pub description: String,
    pub unit: String,
    pub unit_price: Decimal,
    pub category: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_default: bool,
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" || v.eq_ignore_ascii_case("yes") => {
            Ok(true)
        }
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" || v.eq_ignore_ascii_case("no") => {
            Ok(false)
        }
        Some(v) => Err(serde::de::Error::custom(format!("invalid flag '{v}'"))),
    }
}

impl CatalogRecord {
    fn category(&self) -> Result<Category, CatalogLoaderError> {
        Category::parse(&self.category).ok_or_else(|| CatalogLoaderError::InvalidCategory {
            description: self.description.clone(),
            category: self.category.clone(),
        })
    }
}

/// How many rows created new items and how many refreshed existing ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub added: usize,
    pub updated: usize,
}

/// Imports catalog items from CSV into a [`Catalog`].
pub struct CatalogLoader;

impl CatalogLoader {
    /// Parse catalog records from any reader (a file, a byte slice, ...).
    pub fn parse<R: Read>(reader: R) -> Result<Vec<CatalogRecord>, CatalogLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: CatalogRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Add or refresh one catalog item per record.
    ///
    /// Items are matched on description and unit, ignoring case, so loading
    /// the same file twice leaves the catalog unchanged. Every category is
    /// checked before anything is written.
    pub async fn load(
        catalog: &mut Catalog,
        records: &[CatalogRecord],
    ) -> Result<LoadSummary, CatalogLoaderError> {
        let categories = records
            .iter()
            .map(CatalogRecord::category)
            .collect::<Result<Vec<_>, _>>()?;

        let mut summary = LoadSummary::default();
        for (record, category) in records.iter().zip(categories) {
            let rejected = |source| CatalogLoaderError::Rejected {
                description: record.description.clone(),
                source,
            };

            let existing = catalog
                .find(&record.description, &record.unit)
                .map(|item| item.id.clone());
            match existing {
                Some(id) => {
                    let patch = CatalogItemPatch {
                        unit_price: Some(record.unit_price),
                        category: Some(category),
                        ..CatalogItemPatch::default()
                    };
                    catalog.update(&id, patch).await.map_err(rejected)?;
                    summary.updated += 1;
                }
                None => {
                    let mut new = NewCatalogItem::new(
                        record.description.clone(),
                        record.unit.clone(),
                        record.unit_price,
                        category,
                    );
                    new.is_default = record.is_default;
                    catalog.add(new).await.map_err(rejected)?;
                    summary.added += 1;
                }
            }
        }

        tracing::info!(added = summary.added, updated = summary.updated, "catalog import finished");
        Ok(summary)
    }
}
