pub mod calculations;
pub mod clock;
pub mod db;
pub mod document;
pub mod export;
pub mod lifecycle;
pub mod models;
pub mod store;
pub mod validation;

pub use calculations::{AmountOverflow, NegativeTotals, PricingConfig, Totals, TotalsCalculator};
pub use clock::{Clock, FixedClock, SystemClock};
pub use db::{SnapshotStorage, StorageConfig, StorageError, StorageFactory, StorageRegistry};
pub use document::FinancialDocument;
pub use export::{ExportError, export_json};
pub use lifecycle::Lifecycle;
pub use models::*;
pub use store::{
    BudgetLedger, Catalog, DocumentFilter, DocumentNumbering, DocumentStore, NumberingConfig,
    PurchaseOrderBook, PurchaseOrderStore, QuotationStore, StoreError,
};
pub use validation::{FieldError, ValidationErrors};
