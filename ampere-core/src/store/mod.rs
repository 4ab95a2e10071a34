pub mod budget;
pub mod catalog;
pub mod documents;
pub mod error;
pub mod filter;
pub mod numbering;
pub mod purchase_orders;
mod snapshot;

pub use budget::{BUDGETS_KEY, BudgetLedger};
pub use catalog::{CATALOG_KEY, Catalog};
pub use documents::DocumentStore;
pub use error::StoreError;
pub use filter::DocumentFilter;
pub use numbering::{DocumentNumbering, NumberingConfig};
pub use purchase_orders::PurchaseOrderBook;

use crate::models::{PurchaseOrder, Quotation};

pub type QuotationStore = DocumentStore<Quotation>;
pub type PurchaseOrderStore = DocumentStore<PurchaseOrder>;
