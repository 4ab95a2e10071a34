mod budget;
mod catalog_item;
mod category;
mod line_item;
mod purchase_order;
mod quotation;
mod status;

pub use budget::ProjectVendorBudget;
pub use catalog_item::{CatalogItem, CatalogItemPatch, NewCatalogItem};
pub use category::Category;
pub use line_item::{LineItem, LineItemPatch, NewLineItem};
pub use purchase_order::{NewPurchaseOrder, PurchaseOrder, PurchaseOrderPatch};
pub use quotation::{NewQuotation, Quotation, QuotationPatch};
pub use status::{PurchaseOrderStatus, QuotationStatus};
