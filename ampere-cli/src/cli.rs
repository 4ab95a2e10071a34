use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

/// Quotations, purchase orders and project budgets for Ampere.
///
/// Settings come from `ampere.toml` (or `--config`); `--backend` and `--db`
/// override its `[storage]` section.
#[derive(Debug, Parser)]
#[command(name = "ampere")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend: memory, json or sqlite.
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Connection string: a directory for json, a file path or `:memory:`
    /// for sqlite.
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage quotations sent to clients
    #[command(subcommand, visible_alias = "q")]
    Quotation(DocumentCommand),

    /// Manage purchase orders issued to vendors
    #[command(subcommand, name = "po")]
    PurchaseOrder(DocumentCommand),

    /// Manage project/vendor budgets
    #[command(subcommand)]
    Budget(BudgetCommand),

    /// Manage frequently used items
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Price a list of line items without storing anything
    Totals {
        /// JSON array of line items
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long, default_value = "0")]
        discount: Decimal,
    },
}

/// Operations shared by quotations and purchase orders. Documents are
/// addressed by id or by document number.
#[derive(Debug, Subcommand)]
pub enum DocumentCommand {
    /// Create a document from a JSON draft
    Add {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List documents, optionally filtered
    List(FilterArgs),

    /// Print one document as JSON
    Show { document: String },

    /// Merge a JSON patch into a document
    Update {
        document: String,
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Move a document to another status
    Transition {
        document: String,
        /// Target status, e.g. `sent` or `pending_approval`
        status: String,
        /// Who performed the change
        #[arg(long)]
        actor: Option<String>,
    },

    /// Delete a document
    Delete { document: String },

    /// Mark sent quotations past their validity date as expired
    Expire,

    /// Write matching documents as a JSON array
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Edit the line items of a document
    #[command(subcommand)]
    Item(ItemCommand),
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long)]
    pub status: Option<String>,

    /// Client for quotations, vendor for purchase orders
    #[arg(long, visible_aliases = ["client", "vendor"])]
    pub party: Option<String>,

    #[arg(long)]
    pub project: Option<String>,

    /// Created on or after (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Created on or before (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Text to look for in title, description or number
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ItemCommand {
    /// Append a line item, from a JSON file or from the catalog
    Add {
        document: String,
        #[arg(short, long, conflicts_with = "catalog", required_unless_present = "catalog")]
        file: Option<PathBuf>,
        /// Catalog item id
        #[arg(long, requires = "quantity")]
        catalog: Option<String>,
        #[arg(long)]
        quantity: Option<Decimal>,
    },

    /// Merge a JSON patch into a line item
    Update {
        document: String,
        item: String,
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Remove a line item
    Remove { document: String, item: String },
}

#[derive(Debug, Subcommand)]
pub enum BudgetCommand {
    /// Set the budget a project allocates to a vendor
    Assign {
        #[arg(long)]
        project: String,
        #[arg(long)]
        vendor: String,
        #[arg(long)]
        allocated: Decimal,
        #[arg(long, default_value = "")]
        role: String,
        #[arg(long, default_value = "0")]
        contract_value: Decimal,
    },

    /// List budgets, optionally for one project
    List {
        #[arg(long)]
        project: Option<String>,
    },

    /// Remove the budget for a project/vendor pair
    Remove {
        #[arg(long)]
        project: String,
        #[arg(long)]
        vendor: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    /// List active items, or every item with --all
    List {
        #[arg(long)]
        all: bool,
        #[arg(long)]
        search: Option<String>,
    },

    /// Add an item
    Add {
        #[arg(long)]
        description: String,
        #[arg(long)]
        unit: String,
        #[arg(long)]
        price: Decimal,
        /// Labour, Materials, Equipment, Transportation, "Permits & Fees",
        /// Overhead or Other
        #[arg(long, default_value = "Materials")]
        category: String,
    },

    /// Change an item's fields
    Update {
        id: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long)]
        category: Option<String>,
    },

    /// Delete an item; default items cannot be deleted
    Delete { id: String },

    /// Flip an item between active and inactive
    Toggle { id: String },

    /// Import items from a CSV file
    Import {
        #[arg(short, long)]
        file: PathBuf,
    },
}
