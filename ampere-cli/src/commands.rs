//! Command handlers. Everything a command prints goes to the writer passed
//! in, so tests can capture it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ampere_core::{
    CatalogItem, CatalogItemPatch, Category, DocumentFilter, DocumentStore, FinancialDocument,
    LineItem, LineItemPatch, NewCatalogItem, NewLineItem, ProjectVendorBudget, PurchaseOrder,
    PurchaseOrderBook, Quotation, QuotationStore, StoreError, export_json,
};
use ampere_data::CatalogLoader;
use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::app::Stores;
use crate::cli::{
    BudgetCommand, CatalogCommand, Command, DocumentCommand, FilterArgs, ItemCommand,
};

/// Run one command against the open stores.
pub async fn run(
    command: Command,
    stores: &mut Stores,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Quotation(cmd) => {
            run_document(cmd, &mut stores.quotations, &stores.catalog, out).await
        }
        Command::PurchaseOrder(cmd) => {
            run_document(cmd, &mut stores.purchase_orders, &stores.catalog, out).await
        }
        Command::Budget(cmd) => run_budget(cmd, &mut stores.purchase_orders, out).await,
        Command::Catalog(cmd) => run_catalog(cmd, stores, out).await,
        Command::Totals { file, discount } => {
            let items: Vec<NewLineItem> = read_json(&file)?;
            let items: Vec<LineItem> = items
                .into_iter()
                .enumerate()
                .map(|(index, item)| LineItem::from_new((index + 1).to_string(), item))
                .collect();
            let totals = stores
                .quotations
                .calculator()
                .calculate(&items, discount)
                .with_context(|| format!("Cannot price the items in {}", file.display()))?;

            for item in &items {
                writeln!(
                    out,
                    "{:>3}  {:<36} {:>8} {:<12} x {:>10} = {:>12}",
                    item.id,
                    item.description,
                    item.quantity(),
                    item.unit,
                    item.unit_price(),
                    item.total_price().unwrap_or_default()
                )?;
            }
            writeln!(out, "Subtotal: {}", totals.subtotal)?;
            writeln!(out, "GST:      {}", totals.gst)?;
            writeln!(out, "Discount: {discount}")?;
            writeln!(out, "Total:    {}", totals.total_amount)?;
            Ok(())
        }
    }
}

// ─── documents ──────────────────────────────────────────────────────────────

/// What the document commands need from a store. Purchase orders go through
/// [`PurchaseOrderBook`] so budget usage follows every change.
trait Book {
    type Doc: FinancialDocument;

    fn store(&self) -> &DocumentStore<Self::Doc>;

    async fn add(
        &mut self,
        draft: <Self::Doc as FinancialDocument>::Draft,
    ) -> Result<Self::Doc, StoreError>;

    async fn update(
        &mut self,
        id: &str,
        patch: <Self::Doc as FinancialDocument>::Patch,
    ) -> Result<bool, StoreError>;

    async fn transition(
        &mut self,
        id: &str,
        to: <Self::Doc as FinancialDocument>::Status,
        actor: Option<&str>,
    ) -> Result<bool, StoreError>;

    async fn delete(
        &mut self,
        id: &str,
    ) -> bool;

    async fn add_item(
        &mut self,
        id: &str,
        new: NewLineItem,
    ) -> Result<Option<LineItem>, StoreError>;

    async fn update_item(
        &mut self,
        id: &str,
        item_id: &str,
        patch: LineItemPatch,
    ) -> Result<bool, StoreError>;

    async fn remove_item(
        &mut self,
        id: &str,
        item_id: &str,
    ) -> Result<bool, StoreError>;

    /// Ids of quotations that were expired; nothing for other documents.
    async fn expire(&mut self) -> Result<Vec<String>>;
}

impl Book for QuotationStore {
    type Doc = Quotation;

    fn store(&self) -> &DocumentStore<Quotation> {
        self
    }

    async fn add(
        &mut self,
        draft: ampere_core::NewQuotation,
    ) -> Result<Quotation, StoreError> {
        DocumentStore::add(self, draft).await
    }

    async fn update(
        &mut self,
        id: &str,
        patch: ampere_core::QuotationPatch,
    ) -> Result<bool, StoreError> {
        DocumentStore::update(self, id, patch).await
    }

    async fn transition(
        &mut self,
        id: &str,
        to: ampere_core::QuotationStatus,
        actor: Option<&str>,
    ) -> Result<bool, StoreError> {
        DocumentStore::transition(self, id, to, actor).await
    }

    async fn delete(
        &mut self,
        id: &str,
    ) -> bool {
        DocumentStore::delete(self, id).await
    }

    async fn add_item(
        &mut self,
        id: &str,
        new: NewLineItem,
    ) -> Result<Option<LineItem>, StoreError> {
        DocumentStore::add_item(self, id, new).await
    }

    async fn update_item(
        &mut self,
        id: &str,
        item_id: &str,
        patch: LineItemPatch,
    ) -> Result<bool, StoreError> {
        DocumentStore::update_item(self, id, item_id, patch).await
    }

    async fn remove_item(
        &mut self,
        id: &str,
        item_id: &str,
    ) -> Result<bool, StoreError> {
        DocumentStore::remove_item(self, id, item_id).await
    }

    async fn expire(&mut self) -> Result<Vec<String>> {
        Ok(self.expire_overdue().await)
    }
}

impl Book for PurchaseOrderBook {
    type Doc = PurchaseOrder;

    fn store(&self) -> &DocumentStore<PurchaseOrder> {
        self.orders()
    }

    async fn add(
        &mut self,
        draft: ampere_core::NewPurchaseOrder,
    ) -> Result<PurchaseOrder, StoreError> {
        PurchaseOrderBook::add(self, draft).await
    }

    async fn update(
        &mut self,
        id: &str,
        patch: ampere_core::PurchaseOrderPatch,
    ) -> Result<bool, StoreError> {
        PurchaseOrderBook::update(self, id, patch).await
    }

    async fn transition(
        &mut self,
        id: &str,
        to: ampere_core::PurchaseOrderStatus,
        actor: Option<&str>,
    ) -> Result<bool, StoreError> {
        PurchaseOrderBook::transition(self, id, to, actor).await
    }

    async fn delete(
        &mut self,
        id: &str,
    ) -> bool {
        PurchaseOrderBook::delete(self, id).await
    }

    async fn add_item(
        &mut self,
        id: &str,
        new: NewLineItem,
    ) -> Result<Option<LineItem>, StoreError> {
        PurchaseOrderBook::add_item(self, id, new).await
    }

    async fn update_item(
        &mut self,
        id: &str,
        item_id: &str,
        patch: LineItemPatch,
    ) -> Result<bool, StoreError> {
        PurchaseOrderBook::update_item(self, id, item_id, patch).await
    }

    async fn remove_item(
        &mut self,
        id: &str,
        item_id: &str,
    ) -> Result<bool, StoreError> {
        PurchaseOrderBook::remove_item(self, id, item_id).await
    }

    async fn expire(&mut self) -> Result<Vec<String>> {
        bail!("only quotations expire")
    }
}

type StatusOf<B> = <<B as Book>::Doc as FinancialDocument>::Status;

async fn run_document<B>(
    command: DocumentCommand,
    book: &mut B,
    catalog: &ampere_core::Catalog,
    out: &mut impl Write,
) -> Result<()>
where
    B: Book,
    <B::Doc as FinancialDocument>::Draft: DeserializeOwned,
    <B::Doc as FinancialDocument>::Patch: DeserializeOwned,
    StatusOf<B>: std::str::FromStr<Err = String>,
{
    let kind = <B::Doc as FinancialDocument>::KIND;

    match command {
        DocumentCommand::Add { file } => {
            let draft = read_json(&file)?;
            let document = book.add(draft).await.map_err(|e| rejected(kind, e))?;
            writeln!(
                out,
                "Created {kind} {} (id {}), total {}",
                document.number(),
                document.id(),
                document.totals().total_amount
            )?;
        }
        DocumentCommand::List(args) => {
            let filter = build_filter::<StatusOf<B>>(&args)?;
            let documents = book.store().list(&filter);
            for document in &documents {
                writeln!(out, "{}", summary_line(*document))?;
            }
            writeln!(out, "{} {kind}(s)", documents.len())?;
        }
        DocumentCommand::Show { document } => {
            let found = resolve(book.store(), &document, kind)?;
            serde_json::to_writer_pretty(&mut *out, found)?;
            writeln!(out)?;
        }
        DocumentCommand::Update { document, file } => {
            let id = resolve(book.store(), &document, kind)?.id().to_string();
            let patch = read_json(&file)?;
            book.update(&id, patch).await.map_err(|e| rejected(kind, e))?;
            print_saved(book.store(), &id, out)?;
        }
        DocumentCommand::Transition {
            document,
            status,
            actor,
        } => {
            let id = resolve(book.store(), &document, kind)?.id().to_string();
            let to: StatusOf<B> = status.parse().map_err(|e: String| anyhow!(e))?;
            book.transition(&id, to, actor.as_deref())
                .await
                .map_err(|e| rejected(kind, e))?;
            print_saved(book.store(), &id, out)?;
        }
        DocumentCommand::Delete { document } => {
            let found = resolve(book.store(), &document, kind)?;
            let (id, number) = (found.id().to_string(), found.number().to_string());
            book.delete(&id).await;
            writeln!(out, "Deleted {kind} {number}")?;
        }
        DocumentCommand::Expire => {
            let expired = book.expire().await?;
            writeln!(out, "Expired {} {kind}(s)", expired.len())?;
            for id in expired {
                if let Some(document) = book.store().get(&id) {
                    writeln!(out, "  {}", document.number())?;
                }
            }
        }
        DocumentCommand::Export { filter, output } => {
            let filter = build_filter::<StatusOf<B>>(&filter)?;
            let documents = book.store().list(&filter);
            let count = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create: {}", path.display()))?;
                    let count = export_json(documents, BufWriter::new(file))?;
                    writeln!(out, "Exported {count} {kind}(s) to {}", path.display())?;
                    count
                }
                None => export_json(documents, &mut *out)?,
            };
            tracing::info!(kind, count, "documents exported");
        }
        DocumentCommand::Item(command) => run_item(command, book, catalog, out).await?,
    }
    Ok(())
}

async fn run_item<B: Book>(
    command: ItemCommand,
    book: &mut B,
    catalog: &ampere_core::Catalog,
    out: &mut impl Write,
) -> Result<()> {
    let kind = <B::Doc as FinancialDocument>::KIND;

    match command {
        ItemCommand::Add {
            document,
            file,
            catalog: catalog_id,
            quantity,
        } => {
            let id = resolve(book.store(), &document, kind)?.id().to_string();
            let new = match (file, catalog_id) {
                (Some(file), _) => read_json(&file)?,
                (None, Some(catalog_id)) => {
                    let quantity = quantity.context("--quantity is required with --catalog")?;
                    catalog
                        .to_line_item(&catalog_id, quantity)
                        .with_context(|| format!("No catalog item with id {catalog_id}"))?
                }
                (None, None) => bail!("either --file or --catalog is required"),
            };
            let item = book
                .add_item(&id, new)
                .await
                .map_err(|e| rejected(kind, e))?
                .with_context(|| format!("No {kind} with id {id}"))?;
            writeln!(out, "Added item {}: {}", item.id, item.description)?;
            print_saved(book.store(), &id, out)?;
        }
        ItemCommand::Update {
            document,
            item,
            file,
        } => {
            let id = resolve(book.store(), &document, kind)?.id().to_string();
            let patch: LineItemPatch = read_json(&file)?;
            let updated = book
                .update_item(&id, &item, patch)
                .await
                .map_err(|e| rejected(kind, e))?;
            if !updated {
                bail!("No item {item} on {kind} {document}");
            }
            print_saved(book.store(), &id, out)?;
        }
        ItemCommand::Remove { document, item } => {
            let id = resolve(book.store(), &document, kind)?.id().to_string();
            let removed = book
                .remove_item(&id, &item)
                .await
                .map_err(|e| rejected(kind, e))?;
            if !removed {
                bail!("No item {item} on {kind} {document}");
            }
            print_saved(book.store(), &id, out)?;
        }
    }
    Ok(())
}

fn build_filter<S>(args: &FilterArgs) -> Result<DocumentFilter<S>>
where
    S: std::str::FromStr<Err = String>,
{
    let status = args
        .status
        .as_deref()
        .map(str::parse::<S>)
        .transpose()
        .map_err(|e| anyhow!(e))?;
    Ok(DocumentFilter {
        status,
        party_id: args.party.clone(),
        project_id: args.project.clone(),
        created_from: args.from,
        created_to: args.to,
        text: args.search.clone(),
    })
}

/// Look a document up by id first, then by number.
fn resolve<'a, D: FinancialDocument>(
    store: &'a DocumentStore<D>,
    key: &str,
    kind: &str,
) -> Result<&'a D> {
    store
        .get(key)
        .or_else(|| store.find_by_number(key))
        .with_context(|| format!("No {kind} with id or number {key}"))
}

fn summary_line<D: FinancialDocument>(document: &D) -> String {
    format!(
        "{:>4}  {:<16} {:<17} {:>12}  {}",
        document.id(),
        document.number(),
        document.status().to_string(),
        document.totals().total_amount,
        document.title()
    )
}

fn print_saved<D: FinancialDocument>(
    store: &DocumentStore<D>,
    id: &str,
    out: &mut impl Write,
) -> Result<()> {
    let document = store
        .get(id)
        .with_context(|| format!("{} {id} disappeared", D::KIND))?;
    let totals = document.totals();
    writeln!(out, "{}", summary_line(document))?;
    writeln!(
        out,
        "      subtotal {}  gst {}  discount {}  total {}",
        totals.subtotal,
        totals.gst,
        document.discount(),
        totals.total_amount
    )?;
    Ok(())
}

/// Flatten validation failures into one message per field.
fn rejected(
    kind: &str,
    error: StoreError,
) -> anyhow::Error {
    match error.validation() {
        Some(errors) => {
            let lines: Vec<String> = errors
                .errors
                .iter()
                .map(|e| format!("  {}: {}", e.field, e.message))
                .collect();
            anyhow!("{kind} rejected:\n{}", lines.join("\n"))
        }
        None => anyhow::Error::new(error),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON: {}", path.display()))
}

// ─── budgets ────────────────────────────────────────────────────────────────

async fn run_budget(
    command: BudgetCommand,
    book: &mut PurchaseOrderBook,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        BudgetCommand::Assign {
            project,
            vendor,
            allocated,
            role,
            contract_value,
        } => {
            // Keep what purchase orders have already used.
            let used = book
                .ledger()
                .get(&project, &vendor)
                .map(|b| b.budget_used)
                .unwrap_or(Decimal::ZERO);
            let mut entry = ProjectVendorBudget::new(&project, &vendor, allocated, Utc::now());
            entry.role = role;
            entry.contract_value = contract_value;
            entry.budget_used = used;
            book.ledger_mut().assign(entry).await;

            if let Some(budget) = book.ledger().get(&project, &vendor) {
                writeln!(out, "{}", budget_line(budget))?;
            }
        }
        BudgetCommand::List { project } => {
            let budgets: Vec<&ProjectVendorBudget> = match &project {
                Some(project) => book.ledger().list_for_project(project),
                None => book.ledger().all().iter().collect(),
            };
            for budget in &budgets {
                writeln!(out, "{}", budget_line(budget))?;
            }
            writeln!(out, "{} budget(s)", budgets.len())?;
        }
        BudgetCommand::Remove { project, vendor } => {
            if !book.ledger_mut().remove(&project, &vendor).await {
                bail!("No budget for project {project} and vendor {vendor}");
            }
            writeln!(out, "Removed budget for project {project} and vendor {vendor}")?;
        }
    }
    Ok(())
}

fn budget_line(budget: &ProjectVendorBudget) -> String {
    format!(
        "{:<12} {:<12} allocated {:>12}  used {:>12}  remaining {:>12}",
        budget.project_id,
        budget.vendor_id,
        budget.budget_allocated,
        budget.budget_used,
        budget.remaining()
    )
}

// ─── catalog ────────────────────────────────────────────────────────────────

async fn run_catalog(
    command: CatalogCommand,
    stores: &mut Stores,
    out: &mut impl Write,
) -> Result<()> {
    let catalog = &mut stores.catalog;

    match command {
        CatalogCommand::List { all, search } => {
            let items: Vec<&CatalogItem> = match (&search, all) {
                (Some(query), _) => catalog.search(query),
                (None, true) => catalog.all().iter().collect(),
                (None, false) => catalog.active(),
            };
            for item in &items {
                writeln!(out, "{}", catalog_line(item))?;
            }
            writeln!(out, "{} item(s)", items.len())?;
        }
        CatalogCommand::Add {
            description,
            unit,
            price,
            category,
        } => {
            let new = NewCatalogItem::new(description, unit, price, parse_category(&category)?);
            let item = catalog.add(new).await.map_err(|e| rejected("catalog item", e))?;
            writeln!(out, "{}", catalog_line(&item))?;
        }
        CatalogCommand::Update {
            id,
            description,
            unit,
            price,
            category,
        } => {
            let patch = CatalogItemPatch {
                description,
                unit,
                unit_price: price,
                category: category.as_deref().map(parse_category).transpose()?,
                is_active: None,
            };
            if !catalog
                .update(&id, patch)
                .await
                .map_err(|e| rejected("catalog item", e))?
            {
                bail!("No catalog item with id {id}");
            }
            print_catalog_item(catalog.get(&id), out)?;
        }
        CatalogCommand::Delete { id } => {
            if !catalog.delete(&id).await? {
                bail!("No catalog item with id {id}");
            }
            writeln!(out, "Deleted catalog item {id}")?;
        }
        CatalogCommand::Toggle { id } => {
            let active = catalog
                .toggle_active(&id)
                .await
                .with_context(|| format!("No catalog item with id {id}"))?;
            let state = if active { "active" } else { "inactive" };
            writeln!(out, "Catalog item {id} is now {state}")?;
        }
        CatalogCommand::Import { file } => {
            let reader =
                File::open(&file).with_context(|| format!("Failed to open: {}", file.display()))?;
            let records = CatalogLoader::parse(reader)
                .with_context(|| format!("Failed to parse CSV: {}", file.display()))?;
            let summary = CatalogLoader::load(catalog, &records)
                .await
                .context("Failed to load catalog items")?;
            writeln!(
                out,
                "Added {} and updated {} item(s)",
                summary.added, summary.updated
            )?;
        }
    }
    Ok(())
}

fn parse_category(label: &str) -> Result<Category> {
    Category::parse(label).with_context(|| {
        let labels: Vec<_> = Category::all().iter().map(Category::as_str).collect();
        format!("Invalid category: {label}. Use one of: {}", labels.join(", "))
    })
}

fn catalog_line(item: &CatalogItem) -> String {
    let mut flags = Vec::new();
    if item.is_default {
        flags.push("default");
    }
    if !item.is_active {
        flags.push("inactive");
    }
    format!(
        "{:>4}  {:<36} {:<12} {:>10}  {:<15} {}",
        item.id,
        item.description,
        item.unit,
        item.unit_price,
        item.category.as_str(),
        flags.join(",")
    )
}

fn print_catalog_item(
    item: Option<&CatalogItem>,
    out: &mut impl Write,
) -> Result<()> {
    if let Some(item) = item {
        writeln!(out, "{}", catalog_line(item))?;
    }
    Ok(())
}
