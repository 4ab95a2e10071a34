use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::Totals;
use crate::document::{FinancialDocument, PatchOutcome, number_items};
use crate::lifecycle::Lifecycle;
use crate::models::{LineItem, NewLineItem, PurchaseOrderStatus};
use crate::validation::{self, ValidationErrors};

/// Days between issue and the default required date.
pub const DEFAULT_LEAD_DAYS: i64 = 30;

pub fn default_terms() -> Vec<String> {
    [
        "Payment terms: 30 days from invoice date",
        "Delivery within 30 days of order confirmation",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: String,
    pub po_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub vendor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: PurchaseOrderStatus,
    pub issue_date: NaiveDate,
    pub required_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<NaiveDate>,
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
    pub gst: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub total_amount: Decimal,
    #[serde(default)]
    pub terms: Vec<String>,
    #[serde(default)]
    pub prepared_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// For creating new purchase orders (no id, number, totals or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchaseOrder {
    #[serde(default)]
    pub project_id: Option<String>,
    pub vendor_id: String,
    #[serde(default)]
    pub client_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to the creation day.
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    /// Defaults to 30 days after the issue date.
    #[serde(default)]
    pub required_date: Option<NaiveDate>,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    pub items: Vec<NewLineItem>,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default = "default_terms")]
    pub terms: Vec<String>,
    #[serde(default)]
    pub prepared_by: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewPurchaseOrder {
    pub fn new(
        vendor_id: impl Into<String>,
        title: impl Into<String>,
        items: Vec<NewLineItem>,
    ) -> Self {
        Self {
            project_id: None,
            vendor_id: vendor_id.into(),
            client_id: None,
            title: title.into(),
            description: String::new(),
            issue_date: None,
            required_date: None,
            delivery_date: None,
            items,
            discount: Decimal::ZERO,
            terms: default_terms(),
            prepared_by: String::new(),
            notes: None,
        }
    }

    pub fn for_project(
        mut self,
        project_id: impl Into<String>,
    ) -> Self {
        self.project_id = Some(project_id.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PurchaseOrderPatch {
    pub project_id: Option<String>,
    pub vendor_id: Option<String>,
    pub client_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<PurchaseOrderStatus>,
    pub issue_date: Option<NaiveDate>,
    pub required_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    /// Replaces every row; rows are renumbered from 1.
    pub items: Option<Vec<NewLineItem>>,
    pub discount: Option<Decimal>,
    pub terms: Option<Vec<String>>,
    pub prepared_by: Option<String>,
    /// Recorded when the same patch moves the order to `approved`.
    pub approved_by: Option<String>,
    pub notes: Option<String>,
}

impl FinancialDocument for PurchaseOrder {
    type Status = PurchaseOrderStatus;
    type Draft = NewPurchaseOrder;
    type Patch = PurchaseOrderPatch;

    const KIND: &'static str = "purchase order";
    const STORAGE_KEY: &'static str = "ampere_purchase_orders";

    fn create(
        draft: NewPurchaseOrder,
        id: String,
        number: String,
        now: DateTime<Utc>,
    ) -> Self {
        let issue_date = draft.issue_date.unwrap_or_else(|| now.date_naive());
        let required_date = draft
            .required_date
            .unwrap_or_else(|| issue_date + Duration::days(DEFAULT_LEAD_DAYS));

        Self {
            id,
            po_number: number,
            project_id: draft.project_id,
            vendor_id: draft.vendor_id,
            client_id: draft.client_id,
            title: draft.title,
            description: draft.description,
            status: PurchaseOrderStatus::INITIAL,
            issue_date,
            required_date,
            delivery_date: draft.delivery_date,
            items: number_items(draft.items),
            subtotal: Decimal::ZERO,
            gst: Decimal::ZERO,
            discount: draft.discount,
            total_amount: Decimal::ZERO,
            terms: draft.terms,
            prepared_by: draft.prepared_by,
            approved_by: None,
            approved_date: None,
            sent_date: None,
            created_at: now,
            updated_at: now,
            notes: draft.notes,
        }
    }

    fn apply_patch(
        &mut self,
        patch: PurchaseOrderPatch,
    ) -> PatchOutcome<PurchaseOrderStatus> {
        if let Some(project_id) = patch.project_id {
            self.project_id = Some(project_id);
        }
        if let Some(vendor_id) = patch.vendor_id {
            self.vendor_id = vendor_id;
        }
        if let Some(client_id) = patch.client_id {
            self.client_id = Some(client_id);
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        let mut deadline_changed = false;
        if let Some(issue_date) = patch.issue_date {
            deadline_changed |= issue_date != self.issue_date;
            self.issue_date = issue_date;
        }
        if let Some(required_date) = patch.required_date {
            deadline_changed |= required_date != self.required_date;
            self.required_date = required_date;
        }
        if let Some(delivery_date) = patch.delivery_date {
            self.delivery_date = Some(delivery_date);
        }
        if let Some(items) = patch.items {
            self.items = number_items(items);
        }
        if let Some(discount) = patch.discount {
            self.discount = discount;
        }
        if let Some(terms) = patch.terms {
            self.terms = terms;
        }
        if let Some(prepared_by) = patch.prepared_by {
            self.prepared_by = prepared_by;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }

        PatchOutcome {
            status: patch.status,
            deadline_changed,
            actor: patch.approved_by,
        }
    }

    /// Dates are checked against the issue date, so `today` plays no part.
    fn validate(
        &self,
        _today: Option<NaiveDate>,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validation::require_text(
            &mut errors,
            "vendorId",
            &self.vendor_id,
            "Vendor selection is required",
        );
        validation::require_text(&mut errors, "title", &self.title, "Title is required");
        if self.required_date <= self.issue_date {
            errors.push("requiredDate", "Required date must be after issue date");
        }
        if self.delivery_date.is_some_and(|delivery| delivery < self.issue_date) {
            errors.push("deliveryDate", "Delivery date cannot be before issue date");
        }
        validation::check_discount(&mut errors, self.discount);
        validation::check_items(&mut errors, &self.items);

        errors.into_result()
    }

    fn enter_status(
        &mut self,
        status: PurchaseOrderStatus,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) {
        if status.is_sent() && self.sent_date.is_none() {
            self.sent_date = Some(now);
        }
        if status == PurchaseOrderStatus::Approved {
            if self.approved_date.is_none() {
                self.approved_date = Some(now);
            }
            if let Some(actor) = actor {
                self.approved_by = Some(actor.to_string());
            }
        }
        self.status = status;
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn number(&self) -> &str {
        &self.po_number
    }

    fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn party_id(&self) -> &str {
        &self.vendor_id
    }

    fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    fn items(&self) -> &[LineItem] {
        &self.items
    }

    fn items_mut(&mut self) -> &mut Vec<LineItem> {
        &mut self.items
    }

    fn discount(&self) -> Decimal {
        self.discount
    }

    fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            gst: self.gst,
            total_amount: self.total_amount,
        }
    }

    fn set_totals(
        &mut self,
        totals: Totals,
    ) {
        self.subtotal = totals.subtotal;
        self.gst = totals.gst;
        self.total_amount = totals.total_amount;
    }

    fn sent_date(&self) -> Option<DateTime<Utc>> {
        self.sent_date
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(
        &mut self,
        now: DateTime<Utc>,
    ) {
        self.updated_at = now;
    }
}
