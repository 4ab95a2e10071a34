use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::Totals;
use crate::document::{FinancialDocument, PatchOutcome, number_items};
use crate::lifecycle::Lifecycle;
use crate::models::{LineItem, NewLineItem, QuotationStatus};
use crate::validation::{self, ValidationErrors};

/// Days a quotation stays valid when the draft names no date.
pub const DEFAULT_VALIDITY_DAYS: i64 = 30;

pub fn default_terms() -> Vec<String> {
    [
        "Prices valid for 30 days",
        "Payment terms: 30 days from invoice date",
        "All materials comply with Singapore standards",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: String,
    pub quotation_number: String,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tender_id: Option<String>,
    pub title: String,
    pub description: String,
    pub status: QuotationStatus,
    pub valid_until: NaiveDate,
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
    pub sent_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Quotation {
    /// Still out with the client after its validity date.
    pub fn is_overdue(
        &self,
        today: NaiveDate,
    ) -> bool {
        self.status == QuotationStatus::Sent && self.valid_until < today
    }
}

/// For creating new quotations (no id, number, totals or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuotation {
    pub client_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub tender_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to 30 days after creation.
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
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

impl NewQuotation {
    pub fn new(
        client_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        items: Vec<NewLineItem>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            project_id: None,
            tender_id: None,
            title: title.into(),
            description: description.into(),
            valid_until: None,
            items,
            discount: Decimal::ZERO,
            terms: default_terms(),
            prepared_by: String::new(),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuotationPatch {
    pub client_id: Option<String>,
    pub project_id: Option<String>,
    pub tender_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<QuotationStatus>,
    pub valid_until: Option<NaiveDate>,
    /// Replaces every row; rows are renumbered from 1.
    pub items: Option<Vec<NewLineItem>>,
    pub discount: Option<Decimal>,
    pub terms: Option<Vec<String>>,
    pub prepared_by: Option<String>,
    pub approved_by: Option<String>,
    pub notes: Option<String>,
}

impl FinancialDocument for Quotation {
    type Status = QuotationStatus;
    type Draft = NewQuotation;
    type Patch = QuotationPatch;

    const KIND: &'static str = "quotation";
    const STORAGE_KEY: &'static str = "ampere_quotations";

    fn create(
        draft: NewQuotation,
        id: String,
        number: String,
        now: DateTime<Utc>,
    ) -> Self {
        let valid_until = draft
            .valid_until
            .unwrap_or_else(|| now.date_naive() + Duration::days(DEFAULT_VALIDITY_DAYS));

        Self {
            id,
            quotation_number: number,
            client_id: draft.client_id,
            project_id: draft.project_id,
            tender_id: draft.tender_id,
            title: draft.title,
            description: draft.description,
            status: QuotationStatus::INITIAL,
            valid_until,
            items: number_items(draft.items),
            subtotal: Decimal::ZERO,
            gst: Decimal::ZERO,
            discount: draft.discount,
            total_amount: Decimal::ZERO,
            terms: draft.terms,
            prepared_by: draft.prepared_by,
            approved_by: None,
            sent_date: None,
            created_at: now,
            updated_at: now,
            notes: draft.notes,
        }
    }

    fn apply_patch(
        &mut self,
        patch: QuotationPatch,
    ) -> PatchOutcome<QuotationStatus> {
        if let Some(client_id) = patch.client_id {
            self.client_id = client_id;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = Some(project_id);
        }
        if let Some(tender_id) = patch.tender_id {
            self.tender_id = Some(tender_id);
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        let deadline_changed = match patch.valid_until {
            Some(valid_until) if valid_until != self.valid_until => {
                self.valid_until = valid_until;
                true
            }
            _ => false,
        };
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
        if let Some(approved_by) = &patch.approved_by {
            self.approved_by = Some(approved_by.clone());
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

    fn validate(
        &self,
        today: Option<NaiveDate>,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validation::require_text(&mut errors, "title", &self.title, "Quotation title is required");
        validation::require_text(
            &mut errors,
            "clientId",
            &self.client_id,
            "Client selection is required",
        );
        validation::require_text(
            &mut errors,
            "description",
            &self.description,
            "Description is required",
        );
        if let Some(today) = today {
            validation::check_not_past(
                &mut errors,
                "validUntil",
                self.valid_until,
                today,
                "Valid until date must be in the future",
            );
        }
        validation::check_discount(&mut errors, self.discount);
        validation::check_items(&mut errors, &self.items);

        errors.into_result()
    }

    fn enter_status(
        &mut self,
        status: QuotationStatus,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) {
        if status.is_sent() && self.sent_date.is_none() {
            self.sent_date = Some(now);
        }
        if status == QuotationStatus::Sent
            && self.status == QuotationStatus::PendingApproval
            && self.approved_by.is_none()
        {
            self.approved_by = actor.map(String::from);
        }
        self.status = status;
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn number(&self) -> &str {
        &self.quotation_number
    }

    fn status(&self) -> QuotationStatus {
        self.status
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn party_id(&self) -> &str {
        &self.client_id
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

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::Category;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
    }

    fn draft() -> NewQuotation {
        NewQuotation::new(
            "1",
            "Office Electrical Upgrade",
            "Replace distribution board and rewire level 2",
            vec![NewLineItem::new(
                "Distribution Board",
                dec!(1),
                "set",
                dec!(2800),
                Category::Materials,
            )],
        )
    }

    fn created() -> Quotation {
        Quotation::create(draft(), "1".into(), "AMP-202401-001".into(), now())
    }

    // ============================================================
    // create
    // ============================================================

    #[test]
    fn create_fills_defaults() {
        let quotation = created();

        assert_eq!(quotation.status, QuotationStatus::Draft);
        assert_eq!(quotation.valid_until, NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        assert_eq!(quotation.terms.len(), 3);
        assert_eq!(quotation.items[0].id, "1");
        assert_eq!(quotation.created_at, quotation.updated_at);
        assert_eq!(quotation.sent_date, None);
    }

    #[test]
    fn create_keeps_explicit_validity() {
        let mut draft = draft();
        draft.valid_until = NaiveDate::from_ymd_opt(2024, 3, 31);

        let quotation = Quotation::create(draft, "1".into(), "AMP-202401-001".into(), now());

        assert_eq!(quotation.valid_until, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn draft_without_terms_gets_standard_terms() {
        let json = r#"{
            "clientId": "3",
            "title": "Lighting",
            "items": [{ "description": "LED panel", "quantity": 10, "unitPrice": 42 }]
        }"#;

        let draft: NewQuotation = serde_json::from_str(json).unwrap();

        assert_eq!(draft.terms, default_terms());
        assert_eq!(draft.valid_until, None);
    }

    // ============================================================
    // validate
    // ============================================================

    #[test]
    fn validate_reports_form_fields() {
        let mut quotation = created();
        quotation.title = "  ".into();
        quotation.client_id = String::new();
        quotation.description = String::new();
        quotation.discount = dec!(-5);

        let errors = quotation.validate(None).unwrap_err();

        assert_eq!(errors.message("title"), Some("Quotation title is required"));
        assert_eq!(errors.message("clientId"), Some("Client selection is required"));
        assert_eq!(errors.message("description"), Some("Description is required"));
        assert_eq!(errors.message("discount"), Some("Discount cannot be negative"));
    }

    #[test]
    fn validate_checks_validity_only_when_asked() {
        let quotation = created();
        let later = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        assert!(quotation.validate(None).is_ok());
        assert_eq!(
            quotation.validate(Some(later)).unwrap_err().message("validUntil"),
            Some("Valid until date must be in the future")
        );
    }

    // ============================================================
    // patch / status
    // ============================================================

    #[test]
    fn patch_overwrites_present_fields_only() {
        let mut quotation = created();

        let outcome = quotation.apply_patch(QuotationPatch {
            title: Some("Level 2 rewiring".into()),
            discount: Some(dec!(100)),
            status: Some(QuotationStatus::Sent),
            ..QuotationPatch::default()
        });

        assert_eq!(quotation.title, "Level 2 rewiring");
        assert_eq!(quotation.discount, dec!(100));
        assert_eq!(quotation.client_id, "1");
        assert_eq!(quotation.status, QuotationStatus::Draft);
        assert_eq!(outcome.status, Some(QuotationStatus::Sent));
        assert!(!outcome.deadline_changed);
    }

    #[test]
    fn patch_reports_moved_deadline() {
        let mut quotation = created();
        let same = quotation.valid_until;

        let unchanged = quotation.apply_patch(QuotationPatch {
            valid_until: Some(same),
            ..QuotationPatch::default()
        });
        let moved = quotation.apply_patch(QuotationPatch {
            valid_until: same.succ_opt(),
            ..QuotationPatch::default()
        });

        assert!(!unchanged.deadline_changed);
        assert!(moved.deadline_changed);
    }

    #[test]
    fn entering_sent_stamps_once() {
        let mut quotation = created();
        let first = now();
        let second = first + Duration::days(2);

        quotation.enter_status(QuotationStatus::Sent, None, first);
        quotation.enter_status(QuotationStatus::Accepted, None, second);
        quotation.enter_status(QuotationStatus::Sent, None, second);

        assert_eq!(quotation.sent_date, Some(first));
    }

    #[test]
    fn approval_records_the_approver() {
        let mut quotation = created();
        quotation.enter_status(QuotationStatus::PendingApproval, None, now());

        quotation.enter_status(QuotationStatus::Sent, Some("manager-2"), now());

        assert_eq!(quotation.approved_by.as_deref(), Some("manager-2"));
    }

    #[test]
    fn overdue_only_while_sent() {
        let mut quotation = created();
        let after = quotation.valid_until.succ_opt().unwrap();

        assert!(!quotation.is_overdue(after));

        quotation.enter_status(QuotationStatus::Sent, None, now());
        assert!(quotation.is_overdue(after));
        assert!(!quotation.is_overdue(quotation.valid_until));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = serde_json::to_value(created()).unwrap();

        assert_eq!(value["quotationNumber"], "AMP-202401-001");
        assert_eq!(value["validUntil"], "2024-02-14");
        assert_eq!(value["status"], "draft");
        assert!(value.get("sentDate").is_none());
    }
}
