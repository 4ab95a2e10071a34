use std::sync::Arc;

use crate::calculations::TotalsCalculator;
use crate::clock::Clock;
use crate::db::SnapshotStorage;
use crate::document::{FinancialDocument, next_item_id, next_numeric_id};
use crate::lifecycle::Lifecycle;
use crate::models::{LineItem, LineItemPatch, NewLineItem, Quotation, QuotationStatus};
use crate::store::error::StoreError;
use crate::store::filter::DocumentFilter;
use crate::store::numbering::DocumentNumbering;
use crate::store::snapshot;
use crate::validation::ValidationErrors;

/// In-memory collection of one document kind, persisted as a whole after
/// every successful mutation.
///
/// Lookups that miss return `Ok(false)` / `Ok(None)`; errors are reserved
/// for rejected content and illegal status changes.
pub struct DocumentStore<D: FinancialDocument> {
    storage: Arc<dyn SnapshotStorage>,
    calculator: TotalsCalculator,
    numbering: DocumentNumbering,
    clock: Arc<dyn Clock>,
    documents: Vec<D>,
}

impl<D: FinancialDocument> DocumentStore<D> {
    /// Read the collection once. Unreadable or malformed snapshots open an
    /// empty store.
    pub async fn open(
        storage: Arc<dyn SnapshotStorage>,
        calculator: TotalsCalculator,
        numbering: DocumentNumbering,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let documents = snapshot::load(storage.as_ref(), D::STORAGE_KEY).await.into_vec();
        tracing::info!(kind = D::KIND, count = documents.len(), "document store opened");

        Self {
            storage,
            calculator,
            numbering,
            clock,
            documents,
        }
    }

    // ── reads ────────────────────────────────────────────────────────────

    pub fn get(
        &self,
        id: &str,
    ) -> Option<&D> {
        self.documents.iter().find(|d| d.id() == id)
    }

    pub fn find_by_number(
        &self,
        number: &str,
    ) -> Option<&D> {
        self.documents.iter().find(|d| d.number() == number)
    }

    pub fn list(
        &self,
        filter: &DocumentFilter<D::Status>,
    ) -> Vec<&D> {
        self.documents.iter().filter(|d| filter.matches(*d)).collect()
    }

    pub fn all(&self) -> &[D] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn calculator(&self) -> &TotalsCalculator {
        &self.calculator
    }

    /// Number the next `add` will assign, given the current clock.
    pub fn next_document_number(&self) -> String {
        self.numbering
            .next(self.documents.iter().map(|d| d.number()), self.clock.now())
    }

    // ── mutations ────────────────────────────────────────────────────────

    /// Validate, number, price and store a new document.
    ///
    /// # Errors
    /// [`StoreError::Validation`] when the draft breaks a content rule or
    /// its deadline is already past; nothing is stored.
    pub async fn add(
        &mut self,
        draft: D::Draft,
    ) -> Result<D, StoreError> {
        let now = self.clock.now();
        let id = next_numeric_id(self.documents.iter().map(|d| d.id()));
        let number = self.next_document_number();

        let mut document = D::create(draft, id, number, now);
        if let Err(errors) = document.validate(Some(now.date_naive())) {
            tracing::debug!(kind = D::KIND, %errors, "rejected new document");
            return Err(errors.into());
        }
        self.recalculate(&mut document)?;

        tracing::info!(
            kind = D::KIND,
            id = document.id(),
            number = document.number(),
            total = %document.totals().total_amount,
            "document created"
        );
        self.documents.push(document.clone());
        self.persist().await;
        Ok(document)
    }

    /// Merge `patch` into the document. A requested status must be a legal
    /// transition and is entered with the patch's approver as actor; the
    /// deadline is re-checked only when the patch moves it.
    ///
    /// Returns `Ok(false)` when `id` is unknown.
    pub async fn update(
        &mut self,
        id: &str,
        patch: D::Patch,
    ) -> Result<bool, StoreError> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        let now = self.clock.now();
        let mut document = self.documents[index].clone();

        let outcome = document.apply_patch(patch);
        if let Some(to) = outcome.status {
            self.check_transition(&document, to)?;
        }
        document.validate(outcome.deadline_changed.then(|| now.date_naive()))?;

        if let Some(to) = outcome.status.filter(|to| *to != document.status()) {
            document.enter_status(to, outcome.actor.as_deref(), now);
        }
        self.recalculate(&mut document)?;
        document.touch(now);

        tracing::info!(kind = D::KIND, id, number = document.number(), "document updated");
        self.documents[index] = document;
        self.persist().await;
        Ok(true)
    }

    /// Move the document to `to`. Moving to the current status succeeds
    /// without touching anything.
    ///
    /// Returns `Ok(false)` when `id` is unknown.
    pub async fn transition(
        &mut self,
        id: &str,
        to: D::Status,
        actor: Option<&str>,
    ) -> Result<bool, StoreError> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        let from = self.documents[index].status();
        if from == to {
            return Ok(true);
        }
        self.check_transition(&self.documents[index], to)?;

        let now = self.clock.now();
        let document = &mut self.documents[index];
        document.enter_status(to, actor, now);
        document.touch(now);
        tracing::info!(kind = D::KIND, id, %from, %to, "status changed");

        self.persist().await;
        Ok(true)
    }

    /// Returns whether anything was removed.
    pub async fn delete(
        &mut self,
        id: &str,
    ) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let removed = self.documents.remove(index);
        tracing::info!(kind = D::KIND, id, number = removed.number(), "document deleted");
        self.persist().await;
        true
    }

    /// Append a row. Returns `Ok(None)` when the document is unknown.
    pub async fn add_item(
        &mut self,
        id: &str,
        new: NewLineItem,
    ) -> Result<Option<LineItem>, StoreError> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };
        let mut document = self.documents[index].clone();
        let item = LineItem::from_new(next_item_id(document.items()), new);
        document.items_mut().push(item.clone());

        self.commit_items(index, document).await?;
        Ok(Some(item))
    }

    /// Returns `Ok(false)` when the document or the item is unknown.
    pub async fn update_item(
        &mut self,
        id: &str,
        item_id: &str,
        patch: LineItemPatch,
    ) -> Result<bool, StoreError> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        let mut document = self.documents[index].clone();
        let Some(item) = document.items_mut().iter_mut().find(|i| i.id == item_id) else {
            return Ok(false);
        };
        item.apply(patch);

        self.commit_items(index, document).await?;
        Ok(true)
    }

    /// Returns `Ok(false)` when the document or the item is unknown.
    /// Removing the last row is rejected like an empty draft.
    pub async fn remove_item(
        &mut self,
        id: &str,
        item_id: &str,
    ) -> Result<bool, StoreError> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        let mut document = self.documents[index].clone();
        let before = document.items().len();
        document.items_mut().retain(|i| i.id != item_id);
        if document.items().len() == before {
            return Ok(false);
        }

        self.commit_items(index, document).await?;
        Ok(true)
    }

    /// Replace the in-memory collection with whatever storage holds now.
    pub async fn reload(&mut self) {
        self.documents = snapshot::load(self.storage.as_ref(), D::STORAGE_KEY).await.into_vec();
        tracing::debug!(kind = D::KIND, count = self.documents.len(), "document store reloaded");
    }

    // ── helpers ──────────────────────────────────────────────────────────

    fn position(
        &self,
        id: &str,
    ) -> Option<usize> {
        self.documents.iter().position(|d| d.id() == id)
    }

    fn check_transition(
        &self,
        document: &D,
        to: D::Status,
    ) -> Result<(), StoreError> {
        let from = document.status();
        if from == to || from.can_transition(to) {
            return Ok(());
        }
        tracing::warn!(kind = D::KIND, id = document.id(), %from, %to, "illegal status change");
        Err(StoreError::IllegalTransition {
            kind: D::KIND,
            number: document.number().to_string(),
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// A total too large to represent is rejected like any other bad field.
    fn recalculate(
        &self,
        document: &mut D,
    ) -> Result<(), StoreError> {
        let totals = self
            .calculator
            .calculate(document.items(), document.discount())
            .map_err(|overflow| {
                tracing::debug!(kind = D::KIND, id = document.id(), "total out of range");
                let mut errors = ValidationErrors::new();
                errors.push("items", format!("Total {overflow}"));
                errors
            })?;
        document.set_totals(totals);
        Ok(())
    }

    async fn commit_items(
        &mut self,
        index: usize,
        mut document: D,
    ) -> Result<(), StoreError> {
        document.validate(None)?;
        let now = self.clock.now();
        self.recalculate(&mut document)?;
        document.touch(now);

        tracing::info!(
            kind = D::KIND,
            id = document.id(),
            items = document.items().len(),
            total = %document.totals().total_amount,
            "items changed"
        );
        self.documents[index] = document;
        self.persist().await;
        Ok(())
    }

    async fn persist(&self) {
        snapshot::save(self.storage.as_ref(), D::STORAGE_KEY, &self.documents).await;
    }
}

impl DocumentStore<Quotation> {
    /// Sent quotations whose validity has lapsed as of today.
    pub fn overdue(&self) -> Vec<&Quotation> {
        let today = self.clock.today();
        self.documents.iter().filter(|q| q.is_overdue(today)).collect()
    }

    /// Move every overdue quotation to `expired` and persist once.
    /// Returns the ids that expired.
    pub async fn expire_overdue(&mut self) -> Vec<String> {
        let now = self.clock.now();
        let today = now.date_naive();
        let mut expired = Vec::new();

        for quotation in self.documents.iter_mut().filter(|q| q.is_overdue(today)) {
            quotation.enter_status(QuotationStatus::Expired, None, now);
            quotation.touch(now);
            expired.push(quotation.id.clone());
        }

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "expired overdue quotations");
            self.persist().await;
        }
        expired
    }
}
