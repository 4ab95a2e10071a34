use chrono::NaiveDate;

use crate::document::FinancialDocument;

/// Criteria for [`DocumentStore::list`](crate::store::DocumentStore::list).
/// Every field is optional; an empty filter matches everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFilter<S> {
    pub status: Option<S>,
    /// Client for quotations, vendor for purchase orders.
    pub party_id: Option<String>,
    pub project_id: Option<String>,
    /// Inclusive bounds on the creation day.
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    /// Case-insensitive substring of title, description or number.
    pub text: Option<String>,
}

// Manual impl: a derive would require `S: Default`.
impl<S> Default for DocumentFilter<S> {
    fn default() -> Self {
        Self {
            status: None,
            party_id: None,
            project_id: None,
            created_from: None,
            created_to: None,
            text: None,
        }
    }
}

impl<S> DocumentFilter<S> {
    pub fn with_status(status: S) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matching(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

impl<S: PartialEq> DocumentFilter<S> {
    pub fn matches<D>(
        &self,
        document: &D,
    ) -> bool
    where
        D: FinancialDocument<Status = S>,
    {
        if self.status.as_ref().is_some_and(|status| *status != document.status()) {
            return false;
        }
        if self.party_id.as_deref().is_some_and(|party| party != document.party_id()) {
            return false;
        }
        if self
            .project_id
            .as_deref()
            .is_some_and(|project| Some(project) != document.project_id())
        {
            return false;
        }

        let created = document.created_at().date_naive();
        if self.created_from.is_some_and(|from| created < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| created > to) {
            return false;
        }

        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let needle = text.to_lowercase();
                [document.title(), document.description(), document.number()]
                    .iter()
                    .any(|haystack| haystack.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}
