//! The shape shared by quotations and purchase orders.
//!
//! [`crate::store::DocumentStore`] is generic over this trait: numbering,
//! totals, lifecycle enforcement and persistence are written once and the
//! document types only describe their own fields and validation rules.

use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::calculations::Totals;
use crate::lifecycle::Lifecycle;
use crate::models::LineItem;
use crate::validation::ValidationErrors;

/// What a patch asked for beyond plain field overwrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome<S> {
    /// Requested status; applied by the store after checking the lifecycle.
    pub status: Option<S>,
    /// The patch moved the deadline, so it has to be re-checked against today.
    pub deadline_changed: bool,
    /// Who the patch names as approver; passed to `enter_status` like the
    /// actor of a transition.
    pub actor: Option<String>,
}

pub trait FinancialDocument:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Status: Lifecycle;
    type Draft: Send;
    type Patch: Send;

    /// Human name used in log lines.
    const KIND: &'static str;
    /// Snapshot key of the whole collection.
    const STORAGE_KEY: &'static str;

    /// Build a new document in its initial state. Totals are filled in by
    /// the store.
    fn create(
        draft: Self::Draft,
        id: String,
        number: String,
        now: DateTime<Utc>,
    ) -> Self;

    /// Overwrite every field present in `patch` except the status.
    fn apply_patch(
        &mut self,
        patch: Self::Patch,
    ) -> PatchOutcome<Self::Status>;

    /// Content rules; the deadline is also checked against `today` when given.
    fn validate(
        &self,
        today: Option<NaiveDate>,
    ) -> Result<(), ValidationErrors>;

    /// Move to `status` and stamp whatever dates that state implies.
    /// The caller has already checked the transition.
    fn enter_status(
        &mut self,
        status: Self::Status,
        actor: Option<&str>,
        now: DateTime<Utc>,
    );

    fn id(&self) -> &str;
    fn number(&self) -> &str;
    fn status(&self) -> Self::Status;
    fn title(&self) -> &str;
    fn description(&self) -> &str;
    /// Client for quotations, vendor for purchase orders.
    fn party_id(&self) -> &str;
    fn project_id(&self) -> Option<&str>;

    fn items(&self) -> &[LineItem];
    fn items_mut(&mut self) -> &mut Vec<LineItem>;
    fn discount(&self) -> Decimal;
    fn totals(&self) -> Totals;
    fn set_totals(
        &mut self,
        totals: Totals,
    );

    fn sent_date(&self) -> Option<DateTime<Utc>>;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
    fn touch(
        &mut self,
        now: DateTime<Utc>,
    );
}

/// Next free item id inside one document.
pub(crate) fn next_item_id(items: &[LineItem]) -> String {
    next_numeric_id(items.iter().map(|item| item.id.as_str()))
}

/// `max(numeric ids) + 1`; non-numeric ids are ignored.
pub(crate) fn next_numeric_id<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    let max = ids.filter_map(|id| id.parse::<u64>().ok()).max().unwrap_or(0);
    (max + 1).to_string()
}

/// Give freshly entered rows sequential ids starting at 1.
pub(crate) fn number_items(items: Vec<crate::models::NewLineItem>) -> Vec<LineItem> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, new)| LineItem::from_new((index + 1).to_string(), new))
        .collect()
}
