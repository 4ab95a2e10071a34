use std::sync::Arc;

use rust_decimal::Decimal;

use crate::calculations::common::max;
use crate::clock::Clock;
use crate::db::SnapshotStorage;
use crate::models::ProjectVendorBudget;
use crate::store::snapshot;

pub const BUDGETS_KEY: &str = "ampere_project_vendor_budgets";

/// Per project/vendor budgets and their consumption by purchase orders.
pub struct BudgetLedger {
    storage: Arc<dyn SnapshotStorage>,
    clock: Arc<dyn Clock>,
    entries: Vec<ProjectVendorBudget>,
}

impl BudgetLedger {
    pub async fn open(
        storage: Arc<dyn SnapshotStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let entries = snapshot::load(storage.as_ref(), BUDGETS_KEY).await.into_vec();
        Self {
            storage,
            clock,
            entries,
        }
    }

    pub fn get(
        &self,
        project_id: &str,
        vendor_id: &str,
    ) -> Option<&ProjectVendorBudget> {
        self.entries.iter().find(|e| e.matches(project_id, vendor_id))
    }

    pub fn list_for_project(
        &self,
        project_id: &str,
    ) -> Vec<&ProjectVendorBudget> {
        self.entries.iter().filter(|e| e.project_id == project_id).collect()
    }

    pub fn all(&self) -> &[ProjectVendorBudget] {
        &self.entries
    }

    pub fn remaining(
        &self,
        project_id: &str,
        vendor_id: &str,
    ) -> Option<Decimal> {
        self.get(project_id, vendor_id).map(ProjectVendorBudget::remaining)
    }

    /// Add the pair, or replace the existing entry for it.
    pub async fn assign(
        &mut self,
        mut entry: ProjectVendorBudget,
    ) {
        entry.updated_at = self.clock.now();
        match self
            .entries
            .iter_mut()
            .find(|e| e.matches(&entry.project_id, &entry.vendor_id))
        {
            Some(existing) => *existing = entry.clone(),
            None => self.entries.push(entry.clone()),
        }
        tracing::info!(
            project = %entry.project_id,
            vendor = %entry.vendor_id,
            allocated = %entry.budget_allocated,
            "budget assigned"
        );
        self.persist().await;
    }

    pub async fn remove(
        &mut self,
        project_id: &str,
        vendor_id: &str,
    ) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| !e.matches(project_id, vendor_id));
        if self.entries.len() == before {
            return false;
        }
        tracing::info!(project = project_id, vendor = vendor_id, "budget removed");
        self.persist().await;
        true
    }

    /// `budget_used = max(0, budget_used + delta)`. Returns false when the
    /// pair has no budget.
    pub async fn apply_usage(
        &mut self,
        project_id: &str,
        vendor_id: &str,
        delta: Decimal,
    ) -> bool {
        let now = self.clock.now();
        let Some(entry) = self.entries.iter_mut().find(|e| e.matches(project_id, vendor_id)) else {
            tracing::debug!(project = project_id, vendor = vendor_id, "no budget to charge");
            return false;
        };
        entry.budget_used = max(Decimal::ZERO, entry.budget_used.saturating_add(delta));
        entry.updated_at = now;
        tracing::info!(
            project = project_id,
            vendor = vendor_id,
            %delta,
            used = %entry.budget_used,
            "budget usage updated"
        );
        self.persist().await;
        true
    }

    pub async fn reload(&mut self) {
        self.entries = snapshot::load(self.storage.as_ref(), BUDGETS_KEY).await.into_vec();
    }

    async fn persist(&self) {
        snapshot::save(self.storage.as_ref(), BUDGETS_KEY, &self.entries).await;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::clock::FixedClock;
    use crate::db::MemoryStorage;

    async fn ledger() -> (BudgetLedger, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(FixedClock::on(2024, 1, 15));
        let mut ledger = BudgetLedger::open(storage.clone(), clock.clone()).await;
        ledger
            .assign(ProjectVendorBudget::new("p-1", "v-1", dec!(10000), clock.now()))
            .await;
        (ledger, storage)
    }

    #[tokio::test]
    async fn usage_accumulates_and_clamps_at_zero() {
        let (mut ledger, _) = ledger().await;

        assert!(ledger.apply_usage("p-1", "v-1", dec!(2500)).await);
        assert_eq!(ledger.remaining("p-1", "v-1"), Some(dec!(7500)));

        assert!(ledger.apply_usage("p-1", "v-1", dec!(-4000)).await);
        assert_eq!(ledger.get("p-1", "v-1").unwrap().budget_used, Decimal::ZERO);
    }

    #[tokio::test]
    async fn unknown_pair_is_not_charged() {
        let (mut ledger, storage) = ledger().await;
        let saves = storage.save_count();

        assert!(!ledger.apply_usage("p-1", "v-404", dec!(10)).await);
        assert_eq!(storage.save_count(), saves);
    }

    #[tokio::test]
    async fn assign_replaces_existing_pair() {
        let (mut ledger, _) = ledger().await;
        let mut bigger = ProjectVendorBudget::new("p-1", "v-1", dec!(15000), ledger.clock.now());
        bigger.role = "Main electrical contractor".into();

        ledger.assign(bigger).await;

        assert_eq!(ledger.all().len(), 1);
        assert_eq!(ledger.remaining("p-1", "v-1"), Some(dec!(15000)));
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let (mut ledger, storage) = ledger().await;
        ledger.apply_usage("p-1", "v-1", dec!(120.50)).await;

        let reopened = BudgetLedger::open(storage, Arc::new(FixedClock::on(2024, 1, 16))).await;

        assert_eq!(reopened.list_for_project("p-1").len(), 1);
        assert_eq!(reopened.get("p-1", "v-1").unwrap().budget_used, dec!(120.50));
    }

    #[tokio::test]
    async fn remove_reports_whether_it_removed() {
        let (mut ledger, _) = ledger().await;

        assert!(ledger.remove("p-1", "v-1").await);
        assert!(!ledger.remove("p-1", "v-1").await);
    }
}
