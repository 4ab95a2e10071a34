use rust_decimal::Decimal;

use crate::calculations::common::max;
use crate::models::{
    LineItem, LineItemPatch, NewLineItem, NewPurchaseOrder, PurchaseOrder, PurchaseOrderPatch,
    PurchaseOrderStatus,
};
use crate::store::budget::BudgetLedger;
use crate::store::documents::DocumentStore;
use crate::store::error::StoreError;

/// Where a purchase order's total is charged, and how much.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Charge {
    project_id: String,
    vendor_id: String,
    amount: Decimal,
}

impl Charge {
    /// Negative totals charge nothing; orders without a project charge nobody.
    fn of(po: &PurchaseOrder) -> Option<Self> {
        let project_id = po.project_id.clone().filter(|p| !p.is_empty())?;
        if po.vendor_id.is_empty() {
            return None;
        }
        Some(Self {
            project_id,
            vendor_id: po.vendor_id.clone(),
            amount: max(Decimal::ZERO, po.total_amount),
        })
    }
}

/// Purchase orders plus the budget ledger they draw on.
///
/// After every mutation the ledger receives the change in the order's
/// total for its project/vendor pair.
pub struct PurchaseOrderBook {
    orders: DocumentStore<PurchaseOrder>,
    ledger: BudgetLedger,
}

impl PurchaseOrderBook {
    pub fn new(
        orders: DocumentStore<PurchaseOrder>,
        ledger: BudgetLedger,
    ) -> Self {
        Self { orders, ledger }
    }

    pub fn orders(&self) -> &DocumentStore<PurchaseOrder> {
        &self.orders
    }

    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut BudgetLedger {
        &mut self.ledger
    }

    pub async fn add(
        &mut self,
        draft: NewPurchaseOrder,
    ) -> Result<PurchaseOrder, StoreError> {
        let po = self.orders.add(draft).await?;
        self.settle(None, Charge::of(&po)).await;
        Ok(po)
    }

    pub async fn update(
        &mut self,
        id: &str,
        patch: PurchaseOrderPatch,
    ) -> Result<bool, StoreError> {
        let before = self.charge(id);
        let updated = self.orders.update(id, patch).await?;
        if updated {
            let after = self.charge(id);
            self.settle(before, after).await;
        }
        Ok(updated)
    }

    /// Status changes leave the budget alone, cancellation included.
    pub async fn transition(
        &mut self,
        id: &str,
        to: PurchaseOrderStatus,
        actor: Option<&str>,
    ) -> Result<bool, StoreError> {
        self.orders.transition(id, to, actor).await
    }

    pub async fn delete(
        &mut self,
        id: &str,
    ) -> bool {
        let before = self.charge(id);
        let deleted = self.orders.delete(id).await;
        if deleted {
            self.settle(before, None).await;
        }
        deleted
    }

    pub async fn add_item(
        &mut self,
        id: &str,
        new: NewLineItem,
    ) -> Result<Option<LineItem>, StoreError> {
        let before = self.charge(id);
        let item = self.orders.add_item(id, new).await?;
        if item.is_some() {
            let after = self.charge(id);
            self.settle(before, after).await;
        }
        Ok(item)
    }

    pub async fn update_item(
        &mut self,
        id: &str,
        item_id: &str,
        patch: LineItemPatch,
    ) -> Result<bool, StoreError> {
        let before = self.charge(id);
        let updated = self.orders.update_item(id, item_id, patch).await?;
        if updated {
            let after = self.charge(id);
            self.settle(before, after).await;
        }
        Ok(updated)
    }

    pub async fn remove_item(
        &mut self,
        id: &str,
        item_id: &str,
    ) -> Result<bool, StoreError> {
        let before = self.charge(id);
        let removed = self.orders.remove_item(id, item_id).await?;
        if removed {
            let after = self.charge(id);
            self.settle(before, after).await;
        }
        Ok(removed)
    }

    pub async fn reload(&mut self) {
        self.orders.reload().await;
        self.ledger.reload().await;
    }

    fn charge(
        &self,
        id: &str,
    ) -> Option<Charge> {
        self.orders.get(id).and_then(Charge::of)
    }

    /// Move the ledger from `before` to `after`. A change of project or
    /// vendor releases the old pair in full and charges the new one.
    async fn settle(
        &mut self,
        before: Option<Charge>,
        after: Option<Charge>,
    ) {
        match (before, after) {
            (Some(old), Some(new))
                if old.project_id == new.project_id && old.vendor_id == new.vendor_id =>
            {
                let delta = new.amount.saturating_sub(old.amount);
                if !delta.is_zero() {
                    self.ledger
                        .apply_usage(&new.project_id, &new.vendor_id, delta)
                        .await;
                }
            }
            (old, new) => {
                if let Some(old) = old.filter(|c| !c.amount.is_zero()) {
                    self.ledger
                        .apply_usage(&old.project_id, &old.vendor_id, -old.amount)
                        .await;
                }
                if let Some(new) = new.filter(|c| !c.amount.is_zero()) {
                    self.ledger
                        .apply_usage(&new.project_id, &new.vendor_id, new.amount)
                        .await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::document::FinancialDocument;
    use crate::models::Category;

    fn po(
        project: Option<&str>,
        total: Decimal,
    ) -> PurchaseOrder {
        let draft = NewPurchaseOrder {
            project_id: project.map(String::from),
            ..NewPurchaseOrder::new(
                "v-1",
                "Switchgear",
                vec![NewLineItem::new("MCCB", dec!(1), "pcs", dec!(10), Category::Materials)],
            )
        };
        let mut po =
            PurchaseOrder::create(draft, "1".into(), "AMP-PO-202401-001".into(), chrono::Utc::now());
        po.total_amount = total;
        po
    }

    #[test]
    fn charge_requires_a_project() {
        assert_eq!(Charge::of(&po(None, dec!(100))), None);
        assert_eq!(Charge::of(&po(Some(""), dec!(100))), None);
    }

    #[test]
    fn negative_totals_charge_nothing() {
        let charge = Charge::of(&po(Some("p-1"), dec!(-20))).unwrap();

        assert_eq!(charge.amount, Decimal::ZERO);
        assert_eq!(charge.vendor_id, "v-1");
    }
}
