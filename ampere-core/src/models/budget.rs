use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Budget a project sets aside for one vendor, and how much of it
/// purchase orders have consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVendorBudget {
    pub project_id: String,
    pub vendor_id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub contract_value: Decimal,
    pub budget_allocated: Decimal,
    #[serde(default)]
    pub budget_used: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl ProjectVendorBudget {
    pub fn new(
        project_id: impl Into<String>,
        vendor_id: impl Into<String>,
        budget_allocated: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            vendor_id: vendor_id.into(),
            role: String::new(),
            contract_value: Decimal::ZERO,
            budget_allocated,
            budget_used: Decimal::ZERO,
            updated_at: now,
        }
    }

    /// Allocated minus used; negative when the vendor is over budget.
    pub fn remaining(&self) -> Decimal {
        self.budget_allocated.saturating_sub(self.budget_used)
    }

    pub fn matches(
        &self,
        project_id: &str,
        vendor_id: &str,
    ) -> bool {
        self.project_id == project_id && self.vendor_id == vendor_id
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn remaining_may_go_negative() {
        let mut budget = ProjectVendorBudget::new("p-1", "v-1", dec!(1000), Utc::now());
        budget.budget_used = dec!(1250.50);

        assert_eq!(budget.remaining(), dec!(-250.50));
    }

    #[test]
    fn missing_usage_reads_as_zero() {
        let json = r#"{
            "projectId": "p-1",
            "vendorId": "v-2",
            "budgetAllocated": "5000",
            "updatedAt": "2024-01-01T00:00:00Z"
        }"#;

        let budget: ProjectVendorBudget = serde_json::from_str(json).unwrap();

        assert_eq!(budget.budget_used, Decimal::ZERO);
        assert!(budget.matches("p-1", "v-2"));
    }
}
