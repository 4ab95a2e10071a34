use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

pub const QUOTATION_PREFIX: &str = "AMP";
pub const PURCHASE_ORDER_PREFIX: &str = "AMP-PO";

/// Prefixes for both document kinds, normally read from the `[numbering]`
/// config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberingConfig {
    pub quotation_prefix: String,
    pub purchase_order_prefix: String,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            quotation_prefix: QUOTATION_PREFIX.to_string(),
            purchase_order_prefix: PURCHASE_ORDER_PREFIX.to_string(),
        }
    }
}

impl NumberingConfig {
    pub fn quotations(&self) -> DocumentNumbering {
        DocumentNumbering::new(&self.quotation_prefix)
    }

    pub fn purchase_orders(&self) -> DocumentNumbering {
        DocumentNumbering::new(&self.purchase_order_prefix)
    }
}

/// Issues `{prefix}-{YYYYMM}-{NNN}` numbers.
///
/// `NNN` restarts every month and continues from the highest sequence
/// already used in that month, so gaps left by deleted documents are not
/// reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNumbering {
    prefix: String,
}

impl DocumentNumbering {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Next number for the month of `now`, given every number in use.
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use ampere_core::store::DocumentNumbering;
    ///
    /// let numbering = DocumentNumbering::new("AMP");
    /// let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();
    ///
    /// let next = numbering.next(["AMP-202401-001", "AMP-202401-004", "AMP-202312-009"], now);
    ///
    /// assert_eq!(next, "AMP-202401-005");
    /// ```
    pub fn next<'a>(
        &self,
        existing: impl IntoIterator<Item = &'a str>,
        now: DateTime<Utc>,
    ) -> String {
        let month = format!("{}-{:04}{:02}-", self.prefix, now.year(), now.month());
        let highest = existing
            .into_iter()
            .filter_map(|number| number.strip_prefix(month.as_str()))
            .filter_map(|sequence| sequence.parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        format!("{month}{:03}", u64::from(highest) + 1)
    }
}
