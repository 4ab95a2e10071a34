use serde::{Deserialize, Serialize};

use crate::lifecycle::Lifecycle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Draft,
    PendingApproval,
    Sent,
    Accepted,
    Rejected,
    Expired,
    Converted,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Converted => "converted",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::PendingApproval => "Pending Approval",
            Self::Sent => "Sent",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::Expired => "Expired",
            Self::Converted => "Converted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|status| status.as_str() == s)
    }
}

impl Lifecycle for QuotationStatus {
    const INITIAL: Self = Self::Draft;

    fn all() -> &'static [Self] {
        &[
            Self::Draft,
            Self::PendingApproval,
            Self::Sent,
            Self::Accepted,
            Self::Rejected,
            Self::Expired,
            Self::Converted,
        ]
    }

    fn allowed_targets(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::PendingApproval, Self::Sent],
            Self::PendingApproval => &[Self::Sent, Self::Draft],
            Self::Sent => &[Self::Accepted, Self::Rejected, Self::Expired, Self::Converted],
            Self::Accepted | Self::Rejected | Self::Expired | Self::Converted => &[],
        }
    }

    fn is_sent(self) -> bool {
        self == Self::Sent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Draft,
    PendingApproval,
    Approved,
    Sent,
    PartiallyReceived,
    Received,
    Closed,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Sent => "sent",
            Self::PartiallyReceived => "partially_received",
            Self::Received => "received",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::PendingApproval => "Pending Approval",
            Self::Approved => "Approved",
            Self::Sent => "Sent",
            Self::PartiallyReceived => "Partially Received",
            Self::Received => "Received",
            Self::Closed => "Closed",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|status| status.as_str() == s)
    }
}

impl Lifecycle for PurchaseOrderStatus {
    const INITIAL: Self = Self::Draft;

    fn all() -> &'static [Self] {
        &[
            Self::Draft,
            Self::PendingApproval,
            Self::Approved,
            Self::Sent,
            Self::PartiallyReceived,
            Self::Received,
            Self::Closed,
            Self::Cancelled,
        ]
    }

    fn allowed_targets(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::PendingApproval, Self::Approved, Self::Sent, Self::Cancelled],
            Self::PendingApproval => &[Self::Approved, Self::Draft, Self::Cancelled],
            Self::Approved => &[Self::Sent, Self::Cancelled],
            Self::Sent => &[Self::PartiallyReceived, Self::Received, Self::Cancelled],
            Self::PartiallyReceived => &[Self::Received],
            Self::Received => &[Self::Closed],
            Self::Closed | Self::Cancelled => &[],
        }
    }

    fn is_sent(self) -> bool {
        self == Self::Sent
    }
}

macro_rules! status_text {
    ($status:ty, $name:literal) => {
        impl std::fmt::Display for $status {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $status {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
                Self::parse(&wanted).ok_or_else(|| {
                    let names: Vec<_> = <Self as Lifecycle>::all().iter().map(|st| st.as_str()).collect();
                    format!("Invalid {} status: {}. Use one of: {}", $name, s, names.join(", "))
                })
            }
        }
    };
}

status_text!(QuotationStatus, "quotation");
status_text!(PurchaseOrderStatus, "purchase order");
