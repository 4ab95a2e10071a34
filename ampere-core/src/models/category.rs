use serde::{Deserialize, Serialize};

/// Cost category of a line item or catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Labour,
    #[default]
    Materials,
    Equipment,
    Transportation,
    #[serde(rename = "Permits & Fees")]
    PermitsAndFees,
    Overhead,
    Other,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Labour,
            Category::Materials,
            Category::Equipment,
            Category::Transportation,
            Category::PermitsAndFees,
            Category::Overhead,
            Category::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Labour => "Labour",
            Self::Materials => "Materials",
            Self::Equipment => "Equipment",
            Self::Transportation => "Transportation",
            Self::PermitsAndFees => "Permits & Fees",
            Self::Overhead => "Overhead",
            Self::Other => "Other",
        }
    }

    /// Case-insensitive lookup by display label.
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            let labels: Vec<_> = Self::all().iter().map(|c| c.as_str()).collect();
            format!("Invalid category: {s}. Use one of: {}", labels.join(", "))
        })
    }
}
