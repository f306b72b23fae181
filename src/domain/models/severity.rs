//! Alert severity levels and their ordinal ranks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::AdapterError;

/// Lacework alert severity, ordered from most to least severe.
///
/// The derived `Ord` follows declaration order, so `Critical < Info`
/// matches the rank ordering (lower rank is more severe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Ordinal rank: 1 (critical) through 5 (info).
    pub const fn rank(self) -> u8 {
        match self {
            Self::Critical => 1,
            Self::High => 2,
            Self::Medium => 3,
            Self::Low => 4,
            Self::Info => 5,
        }
    }

    /// Whether this severity is at least as severe as `threshold`.
    pub const fn meets(self, threshold: Self) -> bool {
        self.rank() <= threshold.rank()
    }
}

impl FromStr for Severity {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "info" | "informational" => Ok(Self::Info),
            _ => Err(AdapterError::InvalidSeverity(s.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Info => "info",
        };
        f.write_str(label)
    }
}

/// Map a textual severity label to its rank.
pub fn severity_rank(label: &str) -> Result<u8, AdapterError> {
    label.parse::<Severity>().map(Severity::rank)
}
