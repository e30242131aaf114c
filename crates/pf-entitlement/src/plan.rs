//! Subscription plans.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A subscription plan. Ordered by capability: `Free < Creator < Pro <
/// Enterprise`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Plan {
    /// Free tier.
    Free,
    /// Individual creator tier.
    Creator,
    /// Professional tier.
    Pro,
    /// Enterprise tier.
    Enterprise,
}

/// The input did not name a plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid plan {0:?}: expected one of FREE, CREATOR, PRO, ENTERPRISE")]
pub struct ParsePlanError(pub String);

impl Plan {
    /// Every plan, lowest first.
    pub fn all() -> &'static [Plan] {
        &[Self::Free, Self::Creator, Self::Pro, Self::Enterprise]
    }

    /// Wire name (`"FREE"`, `"CREATOR"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Creator => "CREATOR",
            Self::Pro => "PRO",
            Self::Enterprise => "ENTERPRISE",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Plan {
    type Err = ParsePlanError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParsePlanError(s.to_string()))
    }
}
