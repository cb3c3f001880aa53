//! Additive models

use serde::{Deserialize, Serialize};

/// Reference-table verdict for an additive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Avoid,
    Caution,
    Neutral,
}

/// Consumer-facing risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl From<Verdict> for RiskLevel {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Avoid => RiskLevel::High,
            Verdict::Caution => RiskLevel::Moderate,
            Verdict::Neutral => RiskLevel::Low,
        }
    }
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

/// Where an additive comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdditiveOrigin {
    Natural,
    Synthetic,
    /// Naturally occurring compound, usually manufactured
    Mixed,
    #[default]
    Unknown,
}

/// An additive found in a food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveRecord {
    pub code: Option<String>,
    pub name: String,
    pub origin: AdditiveOrigin,
    pub explanation: String,
    pub risk: RiskLevel,
    #[serde(default)]
    pub child_warning: bool,
}

/// Additive records saved alongside the additive database version that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PersistedAdditives {
    pub records: Vec<AdditiveRecord>,
    pub db_version: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_to_risk() {
        assert_eq!(RiskLevel::from(Verdict::Avoid), RiskLevel::High);
        assert_eq!(RiskLevel::from(Verdict::Caution), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from(Verdict::Neutral), RiskLevel::Low);
    }
}
