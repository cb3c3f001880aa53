//! Grade and status types
//!
//! Closed sets only; colours, icons and labels live in `analysis::display`.

use serde::{Deserialize, Serialize};

/// Sugar grade, declared from most to least favourable.
///
/// `Unknown` sorts last but never wins a "worse of" comparison, see [`SugarGrade::worse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SugarGrade {
    Excellent,
    VeryGood,
    Good,
    Moderate,
    High,
    VeryHigh,
    Unknown,
}

impl SugarGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            SugarGrade::Excellent => "excellent",
            SugarGrade::VeryGood => "very_good",
            SugarGrade::Good => "good",
            SugarGrade::Moderate => "moderate",
            SugarGrade::High => "high",
            SugarGrade::VeryHigh => "very_high",
            SugarGrade::Unknown => "unknown",
        }
    }

    /// The less favourable of two grades. A known grade beats `Unknown`.
    pub fn worse(self, other: SugarGrade) -> SugarGrade {
        match (self, other) {
            (SugarGrade::Unknown, g) | (g, SugarGrade::Unknown) => g,
            (a, b) => a.max(b),
        }
    }
}

/// Sugar assessment of a food and serving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SugarScore {
    pub density_grade: SugarGrade,
    pub serving_grade: SugarGrade,
    pub final_grade: SugarGrade,
    pub explanation: String,
    pub recommendation: String,
}

/// Processing grade, most to least favourable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProcessingGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
    #[serde(rename = "unknown")]
    Unknown,
}

impl ProcessingGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingGrade::APlus => "A+",
            ProcessingGrade::A => "A",
            ProcessingGrade::B => "B",
            ProcessingGrade::C => "C",
            ProcessingGrade::D => "D",
            ProcessingGrade::F => "F",
            ProcessingGrade::Unknown => "unknown",
        }
    }

    /// One step less favourable, saturating at F
    pub fn downgrade(self) -> Self {
        match self {
            ProcessingGrade::APlus => ProcessingGrade::A,
            ProcessingGrade::A => ProcessingGrade::B,
            ProcessingGrade::B => ProcessingGrade::C,
            ProcessingGrade::C => ProcessingGrade::D,
            ProcessingGrade::D | ProcessingGrade::F => ProcessingGrade::F,
            ProcessingGrade::Unknown => ProcessingGrade::Unknown,
        }
    }
}

/// How industrially processed a food is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingLevel {
    Unprocessed,
    MinimallyProcessed,
    Processed,
    UltraProcessed,
    Unknown,
}

impl ProcessingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingLevel::Unprocessed => "unprocessed",
            ProcessingLevel::MinimallyProcessed => "minimally_processed",
            ProcessingLevel::Processed => "processed",
            ProcessingLevel::UltraProcessed => "ultra_processed",
            ProcessingLevel::Unknown => "unknown",
        }
    }
}

/// Strength of the evidence behind a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    /// No ingredient data; estimated from name and nutrients only
    InsufficientEvidence,
    Unverified,
    Verified,
    /// Submitted for review; ingredients pending
    AwaitingVerification,
}

/// Result of the processing grade calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingAssessment {
    pub grade: ProcessingGrade,
    pub label: String,
    pub explanation: String,
    pub level: ProcessingLevel,
    pub status: EvidenceStatus,
    /// Blended 0-100 score; None when no grade was computed
    pub score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sugar_worse_of() {
        assert_eq!(SugarGrade::Excellent.worse(SugarGrade::High), SugarGrade::High);
        assert_eq!(SugarGrade::VeryHigh.worse(SugarGrade::Good), SugarGrade::VeryHigh);
        assert_eq!(SugarGrade::Unknown.worse(SugarGrade::Good), SugarGrade::Good);
        assert_eq!(SugarGrade::Moderate.worse(SugarGrade::Unknown), SugarGrade::Moderate);
        assert_eq!(SugarGrade::Unknown.worse(SugarGrade::Unknown), SugarGrade::Unknown);
    }

    #[test]
    fn test_processing_downgrade_saturates() {
        assert_eq!(ProcessingGrade::APlus.downgrade(), ProcessingGrade::A);
        assert_eq!(ProcessingGrade::F.downgrade(), ProcessingGrade::F);
    }

    #[test]
    fn test_processing_grade_serializes_as_letter() {
        let json = serde_json::to_string(&ProcessingGrade::APlus).unwrap();
        assert_eq!(json, "\"A+\"");
    }
}
