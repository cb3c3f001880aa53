//! Presentation metadata and grade visibility
//!
//! Labels, colours and icons for the grade types, kept apart from the grades
//! themselves, plus the policy deciding when a computed processing grade
//! should not be shown.

use serde::{Deserialize, Serialize};

use crate::models::{ProcessingGrade, RiskLevel, SugarGrade};
use crate::reference;

/// How a grade is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayMeta {
    pub label: &'static str,
    /// Hex colour, e.g. "#2E7D32"
    pub colour: &'static str,
    pub icon: &'static str,
}

const GREEN: &str = "#2E7D32";
const LIGHT_GREEN: &str = "#7CB342";
const YELLOW: &str = "#F9A825";
const ORANGE: &str = "#EF6C00";
const RED: &str = "#C62828";
const DARK_RED: &str = "#8E0000";
const GREY: &str = "#9E9E9E";

pub fn sugar_grade(grade: SugarGrade) -> DisplayMeta {
    let (label, colour, icon) = match grade {
        SugarGrade::Excellent => ("Excellent", GREEN, "checkmark.circle.fill"),
        SugarGrade::VeryGood => ("Very good", LIGHT_GREEN, "checkmark.circle"),
        SugarGrade::Good => ("Good", LIGHT_GREEN, "hand.thumbsup"),
        SugarGrade::Moderate => ("Moderate", YELLOW, "exclamationmark.circle"),
        SugarGrade::High => ("High", ORANGE, "exclamationmark.triangle"),
        SugarGrade::VeryHigh => ("Very high", RED, "exclamationmark.triangle.fill"),
        SugarGrade::Unknown => ("Unknown", GREY, "questionmark.circle"),
    };
    DisplayMeta { label, colour, icon }
}

/// Short description of what a processing grade means
pub fn processing_label(grade: ProcessingGrade) -> &'static str {
    match grade {
        ProcessingGrade::APlus => "Whole food",
        ProcessingGrade::A => "Minimally processed",
        ProcessingGrade::B => "Lightly processed",
        ProcessingGrade::C => "Processed",
        ProcessingGrade::D => "Highly processed",
        ProcessingGrade::F => "Ultra-processed",
        ProcessingGrade::Unknown => "Not graded",
    }
}

pub fn processing_grade(grade: ProcessingGrade) -> DisplayMeta {
    let (colour, icon) = match grade {
        ProcessingGrade::APlus => (GREEN, "leaf.fill"),
        ProcessingGrade::A => (GREEN, "leaf"),
        ProcessingGrade::B => (LIGHT_GREEN, "circle.grid.2x1"),
        ProcessingGrade::C => (YELLOW, "gearshape"),
        ProcessingGrade::D => (ORANGE, "gearshape.2"),
        ProcessingGrade::F => (RED, "gearshape.2.fill"),
        ProcessingGrade::Unknown => (GREY, "questionmark.circle"),
    };
    DisplayMeta {
        label: processing_label(grade),
        colour,
        icon,
    }
}

pub fn risk_level(risk: RiskLevel) -> DisplayMeta {
    let (label, colour, icon) = match risk {
        RiskLevel::Low => ("Low risk", GREEN, "checkmark.shield"),
        RiskLevel::Moderate => ("Moderate risk", ORANGE, "exclamationmark.shield"),
        RiskLevel::High => ("High risk", DARK_RED, "xmark.shield.fill"),
    };
    DisplayMeta { label, colour, icon }
}

/// Why a processing grade is hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenReason {
    UnknownIngredients,
    PerUnitServing,
    UltraProcessedBrand,
}

impl HiddenReason {
    pub fn message(&self) -> &'static str {
        match self {
            HiddenReason::UnknownIngredients => "Ingredients are not known for this food",
            HiddenReason::PerUnitServing => "Grades are not shown for per-item servings",
            HiddenReason::UltraProcessedBrand => "This brand is graded separately",
        }
    }
}

/// Whether to show a processing grade. Never alters the grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeVisibility {
    pub visible: bool,
    pub reason: Option<HiddenReason>,
}

impl GradeVisibility {
    fn shown() -> Self {
        Self { visible: true, reason: None }
    }

    fn hidden(reason: HiddenReason) -> Self {
        Self { visible: false, reason: Some(reason) }
    }
}

/// Whether a brand is on the curated ultra-processed list
pub fn is_ultra_processed_brand(brand: Option<&str>) -> bool {
    let Some(brand) = brand.map(|b| b.trim().to_lowercase()).filter(|b| !b.is_empty()) else {
        return false;
    };
    reference::processing()
        .ultra_processed_brands
        .iter()
        .any(|listed| brand == *listed || brand.starts_with(&format!("{} ", listed)))
}

/// Decide whether a computed processing grade is shown
pub fn grade_visibility(has_ingredients: bool, is_per_unit: bool, brand: Option<&str>) -> GradeVisibility {
    if !has_ingredients {
        GradeVisibility::hidden(HiddenReason::UnknownIngredients)
    } else if is_per_unit {
        GradeVisibility::hidden(HiddenReason::PerUnitServing)
    } else if is_ultra_processed_brand(brand) {
        GradeVisibility::hidden(HiddenReason::UltraProcessedBrand)
    } else {
        GradeVisibility::shown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(sugar_grade(SugarGrade::VeryHigh).label, "Very high");
        assert_eq!(processing_grade(ProcessingGrade::APlus).label, "Whole food");
        assert_eq!(risk_level(RiskLevel::High).colour, DARK_RED);
    }

    #[test]
    fn test_colours_are_hex() {
        let metas = [
            sugar_grade(SugarGrade::Good),
            processing_grade(ProcessingGrade::D),
            risk_level(RiskLevel::Low),
        ];
        for meta in metas {
            assert!(meta.colour.starts_with('#') && meta.colour.len() == 7);
        }
    }

    #[test]
    fn test_visibility_rules() {
        assert!(grade_visibility(true, false, Some("Local Farm")).visible);

        let hidden = grade_visibility(false, false, None);
        assert!(!hidden.visible);
        assert_eq!(hidden.reason, Some(HiddenReason::UnknownIngredients));

        assert_eq!(
            grade_visibility(true, true, None).reason,
            Some(HiddenReason::PerUnitServing)
        );
        assert_eq!(
            grade_visibility(true, false, Some("Haribo")).reason,
            Some(HiddenReason::UltraProcessedBrand)
        );
    }

    #[test]
    fn test_brand_match_is_whole_name() {
        assert!(is_ultra_processed_brand(Some("Coca-Cola")));
        assert!(is_ultra_processed_brand(Some("mars wrigley")));
        assert!(!is_ultra_processed_brand(Some("Marshfield Farms")));
        assert!(!is_ultra_processed_brand(None));
    }
}
