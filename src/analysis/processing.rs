//! Processing grade calculation
//!
//! Scores how processed a food is from its ingredient list (industrial
//! processes, non-natural ingredients, additives, E-numbers, list length),
//! adjusted for nutrient balance, and maps the score to a grade. Foods without
//! ingredients get a weak-evidence estimate from their name instead.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::{GradeBands, ProcessingThresholds};
use crate::models::{
    EvidenceStatus, Nutrition, ProcessingAssessment, ProcessingGrade, ProcessingLevel,
    VerificationStatus,
};
use crate::reference::{self, ProcessingKeywords};

use super::display::processing_label;
use super::ingredients::{contains_token, ingredient_count, ingredient_text};

// Nutrient balance, per 100g
const PROTEIN_ADEQUATE_G: f64 = 10.0;
const FIBRE_ADEQUATE_G: f64 = 3.0;
const SUGAR_HIGH_G: f64 = 22.5;
const SUGAR_MEDIUM_G: f64 = 12.5;
const SODIUM_HIGH_MG: f64 = 600.0;
const FAT_HIGH_G: f64 = 17.5;

const UNPROCESSED_BASE: f64 = 95.0;
const MINIMALLY_PROCESSED_BASE: f64 = 85.0;
const PROCESSED_BASE: f64 = 65.0;
const ULTRA_PROCESSED_BASE: f64 = 40.0;
const ULTRA_PROCESSED_FLOOR: f64 = 5.0;
const POINT_PENALTY: f64 = 3.0;

static E_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bE\d{3,4}(?:iii|ii|iv|i|v|[a-z])?\b").expect("Invalid E-number regex"));

/// Everything the calculator reads about a food
#[derive(Debug, Clone, Copy)]
pub struct ProcessingInput<'a> {
    pub name: &'a str,
    /// Normalized ingredient entries
    pub ingredients: &'a [String],
    pub additive_count: usize,
    /// Per 100g
    pub nutrition: &'a Nutrition,
    pub verification: VerificationStatus,
}

/// Ingredient evidence behind a processing level
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingEvidence {
    pub industrial: Vec<String>,
    pub non_natural: Vec<String>,
    pub additive_count: usize,
    pub e_number_count: usize,
    pub ingredient_count: usize,
    pub points: u32,
}

/// Keywords found in the text, longest first, each occurrence counted once
fn matched_keywords(lower: &str, keywords: &[String]) -> (Vec<String>, String) {
    let mut sorted: Vec<&String> = keywords.iter().collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut remaining = lower.to_string();
    let mut found = Vec::new();
    for keyword in sorted {
        if !keyword.is_empty() && remaining.contains(keyword.as_str()) {
            found.push(keyword.clone());
            remaining = remaining.replace(keyword.as_str(), " ");
        }
    }
    (found, remaining)
}

/// Gather the ingredient evidence and its point total
pub fn processing_evidence(
    ingredients: &[String],
    additive_count: usize,
    keywords: &ProcessingKeywords,
) -> ProcessingEvidence {
    let text = ingredient_text(ingredients);
    let lower = text.to_lowercase();

    let (industrial, remaining) = matched_keywords(&lower, &keywords.industrial_processes);
    let (non_natural, _) = matched_keywords(&remaining, &keywords.non_natural);

    let mut e_numbers: Vec<String> = E_NUMBER_REGEX
        .find_iter(&text)
        .map(|m| m.as_str().to_uppercase())
        .collect();
    e_numbers.sort();
    e_numbers.dedup();

    let count = ingredient_count(ingredients);
    let length_points = match count {
        n if n > 20 => 2,
        n if n > 10 => 1,
        _ => 0,
    };

    let points = 2 * industrial.len() as u32
        + non_natural.len() as u32
        + additive_count as u32
        + e_numbers.len() as u32
        + length_points;

    ProcessingEvidence {
        industrial,
        non_natural,
        additive_count,
        e_number_count: e_numbers.len(),
        ingredient_count: count,
        points,
    }
}

/// Processing level for a point total
pub fn processing_level(points: u32, thresholds: &ProcessingThresholds) -> ProcessingLevel {
    if points <= thresholds.unprocessed_max_points {
        ProcessingLevel::Unprocessed
    } else if points <= thresholds.minimally_processed_max_points {
        ProcessingLevel::MinimallyProcessed
    } else if points <= thresholds.processed_max_points {
        ProcessingLevel::Processed
    } else {
        ProcessingLevel::UltraProcessed
    }
}

fn base_score(level: ProcessingLevel, points: u32, thresholds: &ProcessingThresholds) -> f64 {
    match level {
        ProcessingLevel::Unprocessed => UNPROCESSED_BASE,
        ProcessingLevel::MinimallyProcessed => MINIMALLY_PROCESSED_BASE,
        ProcessingLevel::Processed => PROCESSED_BASE - POINT_PENALTY * points as f64,
        ProcessingLevel::UltraProcessed | ProcessingLevel::Unknown => {
            let excess = points.saturating_sub(thresholds.processed_max_points) as f64;
            (ULTRA_PROCESSED_BASE - POINT_PENALTY * excess).max(ULTRA_PROCESSED_FLOOR)
        }
    }
}

/// Score adjustment for nutrient balance, with a note per adjustment
pub fn nutrient_adjustment(nutrition: &Nutrition) -> (f64, Vec<String>) {
    let mut adjustment = 0.0;
    let mut notes = Vec::new();

    if nutrition.protein >= PROTEIN_ADEQUATE_G {
        adjustment += 5.0;
        notes.push("good protein (+5)".to_string());
    }
    if nutrition.fiber >= FIBRE_ADEQUATE_G {
        adjustment += 5.0;
        notes.push("good fibre (+5)".to_string());
    }
    if nutrition.sugar > SUGAR_HIGH_G {
        adjustment -= 15.0;
        notes.push("high sugar (-15)".to_string());
    } else if nutrition.sugar > SUGAR_MEDIUM_G {
        adjustment -= 7.0;
        notes.push("medium sugar (-7)".to_string());
    }
    if nutrition.sodium > SODIUM_HIGH_MG {
        adjustment -= 7.0;
        notes.push("high sodium (-7)".to_string());
    }
    if nutrition.fat > FAT_HIGH_G {
        adjustment -= 5.0;
        notes.push("high fat (-5)".to_string());
    }

    (adjustment, notes)
}

/// Map a 0-100 score through the grade bands
pub fn score_to_grade(score: f64, bands: &GradeBands) -> ProcessingGrade {
    if score >= bands.a_plus {
        ProcessingGrade::APlus
    } else if score >= bands.a {
        ProcessingGrade::A
    } else if score >= bands.b {
        ProcessingGrade::B
    } else if score >= bands.c {
        ProcessingGrade::C
    } else if score >= bands.d {
        ProcessingGrade::D
    } else {
        ProcessingGrade::F
    }
}

fn level_description(level: ProcessingLevel) -> &'static str {
    match level {
        ProcessingLevel::Unprocessed => "Unprocessed",
        ProcessingLevel::MinimallyProcessed => "Minimally processed",
        ProcessingLevel::Processed => "Processed",
        ProcessingLevel::UltraProcessed => "Ultra-processed",
        ProcessingLevel::Unknown => "Unknown processing",
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("1 {}", word)
    } else {
        format!("{} {}s", count, word)
    }
}

fn evidence_explanation(
    level: ProcessingLevel,
    evidence: &ProcessingEvidence,
    nutrient_notes: &[String],
) -> String {
    let mut parts = vec![plural(evidence.ingredient_count, "ingredient")];
    if !evidence.industrial.is_empty() {
        parts.push(format!("industrial processing ({})", evidence.industrial.join(", ")));
    }
    if !evidence.non_natural.is_empty() {
        parts.push(format!("non-natural ingredients ({})", evidence.non_natural.join(", ")));
    }
    if evidence.additive_count > 0 {
        parts.push(plural(evidence.additive_count, "additive"));
    }
    if evidence.e_number_count > 0 {
        parts.push(plural(evidence.e_number_count, "E-number"));
    }

    let mut explanation = format!("{}: {}.", level_description(level), parts.join(", "));
    if !nutrient_notes.is_empty() {
        explanation.push_str(&format!(" Nutrient balance: {}.", nutrient_notes.join(", ")));
    }
    explanation
}

/// Grade a food from its ingredient evidence
fn grade_from_ingredients(
    input: &ProcessingInput,
    thresholds: &ProcessingThresholds,
    keywords: &ProcessingKeywords,
) -> ProcessingAssessment {
    let evidence = processing_evidence(input.ingredients, input.additive_count, keywords);
    let level = processing_level(evidence.points, thresholds);
    let (adjustment, notes) = nutrient_adjustment(input.nutrition);
    let score = (base_score(level, evidence.points, thresholds) + adjustment).clamp(0.0, 100.0);
    let grade = score_to_grade(score, &thresholds.grade_bands);

    let status = if input.verification.is_verified() {
        EvidenceStatus::Verified
    } else {
        EvidenceStatus::Unverified
    };

    tracing::debug!(
        "Processing grade for '{}': {} points, {:?}, score {:.1} -> {}",
        input.name,
        evidence.points,
        level,
        score,
        grade.as_str()
    );

    ProcessingAssessment {
        grade,
        label: processing_label(grade).to_string(),
        explanation: evidence_explanation(level, &evidence, &notes),
        level,
        status,
        score: Some(score),
    }
}

fn name_matches(name: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|phrase| {
        contains_token(name, phrase)
            || phrase
                .strip_suffix('s')
                .is_some_and(|singular| contains_token(name, singular))
    })
}

/// Estimate for foods without ingredients: name keywords, then a sugar downgrade
pub fn weak_evidence_default(
    name: &str,
    sugar_per_100g: f64,
    thresholds: &ProcessingThresholds,
    keywords: &ProcessingKeywords,
) -> ProcessingAssessment {
    let lower = name.trim().to_lowercase();

    let (mut grade, level, basis) = if name_matches(&lower, &keywords.ultra_processed_names) {
        (ProcessingGrade::D, ProcessingLevel::UltraProcessed, "an ultra-processed product name")
    } else if name_matches(&lower, &keywords.whole_food_names) {
        (ProcessingGrade::A, ProcessingLevel::Unprocessed, "a whole-food name")
    } else {
        (ProcessingGrade::C, ProcessingLevel::Unknown, "no recognisable name")
    };

    let mut explanation = format!("Ingredients unknown; estimated from {}.", basis);
    if sugar_per_100g.is_finite() && sugar_per_100g >= thresholds.weak_evidence_sugar_g {
        grade = grade.downgrade();
        explanation.push_str(&format!(" Lowered for {:.1}g sugar per 100g.", sugar_per_100g));
    }

    tracing::warn!("No ingredients for '{}', using weak-evidence grade {}", name, grade.as_str());

    ProcessingAssessment {
        grade,
        label: processing_label(grade).to_string(),
        explanation,
        level,
        status: EvidenceStatus::InsufficientEvidence,
        score: None,
    }
}

fn awaiting_verification() -> ProcessingAssessment {
    ProcessingAssessment {
        grade: ProcessingGrade::Unknown,
        label: processing_label(ProcessingGrade::Unknown).to_string(),
        explanation: "Submitted for review; the grade will be calculated once the ingredients are confirmed."
            .to_string(),
        level: ProcessingLevel::Unknown,
        status: EvidenceStatus::AwaitingVerification,
        score: None,
    }
}

/// Calculate the processing grade for a food. Never fails.
pub fn calculate_processing_grade(
    input: &ProcessingInput,
    thresholds: &ProcessingThresholds,
) -> ProcessingAssessment {
    let keywords = reference::processing();

    if !input.ingredients.is_empty() {
        return grade_from_ingredients(input, thresholds, keywords);
    }

    if input.verification == VerificationStatus::SubmittedForReview {
        return awaiting_verification();
    }

    weak_evidence_default(input.name, input.nutrition.sugar, thresholds, keywords)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> ProcessingThresholds {
        ProcessingThresholds::default()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn assess(
        name: &str,
        ingredients: &[String],
        additive_count: usize,
        nutrition: Nutrition,
        verification: VerificationStatus,
    ) -> ProcessingAssessment {
        let input = ProcessingInput {
            name,
            ingredients,
            additive_count,
            nutrition: &nutrition,
            verification,
        };
        calculate_processing_grade(&input, &thresholds())
    }

    #[test]
    fn test_single_whole_ingredient_is_a_plus() {
        let result = assess(
            "Porridge oats",
            &strings(&["Oats"]),
            0,
            Nutrition { protein: 11.0, fiber: 9.0, sugar: 1.0, ..Default::default() },
            VerificationStatus::Unverified,
        );
        assert_eq!(result.level, ProcessingLevel::Unprocessed);
        assert_eq!(result.grade, ProcessingGrade::APlus);
        assert_eq!(result.label, "Whole food");
        assert_eq!(result.status, EvidenceStatus::Unverified);
        assert_eq!(result.score, Some(100.0));
    }

    #[test]
    fn test_ultra_processed_ingredients() {
        let ingredients = strings(&[
            "Glucose-fructose syrup, partially hydrogenated palm oil, flavourings, emulsifier (E471), colour (E129), preservative (E211)",
        ]);
        let result = assess(
            "Snack cake",
            &ingredients,
            3,
            Nutrition { sugar: 35.0, fat: 20.0, ..Default::default() },
            VerificationStatus::UserVerified,
        );
        assert_eq!(result.level, ProcessingLevel::UltraProcessed);
        assert_eq!(result.grade, ProcessingGrade::F);
        assert_eq!(result.status, EvidenceStatus::Verified);
        assert!(result.explanation.starts_with("Ultra-processed:"));
    }

    #[test]
    fn test_keywords_counted_once() {
        let evidence = processing_evidence(
            &strings(&["Partially hydrogenated vegetable oil"]),
            0,
            reference::processing(),
        );
        assert_eq!(evidence.industrial, vec!["partially hydrogenated".to_string()]);
        assert_eq!(evidence.points, 2);
    }

    #[test]
    fn test_roman_subtype_e_numbers_counted() {
        let evidence = processing_evidence(
            &strings(&["Flour, raising agents (E500ii, E450i), E500ii"]),
            0,
            reference::processing(),
        );
        assert_eq!(evidence.e_number_count, 2);
    }

    #[test]
    fn test_long_lists_add_points() {
        let many: Vec<String> = (0..21).map(|i| format!("Item{}", i)).collect();
        let evidence = processing_evidence(&many, 0, reference::processing());
        assert_eq!(evidence.ingredient_count, 21);
        assert_eq!(evidence.points, 2);
    }

    #[test]
    fn test_level_thresholds() {
        let t = thresholds();
        assert_eq!(processing_level(0, &t), ProcessingLevel::Unprocessed);
        assert_eq!(processing_level(2, &t), ProcessingLevel::MinimallyProcessed);
        assert_eq!(processing_level(6, &t), ProcessingLevel::Processed);
        assert_eq!(processing_level(7, &t), ProcessingLevel::UltraProcessed);
    }

    #[test]
    fn test_score_bands() {
        let bands = thresholds().grade_bands;
        assert_eq!(score_to_grade(90.0, &bands), ProcessingGrade::APlus);
        assert_eq!(score_to_grade(89.9, &bands), ProcessingGrade::A);
        assert_eq!(score_to_grade(65.0, &bands), ProcessingGrade::B);
        assert_eq!(score_to_grade(34.9, &bands), ProcessingGrade::F);
    }

    #[test]
    fn test_nutrient_adjustment() {
        let (adjustment, notes) = nutrient_adjustment(&Nutrition {
            protein: 12.0,
            sugar: 15.0,
            sodium: 800.0,
            ..Default::default()
        });
        assert_eq!(adjustment, 5.0 - 7.0 - 7.0);
        assert_eq!(notes.len(), 3);
    }

    #[test]
    fn test_no_ingredients_awaiting_review() {
        let result = assess(
            "Mystery bar",
            &[],
            0,
            Nutrition::default(),
            VerificationStatus::SubmittedForReview,
        );
        assert_eq!(result.grade, ProcessingGrade::Unknown);
        assert_eq!(result.status, EvidenceStatus::AwaitingVerification);
    }

    #[test]
    fn test_no_ingredients_weak_evidence_default() {
        let apple = assess("Apple", &[], 0, Nutrition::default(), VerificationStatus::Unverified);
        assert_eq!(apple.grade, ProcessingGrade::A);
        assert_eq!(apple.status, EvidenceStatus::InsufficientEvidence);

        let crisps = assess(
            "Salted crisps",
            &[],
            0,
            Nutrition::default(),
            VerificationStatus::Unverified,
        );
        assert_eq!(crisps.grade, ProcessingGrade::D);

        let unknown = assess("Thing", &[], 0, Nutrition::default(), VerificationStatus::Unverified);
        assert_eq!(unknown.grade, ProcessingGrade::C);
    }

    #[test]
    fn test_weak_evidence_sugar_downgrade() {
        let sweets = assess(
            "Fruit pastilles",
            &[],
            0,
            Nutrition { sugar: 60.0, ..Default::default() },
            VerificationStatus::Unverified,
        );
        assert_eq!(sweets.grade, ProcessingGrade::D);
        assert!(sweets.explanation.contains("60.0g sugar"));

        let candy = assess(
            "Candy",
            &[],
            0,
            Nutrition { sugar: 70.0, ..Default::default() },
            VerificationStatus::Unverified,
        );
        assert_eq!(candy.grade, ProcessingGrade::F);
    }
}
