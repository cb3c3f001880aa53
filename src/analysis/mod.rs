//! Food analysis pipeline
//!
//! Runs every analysis over one food record: serving resolution and ingredient
//! normalization first, then allergens, additives, nutrients, sugar and the
//! processing grade over their outputs. Every step is pure and infallible.

pub mod additives;
pub mod allergens;
pub mod cache;
pub mod display;
pub mod ingredients;
pub mod nutrients;
pub mod processing;
pub mod sugar;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::models::{
    AllergenCategory, FoodRecord, NormalizedServing, Nutrition, NutrientDetection,
    ProcessingAssessment, SugarScore, VerificationStatus,
};
use crate::nutrition::serving::resolve_serving;
use crate::reference::{self, AdditiveTable};

pub use additives::{analyze_additives, AdditiveAnalysis, AdditiveSource};
pub use allergens::{detect_allergens, detect_personal_allergens, PersonalAllergens};
pub use cache::{content_hash, AnalysisCache};
pub use display::{grade_visibility, GradeVisibility, HiddenReason};
pub use ingredients::{ingredient_text, normalize_ingredients};
pub use nutrients::detect_nutrients;
pub use processing::{calculate_processing_grade, ProcessingInput};
pub use sugar::score_sugar;

/// Output of an external enrichment service, applied as ordinary input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Allergen names reported by the service
    #[serde(default)]
    pub allergen_names: Option<Vec<String>>,
    /// Replacement for the record's ingredient text
    #[serde(default)]
    pub ingredient_text: Option<String>,
    /// Replacement for the record's per-100g nutrition
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
}

/// Caller choices that change the result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Categories to report; all when absent
    #[serde(default)]
    pub tracked_allergens: Option<BTreeSet<AllergenCategory>>,
    /// The user's own allergens, for the personalized result
    #[serde(default)]
    pub user_allergens: Option<BTreeSet<AllergenCategory>>,
    /// Only trust label daily values for nutrient presence
    #[serde(default)]
    pub strict_nutrients: bool,
    #[serde(default)]
    pub enrichment: Option<Enrichment>,
}

/// Everything derived from one food record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodAnalysis {
    pub food_key: String,
    pub verification: VerificationStatus,
    pub serving: NormalizedServing,
    /// Nutrition for the resolved serving; None for per-unit servings without a weight
    pub per_serving: Option<Nutrition>,
    pub ingredients: Vec<String>,
    pub allergens: BTreeSet<AllergenCategory>,
    pub personal_allergens: Option<PersonalAllergens>,
    pub additives: AdditiveAnalysis,
    pub nutrients: NutrientDetection,
    pub sugar: SugarScore,
    pub sugar_per_serving: Option<f64>,
    pub processing: ProcessingAssessment,
    pub grade_visibility: GradeVisibility,
}

/// Raw ingredient entries after applying an enrichment replacement
fn effective_raw_ingredients(record: &FoodRecord, options: &AnalysisOptions) -> Vec<String> {
    let replacement = options
        .enrichment
        .as_ref()
        .and_then(|e| e.ingredient_text.as_deref())
        .filter(|text| !text.trim().is_empty());

    match replacement {
        Some(text) => ingredients::split_items(text),
        None => record.raw_ingredients().to_vec(),
    }
}

fn effective_nutrition(record: &FoodRecord, options: &AnalysisOptions) -> Nutrition {
    options
        .enrichment
        .as_ref()
        .and_then(|e| e.nutrition)
        .unwrap_or(record.nutrition)
}

/// Content hash of every input that affects the analysis of a record
pub fn analysis_hash(record: &FoodRecord, options: &AnalysisOptions, table: &AdditiveTable) -> String {
    let normalized = normalize_ingredients(&effective_raw_ingredients(record, options));
    let nutrition = effective_nutrition(record, options);

    content_hash(&[
        ingredient_text(&normalized),
        table.version.to_string(),
        serde_json::to_string(&nutrition).unwrap_or_default(),
        record.serving_description.clone(),
        format!("{:?}|{}|{}", record.serving_size_g, record.is_liquid, record.is_per_unit),
        record.verification.as_str().to_string(),
        serde_json::to_string(&record.additives).unwrap_or_default(),
        serde_json::to_string(&record.micronutrients).unwrap_or_default(),
        serde_json::to_string(options).unwrap_or_default(),
        record.food_key(),
    ])
}

/// Content hash of the normalized ingredient text additives are derived from
pub fn ingredients_hash(record: &FoodRecord, options: &AnalysisOptions) -> String {
    let normalized = normalize_ingredients(&effective_raw_ingredients(record, options));
    content_hash(&[ingredient_text(&normalized)])
}

/// Analyze a food record against an explicit additive table
pub fn analyze_food_with_table(
    record: &FoodRecord,
    options: &AnalysisOptions,
    config: &AnalysisConfig,
    table: &AdditiveTable,
) -> FoodAnalysis {
    let serving = resolve_serving(&record.serving_description, record.serving_size_g, record.is_liquid);
    let normalized = normalize_ingredients(&effective_raw_ingredients(record, options));
    let text = ingredient_text(&normalized);
    let nutrition = effective_nutrition(record, options);
    let brand = record.brand.as_deref();

    let allergens = match &options.tracked_allergens {
        Some(tracked) => detect_allergens(&text, Some(&record.name), brand, tracked),
        None => allergens::detect_all_allergens(&text, Some(&record.name), brand),
    };

    let personal_allergens = options.user_allergens.as_ref().map(|user| {
        let enrichment = options
            .enrichment
            .as_ref()
            .and_then(|e| e.allergen_names.as_deref());
        detect_personal_allergens(&text, Some(&record.name), brand, user, enrichment)
    });

    let additives = analyze_additives(&text, record.additives.as_ref(), table);

    let nutrients = detect_nutrients(
        &text,
        record.micronutrients.as_ref(),
        options.strict_nutrients,
        &config.nutrients,
    );

    let sugar_per_serving = sugar::sugar_per_serving(Some(nutrition.sugar), &serving);
    let sugar = score_sugar(
        Some(nutrition.sugar),
        sugar_per_serving,
        record.is_liquid,
        &config.sugar,
    );

    let processing = calculate_processing_grade(
        &ProcessingInput {
            name: &record.name,
            ingredients: &normalized,
            additive_count: additives.records.len(),
            nutrition: &nutrition,
            verification: record.verification,
        },
        &config.processing,
    );

    let grade_visibility = grade_visibility(
        !normalized.is_empty(),
        record.is_per_unit || serving.is_per_unit,
        brand,
    );

    let per_serving = serving.grams_equivalent().map(|grams| nutrition * (grams / 100.0));

    FoodAnalysis {
        food_key: record.food_key(),
        verification: record.verification,
        serving,
        per_serving,
        ingredients: normalized,
        allergens,
        personal_allergens,
        additives,
        nutrients,
        sugar,
        sugar_per_serving,
        processing,
        grade_visibility,
    }
}

/// Analyze a food record against the embedded additive table
pub fn analyze_food(record: &FoodRecord, options: &AnalysisOptions, config: &AnalysisConfig) -> FoodAnalysis {
    analyze_food_with_table(record, options, config, reference::additives())
}
