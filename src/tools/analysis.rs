//! Food Analysis MCP Tools
//!
//! Tools wrapping the pure analysis pipeline, the memo cache and the local
//! marker store.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::analysis::{
    self, additives, allergens, display, ingredients, nutrients, sugar, AnalysisCache,
    AnalysisOptions, FoodAnalysis, PersonalAllergens,
};
use crate::analysis::display::DisplayMeta;
use crate::config::AnalysisConfig;
use crate::db::Database;
use crate::models::{
    food_key, AdditiveRecord, AllergenCategory, FoodMarkers, FoodRecord, MicronutrientProfile,
    NormalizedServing, Nutrient, NutrientDetection, RiskLevel, SavedAdditives, SugarScore,
    VerificationStatus, VerifiedBy,
};
use crate::nutrition::serving::resolve_serving as resolve;
use crate::reference;

// ============================================================================
// Responses
// ============================================================================

/// Display metadata for the headline grades
#[derive(Debug, Serialize)]
pub struct GradeDisplay {
    pub sugar: DisplayMeta,
    pub processing: DisplayMeta,
    /// Reason text when the processing grade is hidden
    pub hidden_reason: Option<&'static str>,
}

/// Response for analyze_food
#[derive(Debug, Serialize)]
pub struct AnalyzeFoodResponse {
    #[serde(flatten)]
    pub analysis: FoodAnalysis,
    pub display: GradeDisplay,
    pub cached: bool,
}

/// Response for normalize_ingredients
#[derive(Debug, Serialize)]
pub struct NormalizeIngredientsResponse {
    pub ingredients: Vec<String>,
    pub ingredient_count: usize,
    pub removed: usize,
}

/// Response for resolve_serving
#[derive(Debug, Serialize)]
pub struct ResolveServingResponse {
    #[serde(flatten)]
    pub serving: NormalizedServing,
    pub display: String,
}

/// Response for detect_allergens
#[derive(Debug, Serialize)]
pub struct DetectAllergensResponse {
    pub allergens: Vec<AllergenCategory>,
    pub display_names: Vec<&'static str>,
}

/// Response for detect_personal_allergens
#[derive(Debug, Serialize)]
pub struct PersonalAllergensResponse {
    pub result: PersonalAllergens,
    pub display_names: Vec<String>,
}

/// One additive with its risk presentation
#[derive(Debug, Serialize)]
pub struct AdditiveDetail {
    #[serde(flatten)]
    pub record: AdditiveRecord,
    pub risk_display: DisplayMeta,
}

/// Response for analyze_additives
#[derive(Debug, Serialize)]
pub struct AnalyzeAdditivesResponse {
    pub additives: Vec<AdditiveDetail>,
    pub db_version: u32,
    pub high_risk_count: usize,
    pub moderate_risk_count: usize,
    pub child_warning: bool,
}

/// Response for score_sugar
#[derive(Debug, Serialize)]
pub struct ScoreSugarResponse {
    #[serde(flatten)]
    pub score: SugarScore,
    pub serving: String,
    pub sugar_per_serving: Option<f64>,
    pub display: DisplayMeta,
}

/// Response for detect_nutrients
#[derive(Debug, Serialize)]
pub struct DetectNutrientsResponse {
    pub nutrients: NutrientDetection,
    pub total: usize,
}

/// Response for the marker tools
#[derive(Debug, Serialize)]
pub struct FoodMarkersResponse {
    pub food_key: String,
    pub markers: Option<FoodMarkers>,
    pub effective_status: VerificationStatus,
}

/// Response for clear_food_markers
#[derive(Debug, Serialize)]
pub struct ClearFoodMarkersResponse {
    pub food_key: String,
    pub cleared: bool,
    pub cache_invalidated: bool,
}

// ============================================================================
// Parsing helpers
// ============================================================================

/// Parse category names, rejecting unknown ones
pub fn parse_categories(names: &[String]) -> Result<BTreeSet<AllergenCategory>, String> {
    names
        .iter()
        .map(|name| {
            AllergenCategory::from_str(name).ok_or_else(|| {
                let valid: Vec<&str> = AllergenCategory::ALL.iter().map(|c| c.as_str()).collect();
                format!("Unknown allergen category '{}'. Valid: {}", name, valid.join(", "))
            })
        })
        .collect()
}

/// Parse a nutrient-name to daily-value map
pub fn parse_micronutrients(values: &BTreeMap<String, f64>) -> Result<MicronutrientProfile, String> {
    values
        .iter()
        .map(|(name, value)| {
            Nutrient::from_str(name)
                .map(|nutrient| (nutrient, *value))
                .ok_or_else(|| format!("Unknown nutrient '{}'", name))
        })
        .collect()
}

// ============================================================================
// Tools
// ============================================================================

/// Run the full analysis for a record.
///
/// Stored markers upgrade the record's verification status, saved additives
/// are reused when the record carries none and its ingredient text is
/// unchanged, and freshly computed additives are saved back.
pub fn analyze_food(
    db: &Database,
    cache: &AnalysisCache<FoodAnalysis>,
    config: &AnalysisConfig,
    mut record: FoodRecord,
    options: AnalysisOptions,
) -> Result<AnalyzeFoodResponse, String> {
    if record.name.trim().is_empty() {
        return Err("Food name cannot be empty".to_string());
    }

    let key = record.food_key();
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    if let Some(markers) = FoodMarkers::get(&conn, &key)
        .map_err(|e| format!("Failed to load food markers: {}", e))?
    {
        record.verification = markers.effective_status(record.verification);
    }

    let ingredients_hash = analysis::ingredients_hash(&record, &options);
    if record.additives.is_none() {
        record.additives = SavedAdditives::get(&conn, &key, &ingredients_hash)
            .map_err(|e| format!("Failed to load saved additives: {}", e))?;
    }

    let table = reference::additives();
    let hash = analysis::analysis_hash(&record, &options, table);
    let (analysis, cached) = cache.get_or_compute(&key, &hash, || {
        analysis::analyze_food_with_table(&record, &options, config, table)
    });

    if !cached && analysis.additives.source == additives::AdditiveSource::Computed {
        SavedAdditives::save(&conn, &key, &ingredients_hash, &analysis.additives.to_persisted())
            .map_err(|e| format!("Failed to save additives: {}", e))?;
    }

    let analysis = FoodAnalysis::clone(&analysis);
    let display = GradeDisplay {
        sugar: display::sugar_grade(analysis.sugar.final_grade),
        processing: display::processing_grade(analysis.processing.grade),
        hidden_reason: analysis.grade_visibility.reason.map(|r| r.message()),
    };

    Ok(AnalyzeFoodResponse {
        analysis,
        display,
        cached,
    })
}

/// Clean raw ingredient entries
pub fn normalize_ingredients(raw: &[String]) -> NormalizeIngredientsResponse {
    let cleaned = ingredients::normalize_ingredients(raw);
    NormalizeIngredientsResponse {
        ingredient_count: ingredients::ingredient_count(&cleaned),
        removed: raw.len() - cleaned.len(),
        ingredients: cleaned,
    }
}

/// Resolve a serving description
pub fn resolve_serving(
    description: &str,
    serving_size_g: Option<f64>,
    is_liquid: bool,
) -> ResolveServingResponse {
    let serving = resolve(description, serving_size_g, is_liquid);
    ResolveServingResponse {
        display: serving.display(),
        serving,
    }
}

/// Detect allergen categories, limited to `tracked` when given
pub fn detect_allergens(
    raw_ingredients: &[String],
    name: Option<&str>,
    brand: Option<&str>,
    tracked: Option<&[String]>,
) -> Result<DetectAllergensResponse, String> {
    let text = ingredients::ingredient_text(&ingredients::normalize_ingredients(raw_ingredients));
    let found = match tracked {
        Some(names) => allergens::detect_allergens(&text, name, brand, &parse_categories(names)?),
        None => allergens::detect_all_allergens(&text, name, brand),
    };

    Ok(DetectAllergensResponse {
        display_names: found.iter().map(|c| c.display_name()).collect(),
        allergens: found.into_iter().collect(),
    })
}

/// Allergens relevant to the user's own categories
pub fn detect_personal_allergens(
    raw_ingredients: &[String],
    name: Option<&str>,
    brand: Option<&str>,
    user_allergens: &[String],
    enrichment: Option<&[String]>,
) -> Result<PersonalAllergensResponse, String> {
    let user = parse_categories(user_allergens)?;
    let text = ingredients::ingredient_text(&ingredients::normalize_ingredients(raw_ingredients));
    let found = allergens::detect_personal_allergens(&text, name, brand, &user, enrichment);

    Ok(PersonalAllergensResponse {
        display_names: found.display_names(),
        result: found,
    })
}

/// Find additives in an ingredient list against the current table
pub fn analyze_additives(raw_ingredients: &[String]) -> AnalyzeAdditivesResponse {
    let text = ingredients::ingredient_text(&ingredients::normalize_ingredients(raw_ingredients));
    let result = additives::analyze_additives(&text, None, reference::additives());

    AnalyzeAdditivesResponse {
        high_risk_count: result.count_at(RiskLevel::High),
        moderate_risk_count: result.count_at(RiskLevel::Moderate),
        child_warning: result.has_child_warning(),
        db_version: result.db_version,
        additives: result
            .records
            .into_iter()
            .map(|record| AdditiveDetail {
                risk_display: display::risk_level(record.risk),
                record,
            })
            .collect(),
    }
}

/// Grade sugar content for a food and its serving
pub fn score_sugar(
    config: &AnalysisConfig,
    sugar_per_100g: Option<f64>,
    serving_description: &str,
    serving_size_g: Option<f64>,
    is_liquid: bool,
) -> ScoreSugarResponse {
    let serving = resolve(serving_description, serving_size_g, is_liquid);
    let per_serving = sugar::sugar_per_serving(sugar_per_100g, &serving);
    let score = sugar::score_sugar(sugar_per_100g, per_serving, is_liquid, &config.sugar);

    ScoreSugarResponse {
        display: display::sugar_grade(score.final_grade),
        serving: serving.display(),
        sugar_per_serving: per_serving,
        score,
    }
}

/// Detect micronutrients from ingredients and label daily values
pub fn detect_nutrients(
    config: &AnalysisConfig,
    raw_ingredients: &[String],
    micronutrients: Option<&BTreeMap<String, f64>>,
    strict: bool,
) -> Result<DetectNutrientsResponse, String> {
    let profile = micronutrients.map(parse_micronutrients).transpose()?;
    let text = ingredients::ingredient_text(&ingredients::normalize_ingredients(raw_ingredients));
    let found = nutrients::detect_nutrients(&text, profile.as_ref(), strict, &config.nutrients);

    Ok(DetectNutrientsResponse {
        total: found.len(),
        nutrients: found,
    })
}

fn markers_response(food_key: String, markers: Option<FoodMarkers>) -> FoodMarkersResponse {
    let effective_status = markers
        .as_ref()
        .map(|m| m.effective_status(VerificationStatus::Unverified))
        .unwrap_or_default();
    FoodMarkersResponse {
        food_key,
        markers,
        effective_status,
    }
}

/// Record that a food was sent for catalog review
pub fn mark_submitted_for_review(
    db: &Database,
    cache: &AnalysisCache<FoodAnalysis>,
    name: &str,
    brand: Option<&str>,
) -> Result<FoodMarkersResponse, String> {
    if name.trim().is_empty() {
        return Err("Food name cannot be empty".to_string());
    }
    let key = food_key(name, brand);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let markers = FoodMarkers::mark_submitted(&conn, &key)
        .map_err(|e| format!("Failed to mark food as submitted: {}", e))?;
    cache.invalidate(&key);

    Ok(markers_response(key, Some(markers)))
}

/// Record that a food was verified by the user or the client
pub fn mark_verified(
    db: &Database,
    cache: &AnalysisCache<FoodAnalysis>,
    name: &str,
    brand: Option<&str>,
    verified_by: &str,
) -> Result<FoodMarkersResponse, String> {
    if name.trim().is_empty() {
        return Err("Food name cannot be empty".to_string());
    }
    let by = VerifiedBy::from_str(verified_by)
        .ok_or_else(|| format!("Invalid verified_by '{}'. Use 'user' or 'client'", verified_by))?;
    let key = food_key(name, brand);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let markers = FoodMarkers::mark_verified(&conn, &key, by)
        .map_err(|e| format!("Failed to mark food as verified: {}", e))?;
    cache.invalidate(&key);

    Ok(markers_response(key, Some(markers)))
}

/// Stored markers for a food
pub fn get_food_markers(db: &Database, name: &str, brand: Option<&str>) -> Result<FoodMarkersResponse, String> {
    let key = food_key(name, brand);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let markers = FoodMarkers::get(&conn, &key)
        .map_err(|e| format!("Failed to get food markers: {}", e))?;

    Ok(markers_response(key, markers))
}

/// Remove stored markers for a food
pub fn clear_food_markers(
    db: &Database,
    cache: &AnalysisCache<FoodAnalysis>,
    name: &str,
    brand: Option<&str>,
) -> Result<ClearFoodMarkersResponse, String> {
    let key = food_key(name, brand);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let cleared = FoodMarkers::clear(&conn, &key)
        .map_err(|e| format!("Failed to clear food markers: {}", e))?;
    let cache_invalidated = cache.invalidate(&key);

    Ok(ClearFoodMarkersResponse {
        food_key: key,
        cleared,
        cache_invalidated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{EvidenceStatus, Nutrition};

    fn setup() -> (Database, AnalysisCache<FoodAnalysis>, AnalysisConfig) {
        let db = Database::open_in_memory().unwrap();
        {
            let conn = db.get_conn().unwrap();
            run_migrations(&conn).unwrap();
        }
        (db, AnalysisCache::new(), AnalysisConfig::default())
    }

    fn cola() -> FoodRecord {
        FoodRecord {
            name: "Cola".to_string(),
            brand: Some("Fizz Co".to_string()),
            ingredients: Some(vec![
                "Carbonated water, sugar, colour (caramel E150d), phosphoric acid, flavourings, caffeine"
                    .to_string(),
            ]),
            nutrition: Nutrition {
                calories: 42.0,
                carbs: 10.6,
                sugar: 10.6,
                ..Default::default()
            },
            serving_description: "1 can (330ml)".to_string(),
            is_liquid: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_analyze_food_caches_and_saves_additives() {
        let (db, cache, config) = setup();

        let first = analyze_food(&db, &cache, &config, cola(), AnalysisOptions::default()).unwrap();
        assert!(!first.cached);
        assert!(!first.analysis.additives.records.is_empty());

        let conn = db.get_conn().unwrap();
        let hash = analysis::ingredients_hash(&cola(), &AnalysisOptions::default());
        let saved = SavedAdditives::get(&conn, "cola|fizz co", &hash).unwrap().unwrap();
        assert_eq!(saved.records, first.analysis.additives.records);
        assert_eq!(saved.db_version, Some(reference::additives().version));
        drop(conn);

        // The saved additives now feed the analysis, so the inputs changed once
        let second = analyze_food(&db, &cache, &config, cola(), AnalysisOptions::default()).unwrap();
        assert_eq!(second.analysis.additives.source, additives::AdditiveSource::Persisted);

        let third = analyze_food(&db, &cache, &config, cola(), AnalysisOptions::default()).unwrap();
        assert!(third.cached);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_saved_additives_recomputed_when_ingredients_arrive() {
        let (db, cache, config) = setup();
        let bare = FoodRecord {
            ingredients: None,
            ..cola()
        };

        let first = analyze_food(&db, &cache, &config, bare, AnalysisOptions::default()).unwrap();
        assert!(first.analysis.additives.records.is_empty());

        let second = analyze_food(&db, &cache, &config, cola(), AnalysisOptions::default()).unwrap();
        assert_eq!(second.analysis.additives.source, additives::AdditiveSource::Computed);
        assert!(second
            .analysis
            .additives
            .records
            .iter()
            .any(|a| a.code.as_deref() == Some("E150d")));

        // Enrichment text replaces the ingredients, so the saved list no longer applies
        let options = AnalysisOptions {
            enrichment: Some(analysis::Enrichment {
                ingredient_text: Some("Carbonated water, sugar".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let third = analyze_food(&db, &cache, &config, cola(), options).unwrap();
        assert_eq!(third.analysis.additives.source, additives::AdditiveSource::Computed);
        assert!(third.analysis.additives.records.is_empty());
    }

    #[test]
    fn test_markers_feed_verification_status() {
        let (db, cache, config) = setup();

        let before = analyze_food(&db, &cache, &config, cola(), AnalysisOptions::default()).unwrap();
        assert_eq!(before.analysis.processing.status, EvidenceStatus::Unverified);

        mark_verified(&db, &cache, "Cola", Some("Fizz Co"), "user").unwrap();
        let after = analyze_food(&db, &cache, &config, cola(), AnalysisOptions::default()).unwrap();
        assert!(!after.cached);
        assert_eq!(after.analysis.verification, VerificationStatus::UserVerified);
        assert_eq!(after.analysis.processing.status, EvidenceStatus::Verified);
    }

    #[test]
    fn test_submitted_without_ingredients_awaits_verification() {
        let (db, cache, config) = setup();
        let record = FoodRecord {
            name: "Mystery Snack".to_string(),
            ..Default::default()
        };

        mark_submitted_for_review(&db, &cache, "Mystery Snack", None).unwrap();
        let result = analyze_food(&db, &cache, &config, record, AnalysisOptions::default()).unwrap();
        assert_eq!(result.analysis.verification, VerificationStatus::SubmittedForReview);
        assert_eq!(result.analysis.processing.status, EvidenceStatus::AwaitingVerification);
        assert!(result.display.hidden_reason.is_some());
    }

    #[test]
    fn test_marker_lifecycle() {
        let (db, cache, _) = setup();

        let none = get_food_markers(&db, "Oat Bar", None).unwrap();
        assert!(none.markers.is_none());
        assert_eq!(none.effective_status, VerificationStatus::Unverified);

        mark_submitted_for_review(&db, &cache, "Oat Bar", None).unwrap();
        let marked = mark_verified(&db, &cache, "  OAT   bar ", None, "client").unwrap();
        assert_eq!(marked.food_key, "oat bar|");
        assert_eq!(marked.effective_status, VerificationStatus::ClientVerified);

        let cleared = clear_food_markers(&db, &cache, "Oat Bar", None).unwrap();
        assert!(cleared.cleared);
        assert!(get_food_markers(&db, "Oat Bar", None).unwrap().markers.is_none());
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let (db, cache, config) = setup();
        assert!(mark_verified(&db, &cache, "Oat Bar", None, "robot").is_err());
        assert!(mark_submitted_for_review(&db, &cache, "  ", None).is_err());
        assert!(analyze_food(&db, &cache, &config, FoodRecord::default(), AnalysisOptions::default()).is_err());

        let tracked = vec!["dairy".to_string(), "kryptonite".to_string()];
        let err = detect_allergens(&["Milk".to_string()], None, None, Some(&tracked)).unwrap_err();
        assert!(err.contains("kryptonite"));

        let values = BTreeMap::from([("vitamin_q".to_string(), 10.0)]);
        assert!(detect_nutrients(&config, &[], Some(&values), false).is_err());
    }

    #[test]
    fn test_stateless_tools() {
        let normalized = normalize_ingredients(&[
            "N/A".to_string(),
            "WHEAT flour, water, salt".to_string(),
        ]);
        assert_eq!(normalized.ingredients, vec!["Wheat flour, water, salt"]);
        assert_eq!(normalized.ingredient_count, 3);
        assert_eq!(normalized.removed, 1);

        let serving = resolve_serving("1 portion (150g)", None, false);
        assert_eq!(serving.display, "150 g");

        let found = detect_allergens(&["Wheat flour, milk".to_string()], None, None, None).unwrap();
        assert!(found.allergens.contains(&AllergenCategory::Dairy));

        let config = AnalysisConfig::default();
        let sugar = score_sugar(&config, Some(0.0), "1 serving", None, false);
        assert_eq!(sugar.serving, "100 g");
    }
}
