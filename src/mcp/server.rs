//! FoodScan MCP Server Implementation
//!
//! Implements the MCP server with all FoodScan tools.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::analysis::{AnalysisCache, AnalysisOptions, Enrichment, FoodAnalysis};
use crate::config::AnalysisConfig;
use crate::db::Database;
use crate::models::{FoodRecord, Nutrition, VerificationStatus};
use crate::tools::analysis;
use crate::tools::analysis::{parse_categories, parse_micronutrients};
use crate::tools::status::StatusTracker;

/// FoodScan MCP Service
#[derive(Clone)]
pub struct FoodScanService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    config: AnalysisConfig,
    cache: Arc<AnalysisCache<FoodAnalysis>>,
    tool_router: ToolRouter<FoodScanService>,
}

impl FoodScanService {
    pub fn new(database_path: PathBuf, database: Database, config: AnalysisConfig) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            config,
            cache: Arc::new(AnalysisCache::new()),
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Analysis Parameter Structs
// ============================================================================

/// Nutrition per 100g (100ml for liquids); missing fields are zero
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct NutritionParams {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub sugar: f64,
    /// Sodium in mg
    #[serde(default)]
    pub sodium: f64,
}

impl From<NutritionParams> for Nutrition {
    fn from(p: NutritionParams) -> Self {
        Nutrition {
            calories: p.calories,
            protein: p.protein,
            carbs: p.carbs,
            fat: p.fat,
            fiber: p.fiber,
            sugar: p.sugar,
            sodium: p.sodium,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeFoodParams {
    /// Product name
    pub name: String,
    pub brand: Option<String>,
    /// Raw ingredient entries as printed or scanned
    pub ingredients: Option<Vec<String>>,
    /// Free-text serving, e.g. "1 portion (150g)"
    #[serde(default)]
    pub serving_description: String,
    /// Authoritative serving weight in grams, if known
    pub serving_size_g: Option<f64>,
    #[serde(default)]
    pub is_liquid: bool,
    /// Nutrition is given per item rather than per 100g
    #[serde(default)]
    pub is_per_unit: bool,
    /// unverified, submitted_for_review, user_verified or client_verified
    pub verification: Option<String>,

    // Nutrition per 100g (100ml for liquids)
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub sugar: f64,
    /// Sodium in mg
    #[serde(default)]
    pub sodium: f64,

    /// Percent daily value per nutrient, e.g. {"vitamin_c": 40}
    pub micronutrients: Option<BTreeMap<String, f64>>,

    /// Allergen categories to report (default all)
    pub tracked_allergens: Option<Vec<String>>,
    /// The user's own allergen categories
    pub user_allergens: Option<Vec<String>>,
    #[serde(default)]
    pub strict_nutrients: bool,

    /// Allergen names reported by an enrichment service
    pub enrichment_allergens: Option<Vec<String>>,
    /// Replacement ingredient text from an enrichment service
    pub enrichment_ingredients: Option<String>,
    /// Replacement per-100g nutrition from an enrichment service
    pub enrichment_nutrition: Option<NutritionParams>,
}

impl AnalyzeFoodParams {
    fn into_request(self) -> Result<(FoodRecord, AnalysisOptions), String> {
        let micronutrients = self
            .micronutrients
            .as_ref()
            .map(parse_micronutrients)
            .transpose()?;
        let tracked_allergens = self
            .tracked_allergens
            .as_deref()
            .map(parse_categories)
            .transpose()?;
        let user_allergens = self
            .user_allergens
            .as_deref()
            .map(parse_categories)
            .transpose()?;

        let enrichment = if self.enrichment_allergens.is_some()
            || self.enrichment_ingredients.is_some()
            || self.enrichment_nutrition.is_some()
        {
            Some(Enrichment {
                allergen_names: self.enrichment_allergens,
                ingredient_text: self.enrichment_ingredients,
                nutrition: self.enrichment_nutrition.map(Nutrition::from),
            })
        } else {
            None
        };

        let record = FoodRecord {
            name: self.name,
            brand: self.brand,
            ingredients: self.ingredients,
            nutrition: Nutrition {
                calories: self.calories,
                protein: self.protein,
                carbs: self.carbs,
                fat: self.fat,
                fiber: self.fiber,
                sugar: self.sugar,
                sodium: self.sodium,
            },
            serving_description: self.serving_description,
            serving_size_g: self.serving_size_g,
            is_liquid: self.is_liquid,
            is_per_unit: self.is_per_unit,
            verification: self
                .verification
                .as_deref()
                .map(VerificationStatus::from_str)
                .unwrap_or_default(),
            additives: None,
            micronutrients,
        };

        let options = AnalysisOptions {
            tracked_allergens,
            user_allergens,
            strict_nutrients: self.strict_nutrients,
            enrichment,
        };

        Ok((record, options))
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NormalizeIngredientsParams {
    /// Raw ingredient entries
    pub ingredients: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ResolveServingParams {
    /// Free-text serving, e.g. "2 slices (60g)"
    pub description: String,
    pub serving_size_g: Option<f64>,
    #[serde(default)]
    pub is_liquid: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DetectAllergensParams {
    pub ingredients: Vec<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    /// Categories to report (default all)
    pub tracked: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DetectPersonalAllergensParams {
    pub ingredients: Vec<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    /// The user's allergen categories
    pub user_allergens: Vec<String>,
    /// Allergen names from an enrichment service; used instead of the scan when non-empty
    pub enrichment_allergens: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeAdditivesParams {
    pub ingredients: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScoreSugarParams {
    /// Sugar in grams per 100g (100ml for liquids)
    pub sugar_per_100g: Option<f64>,
    #[serde(default)]
    pub serving_description: String,
    pub serving_size_g: Option<f64>,
    #[serde(default)]
    pub is_liquid: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DetectNutrientsParams {
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Percent daily value per nutrient, e.g. {"iron": 20}
    pub micronutrients: Option<BTreeMap<String, f64>>,
    /// Only count label values at or above the configured daily value
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FoodKeyParams {
    pub name: String,
    pub brand: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MarkVerifiedParams {
    pub name: String,
    pub brand: Option<String>,
    /// "user" or "client"
    pub verified_by: String,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl FoodScanService {
    // --- Status ---

    #[tool(description = "Get the current status of the FoodScan service including build info, additive database version, database status, and process information")]
    async fn foodscan_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database, self.cache.len());
        to_json(&status)
    }

    #[tool(description = "Get instructions for analyzing foods. Call this when starting a food analysis session or when unsure how to use the analysis tools.")]
    fn analysis_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::ANALYSIS_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(ANALYSIS_INSTRUCTIONS)]))
    }

    // --- Analysis ---

    #[tool(description = "Run the full analysis for a food: serving, cleaned ingredients, allergens, additives, sugar grade, processing grade and micronutrients. Uses stored review/verification markers.")]
    fn analyze_food(&self, Parameters(p): Parameters<AnalyzeFoodParams>) -> Result<CallToolResult, McpError> {
        let (record, options) = p.into_request().map_err(|e| McpError::internal_error(e, None))?;
        let result = analysis::analyze_food(&self.database, &self.cache, &self.config, record, options)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Clean raw ingredient entries: spelling, casing, punctuation, placeholders and duplicates")]
    fn normalize_ingredients(&self, Parameters(p): Parameters<NormalizeIngredientsParams>) -> Result<CallToolResult, McpError> {
        to_json(&analysis::normalize_ingredients(&p.ingredients))
    }

    #[tool(description = "Resolve a free-text serving description into an amount and unit, or a per-item serving")]
    fn resolve_serving(&self, Parameters(p): Parameters<ResolveServingParams>) -> Result<CallToolResult, McpError> {
        to_json(&analysis::resolve_serving(&p.description, p.serving_size_g, p.is_liquid))
    }

    #[tool(description = "Detect allergen categories in ingredients, name and brand")]
    fn detect_allergens(&self, Parameters(p): Parameters<DetectAllergensParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::detect_allergens(
            &p.ingredients,
            p.name.as_deref(),
            p.brand.as_deref(),
            p.tracked.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Detect allergens relevant to one user's allergen categories")]
    fn detect_personal_allergens(&self, Parameters(p): Parameters<DetectPersonalAllergensParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::detect_personal_allergens(
            &p.ingredients,
            p.name.as_deref(),
            p.brand.as_deref(),
            &p.user_allergens,
            p.enrichment_allergens.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "List additives found in ingredients with origin, risk level and explanation")]
    fn analyze_additives(&self, Parameters(p): Parameters<AnalyzeAdditivesParams>) -> Result<CallToolResult, McpError> {
        to_json(&analysis::analyze_additives(&p.ingredients))
    }

    #[tool(description = "Grade sugar content per 100g and per serving; the final grade is the worse of the two")]
    fn score_sugar(&self, Parameters(p): Parameters<ScoreSugarParams>) -> Result<CallToolResult, McpError> {
        to_json(&analysis::score_sugar(
            &self.config,
            p.sugar_per_100g,
            &p.serving_description,
            p.serving_size_g,
            p.is_liquid,
        ))
    }

    #[tool(description = "Detect micronutrients from ingredient keywords and label daily values")]
    fn detect_nutrients(&self, Parameters(p): Parameters<DetectNutrientsParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::detect_nutrients(&self.config, &p.ingredients, p.micronutrients.as_ref(), p.strict)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Markers ---

    #[tool(description = "Mark a food as submitted for catalog review")]
    fn mark_submitted_for_review(&self, Parameters(p): Parameters<FoodKeyParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::mark_submitted_for_review(&self.database, &self.cache, &p.name, p.brand.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Mark a food as verified against its label by the user or the client app")]
    fn mark_verified(&self, Parameters(p): Parameters<MarkVerifiedParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::mark_verified(&self.database, &self.cache, &p.name, p.brand.as_deref(), &p.verified_by)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get the stored review/verification markers for a food")]
    fn get_food_markers(&self, Parameters(p): Parameters<FoodKeyParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::get_food_markers(&self.database, &p.name, p.brand.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Remove all stored markers for a food")]
    fn clear_food_markers(&self, Parameters(p): Parameters<FoodKeyParams>) -> Result<CallToolResult, McpError> {
        let result = analysis::clear_food_markers(&self.database, &self.cache, &p.name, p.brand.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

#[tool_handler]
impl ServerHandler for FoodScanService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "foodscan".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("FoodScan".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "FoodScan - Rule-based analysis of packaged-food labels. \
                 IMPORTANT: Call analysis_instructions before a new analysis session. \
                 Full analysis: analyze_food. \
                 Single steps: normalize_ingredients, resolve_serving, detect_allergens, detect_personal_allergens, \
                 analyze_additives, score_sugar, detect_nutrients. \
                 Markers: mark_submitted_for_review, mark_verified, get_food_markers, clear_food_markers. \
                 Status: foodscan_status."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: serde_json::Value) -> AnalyzeFoodParams {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_analyze_params_build_record_and_options() {
        let (record, options) = params(serde_json::json!({
            "name": "Granola",
            "brand": "Hill",
            "ingredients": ["Oats, honey, almonds"],
            "sugar": 18.5,
            "verification": "user_verified",
            "micronutrients": {"iron": 20},
            "tracked_allergens": ["nuts", "gluten"],
            "strict_nutrients": true
        }))
        .into_request()
        .unwrap();

        assert_eq!(record.food_key(), "granola|hill");
        assert_eq!(record.nutrition.sugar, 18.5);
        assert_eq!(record.verification, VerificationStatus::UserVerified);
        assert_eq!(record.micronutrients.map(|m| m.len()), Some(1));
        assert_eq!(options.tracked_allergens.map(|t| t.len()), Some(2));
        assert!(options.strict_nutrients);
        assert!(options.enrichment.is_none());
    }

    #[test]
    fn test_analyze_params_reject_unknown_names() {
        let err = params(serde_json::json!({
            "name": "Granola",
            "user_allergens": ["unicorn"]
        }))
        .into_request()
        .unwrap_err();
        assert!(err.contains("unicorn"));
    }

    #[test]
    fn test_enrichment_params() {
        let (_, options) = params(serde_json::json!({
            "name": "Granola",
            "enrichment_allergens": ["Almond"]
        }))
        .into_request()
        .unwrap();
        let enrichment = options.enrichment.unwrap();
        assert_eq!(enrichment.allergen_names, Some(vec!["Almond".to_string()]));
        assert_eq!(enrichment.ingredient_text, None);
        assert_eq!(enrichment.nutrition, None);
    }

    #[test]
    fn test_enrichment_nutrition_params() {
        let (record, options) = params(serde_json::json!({
            "name": "Granola",
            "sugar": 30.0,
            "enrichment_nutrition": {"sugar": 4.5, "calories": 380}
        }))
        .into_request()
        .unwrap();
        assert_eq!(record.nutrition.sugar, 30.0);

        let nutrition = options.enrichment.unwrap().nutrition.unwrap();
        assert_eq!(nutrition.sugar, 4.5);
        assert_eq!(nutrition.calories, 380.0);
        assert_eq!(nutrition.fat, 0.0);
    }
}
