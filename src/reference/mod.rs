//! Embedded reference data
//!
//! Curated keyword tables and the versioned additive database, compiled into
//! the binary from `data/*.json` and parsed once on first use.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use serde::Deserialize;

use crate::models::{AdditiveOrigin, AllergenCategory, Nutrient, Verdict};

// ============================================================================
// Additives
// ============================================================================

/// One row of the additive reference table
#[derive(Debug, Clone, Deserialize)]
pub struct AdditiveEntry {
    /// E-number, absent for additives without one (e.g. modified starch)
    pub code: Option<String>,
    pub name: String,
    /// Curated display name overriding `name`
    pub display_name: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub origin: AdditiveOrigin,
    pub verdict: Verdict,
    pub overview: String,
    #[serde(default)]
    pub typical_uses: Vec<String>,
    /// Curated consumer explanation overriding the generated one
    pub explanation: Option<String>,
    #[serde(default)]
    pub child_warning: bool,
}

impl AdditiveEntry {
    /// Name shown to the consumer
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// The versioned additive database
#[derive(Debug, Clone, Deserialize)]
pub struct AdditiveTable {
    pub version: u32,
    #[serde(rename = "additives")]
    pub entries: Vec<AdditiveEntry>,
}

impl AdditiveTable {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

static ADDITIVES: LazyLock<AdditiveTable> = LazyLock::new(|| {
    AdditiveTable::from_json(include_str!("../../data/additives.json"))
        .expect("Failed to parse additives.json")
});

/// The embedded additive table
pub fn additives() -> &'static AdditiveTable {
    &ADDITIVES
}

// ============================================================================
// Allergens
// ============================================================================

/// Keywords for one allergen category, with phrases blanked out before matching
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryKeywords {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

/// Dairy terms and the plant-based qualifiers that cancel them
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DairyKeywords {
    pub terms: Vec<String>,
    pub plant_modifiers: Vec<String>,
    #[serde(default)]
    pub non_dairy_phrases: Vec<String>,
}

#[derive(Deserialize)]
struct AllergenData {
    categories: BTreeMap<String, CategoryKeywords>,
    dairy: DairyKeywords,
}

/// Allergen keyword sets for every category
#[derive(Debug, Clone)]
pub struct AllergenTable {
    pub categories: HashMap<AllergenCategory, CategoryKeywords>,
    pub dairy: DairyKeywords,
}

impl AllergenTable {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let data: AllergenData = serde_json::from_str(json)?;
        let mut categories = HashMap::new();
        for (name, keywords) in data.categories {
            match AllergenCategory::from_str(&name) {
                Some(category) => {
                    categories.insert(category, keywords);
                }
                None => tracing::warn!("Ignoring unknown allergen category '{}'", name),
            }
        }
        Ok(Self {
            categories,
            dairy: data.dairy,
        })
    }

    /// Keyword set for a non-dairy category
    pub fn keywords(&self, category: AllergenCategory) -> Option<&CategoryKeywords> {
        self.categories.get(&category)
    }
}

static ALLERGENS: LazyLock<AllergenTable> = LazyLock::new(|| {
    AllergenTable::from_json(include_str!("../../data/allergens.json"))
        .expect("Failed to parse allergens.json")
});

/// The embedded allergen keyword table
pub fn allergens() -> &'static AllergenTable {
    &ALLERGENS
}

// ============================================================================
// Nutrients
// ============================================================================

#[derive(Deserialize)]
struct NutrientData {
    keywords: BTreeMap<String, Vec<String>>,
}

/// Ingredient keywords that signal each micronutrient
#[derive(Debug, Clone, Default)]
pub struct NutrientKeywords {
    pub keywords: BTreeMap<Nutrient, Vec<String>>,
}

impl NutrientKeywords {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let data: NutrientData = serde_json::from_str(json)?;
        let mut keywords = BTreeMap::new();
        for (name, words) in data.keywords {
            match Nutrient::from_str(&name) {
                Some(nutrient) => {
                    keywords.insert(nutrient, words);
                }
                None => tracing::warn!("Ignoring unknown nutrient '{}'", name),
            }
        }
        Ok(Self { keywords })
    }
}

static NUTRIENTS: LazyLock<NutrientKeywords> = LazyLock::new(|| {
    NutrientKeywords::from_json(include_str!("../../data/nutrients.json"))
        .expect("Failed to parse nutrients.json")
});

/// The embedded nutrient keyword table
pub fn nutrients() -> &'static NutrientKeywords {
    &NUTRIENTS
}

// ============================================================================
// Processing
// ============================================================================

/// Keyword lists feeding the processing grade and the display policy
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessingKeywords {
    pub industrial_processes: Vec<String>,
    pub non_natural: Vec<String>,
    pub whole_food_names: Vec<String>,
    pub ultra_processed_names: Vec<String>,
    pub ultra_processed_brands: Vec<String>,
}

static PROCESSING: LazyLock<ProcessingKeywords> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../../data/processing.json"))
        .expect("Failed to parse processing.json")
});

/// The embedded processing keyword lists
pub fn processing() -> &'static ProcessingKeywords {
    &PROCESSING
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additive_table_loads() {
        let table = additives();
        assert!(table.version > 0);
        assert!(table.entries.iter().any(|e| e.code.as_deref() == Some("E330")));
        assert!(table.entries.iter().any(|e| e.code.is_none()));
    }

    #[test]
    fn test_additive_codes_are_unique() {
        let mut codes: Vec<&str> = additives()
            .entries
            .iter()
            .filter_map(|e| e.code.as_deref())
            .collect();
        let total = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), total);
    }

    #[test]
    fn test_every_non_dairy_category_has_keywords() {
        let table = allergens();
        for category in AllergenCategory::ALL {
            if category == AllergenCategory::Dairy {
                continue;
            }
            let keywords = table.keywords(category);
            assert!(
                keywords.is_some_and(|k| !k.keywords.is_empty()),
                "{} has no keywords",
                category.as_str()
            );
        }
        assert!(!table.dairy.terms.is_empty());
    }

    #[test]
    fn test_every_nutrient_has_keywords() {
        let table = nutrients();
        assert_eq!(table.keywords.len(), 19);
        assert!(table.keywords[&Nutrient::VitaminC].iter().any(|k| k == "ascorbic acid"));
    }

    #[test]
    fn test_processing_lists_load() {
        let lists = processing();
        assert!(!lists.industrial_processes.is_empty());
        assert!(!lists.ultra_processed_brands.is_empty());
    }

    #[test]
    fn test_additive_table_from_json() {
        let table = AdditiveTable::from_json(
            r#"{"version": 2, "additives": [
                {"code": null, "name": "Thing", "verdict": "neutral", "overview": "A thing"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(table.version, 2);
        assert_eq!(table.entries[0].display_name(), "Thing");
        assert_eq!(table.entries[0].origin, AdditiveOrigin::Unknown);
    }
}
