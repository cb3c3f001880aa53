//! Allergen detection
//!
//! Keyword classification of normalized ingredient text. Every category blanks
//! its exclusion phrases before matching; dairy has its own matcher that
//! ignores plant-based compounds such as "oat milk" or "cocoa butter".

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::AllergenCategory;
use crate::reference::{self, AllergenTable, CategoryKeywords, DairyKeywords};

/// Dairy words a plant modifier can qualify
const DAIRY_HEADS: &[&str] = &["milk", "cream", "butter", "yoghurt", "yogurt", "cheese", "drink"];

/// Compiled dairy rules
struct DairyMatcher {
    plant_compound: Regex,
    term: Regex,
    non_dairy_phrases: Vec<String>,
}

impl DairyMatcher {
    fn new(keywords: &DairyKeywords) -> Result<Self, regex::Error> {
        let modifiers = alternation(&keywords.plant_modifiers);
        let heads = alternation(DAIRY_HEADS);
        let plant_compound = Regex::new(&format!(
            r"\b(?:{modifiers})(?:[\s-]+(?:based|free))?[\s-]+(?:{heads})s?\b"
        ))?;
        let term = Regex::new(&format!(r"\b(?:{})\b", alternation(&keywords.terms)))?;

        Ok(Self {
            plant_compound,
            term,
            non_dairy_phrases: keywords.non_dairy_phrases.clone(),
        })
    }

    fn matches(&self, lower: &str) -> bool {
        let cleaned = blank_phrases(lower, &self.non_dairy_phrases);
        let cleaned = self.plant_compound.replace_all(&cleaned, " ");
        self.term.is_match(&cleaned)
    }
}

static DAIRY: LazyLock<DairyMatcher> = LazyLock::new(|| {
    DairyMatcher::new(&reference::allergens().dairy).expect("Invalid dairy keyword table")
});

/// Escaped regex alternation, longest words first
fn alternation<S: AsRef<str>>(words: &[S]) -> String {
    let mut words: Vec<&str> = words.iter().map(|w| w.as_ref()).collect();
    words.sort_by(|a, b| b.len().cmp(&a.len()));
    words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|")
}

/// Replace every occurrence of the given phrases with a space
fn blank_phrases(text: &str, phrases: &[String]) -> String {
    let mut sorted: Vec<&String> = phrases.iter().collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut out = text.to_string();
    for phrase in sorted {
        if !phrase.is_empty() && out.contains(phrase.as_str()) {
            out = out.replace(phrase.as_str(), " ");
        }
    }
    out
}

fn matches_keywords(lower: &str, keywords: &CategoryKeywords) -> bool {
    let cleaned = blank_phrases(lower, &keywords.exclusions);
    keywords.keywords.iter().any(|k| cleaned.contains(k.as_str()))
}

/// Whether lower-cased text contains dairy
pub fn contains_dairy(text: &str) -> bool {
    DAIRY.matches(&text.to_lowercase())
}

/// Whether text matches a single category against the given table
pub fn matches_category(text: &str, category: AllergenCategory, table: &AllergenTable) -> bool {
    let lower = text.to_lowercase();
    match category {
        AllergenCategory::Dairy => DAIRY.matches(&lower),
        _ => table
            .keywords(category)
            .is_some_and(|keywords| matches_keywords(&lower, keywords)),
    }
}

fn combined_text(ingredient_text: &str, name: Option<&str>, brand: Option<&str>) -> String {
    [Some(ingredient_text), name, brand]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" \n ")
}

/// Detect which of the tracked categories appear in the ingredient text, name or brand.
///
/// The result iterates in display order.
pub fn detect_allergens(
    ingredient_text: &str,
    name: Option<&str>,
    brand: Option<&str>,
    tracked: &BTreeSet<AllergenCategory>,
) -> BTreeSet<AllergenCategory> {
    let text = combined_text(ingredient_text, name, brand);
    if text.trim().is_empty() {
        return BTreeSet::new();
    }

    let table = reference::allergens();
    tracked
        .iter()
        .copied()
        .filter(|category| matches_category(&text, *category, table))
        .collect()
}

/// Detect every known category
pub fn detect_all_allergens(
    ingredient_text: &str,
    name: Option<&str>,
    brand: Option<&str>,
) -> BTreeSet<AllergenCategory> {
    let all: BTreeSet<AllergenCategory> = AllergenCategory::ALL.into_iter().collect();
    detect_allergens(ingredient_text, name, brand, &all)
}

/// Allergens relevant to one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "allergens", rename_all = "snake_case")]
pub enum PersonalAllergens {
    /// Names reported by the enrichment service, deduplicated
    Enrichment(Vec<String>),
    /// Keyword scan restricted to the user's categories
    Detected(BTreeSet<AllergenCategory>),
}

impl PersonalAllergens {
    pub fn is_empty(&self) -> bool {
        match self {
            PersonalAllergens::Enrichment(names) => names.is_empty(),
            PersonalAllergens::Detected(categories) => categories.is_empty(),
        }
    }

    /// Display names in category order
    pub fn display_names(&self) -> Vec<String> {
        match self {
            PersonalAllergens::Enrichment(names) => names.clone(),
            PersonalAllergens::Detected(categories) => categories
                .iter()
                .map(|c| c.display_name().to_string())
                .collect(),
        }
    }
}

/// Clean enrichment names: trimmed, capitalized, deduplicated case-insensitively,
/// known categories first in display order
fn clean_enrichment_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut cleaned: Vec<(Option<AllergenCategory>, String)> = Vec::new();

    for name in names {
        let trimmed = name.split_whitespace().collect::<Vec<_>>().join(" ");
        if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
            continue;
        }
        let mut chars = trimmed.chars();
        let display: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => continue,
        };
        cleaned.push((AllergenCategory::from_str(&display), display));
    }

    cleaned.sort_by_key(|(category, _)| (category.is_none(), *category));
    cleaned.into_iter().map(|(_, display)| display).collect()
}

/// Allergens for a user: the enrichment list when it has entries, otherwise
/// the keyword scan over the user's own categories.
pub fn detect_personal_allergens(
    ingredient_text: &str,
    name: Option<&str>,
    brand: Option<&str>,
    user_allergens: &BTreeSet<AllergenCategory>,
    enrichment: Option<&[String]>,
) -> PersonalAllergens {
    if let Some(names) = enrichment {
        let cleaned = clean_enrichment_names(names);
        if !cleaned.is_empty() {
            return PersonalAllergens::Enrichment(cleaned);
        }
    }

    PersonalAllergens::Detected(detect_allergens(ingredient_text, name, brand, user_allergens))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> BTreeSet<AllergenCategory> {
        detect_all_allergens(text, None, None)
    }

    #[test]
    fn test_dairy_positive() {
        assert!(contains_dairy("Whole milk"));
        assert!(contains_dairy("Cheddar cheese (milk)"));
        assert!(contains_dairy("Whey powder"));
        assert!(contains_dairy("Sodium caseinate"));
        assert!(contains_dairy("Ice cream"));
        assert!(contains_dairy("Buttermilk"));
    }

    #[test]
    fn test_dairy_plant_compounds_excluded() {
        assert!(!contains_dairy("Coconut milk"));
        assert!(!contains_dairy("Oat milk"));
        assert!(!contains_dairy("Soy milk"));
        assert!(!contains_dairy("Cocoa butter"));
        assert!(!contains_dairy("Peanut butter"));
        assert!(!contains_dairy("Plant-based cheese"));
        assert!(!contains_dairy("Cream of tartar"));
        assert!(!contains_dairy("Creamed coconut"));
    }

    #[test]
    fn test_dairy_exclusion_does_not_hide_real_dairy() {
        assert!(contains_dairy("Cocoa butter, skimmed milk powder"));
        assert!(contains_dairy("Oat milk, butter"));
    }

    #[test]
    fn test_nut_exclusions() {
        assert!(!detect("Coconut oil, nutmeg").contains(&AllergenCategory::Nuts));
        assert!(detect("Roasted hazelnuts").contains(&AllergenCategory::Nuts));
        let peanut = detect("Peanut oil");
        assert!(peanut.contains(&AllergenCategory::Peanuts));
        assert!(!peanut.contains(&AllergenCategory::Nuts));
    }

    #[test]
    fn test_gluten_and_egg_exclusions() {
        assert!(!detect("Buckwheat flour").contains(&AllergenCategory::Gluten));
        assert!(detect("Wheat flour").contains(&AllergenCategory::Gluten));
        assert!(!detect("Eggplant").contains(&AllergenCategory::Eggs));
        assert!(!detect("Veggie stock").contains(&AllergenCategory::Eggs));
        assert!(!detect("Maltodextrin").contains(&AllergenCategory::Gluten));
    }

    #[test]
    fn test_reggiano_is_not_egg() {
        let parmesan = detect("Parmigiano reggiano cheese");
        assert!(parmesan.contains(&AllergenCategory::Dairy));
        assert!(!parmesan.contains(&AllergenCategory::Eggs));
        assert!(!detect("Grated reggianito").contains(&AllergenCategory::Eggs));
        assert!(detect("Parmigiano reggiano, free range egg").contains(&AllergenCategory::Eggs));
    }

    #[test]
    fn test_result_in_display_order() {
        let found: Vec<_> = detect("Sesame seeds, wheat, milk").into_iter().collect();
        assert_eq!(
            found,
            vec![AllergenCategory::Gluten, AllergenCategory::Dairy, AllergenCategory::Sesame]
        );
    }

    #[test]
    fn test_only_tracked_categories_reported() {
        let tracked: BTreeSet<_> = [AllergenCategory::Dairy].into_iter().collect();
        let found = detect_allergens("Wheat flour, milk", None, None, &tracked);
        assert_eq!(found, tracked);
    }

    #[test]
    fn test_name_counts_as_evidence() {
        let found = detect_all_allergens("", Some("Salmon fillet"), None);
        assert!(found.contains(&AllergenCategory::Fish));
        assert!(detect_all_allergens("", None, None).is_empty());
    }

    #[test]
    fn test_personal_prefers_enrichment() {
        let user: BTreeSet<_> = [AllergenCategory::Dairy].into_iter().collect();
        let names = vec![
            "unlisted thing".to_string(),
            "milk".to_string(),
            " Milk ".to_string(),
            "gluten".to_string(),
        ];
        let result = detect_personal_allergens("Wheat", None, None, &user, Some(names.as_slice()));
        assert_eq!(
            result,
            PersonalAllergens::Enrichment(vec![
                "Gluten".to_string(),
                "Milk".to_string(),
                "Unlisted thing".to_string(),
            ])
        );
    }

    #[test]
    fn test_personal_falls_back_to_scan() {
        let user: BTreeSet<_> = [AllergenCategory::Dairy, AllergenCategory::Eggs].into_iter().collect();
        let empty: Vec<String> = vec!["  ".to_string()];
        let result = detect_personal_allergens("Milk, wheat", None, None, &user, Some(empty.as_slice()));
        assert_eq!(
            result,
            PersonalAllergens::Detected([AllergenCategory::Dairy].into_iter().collect())
        );
        assert_eq!(result.display_names(), vec!["Dairy"]);
    }
}
