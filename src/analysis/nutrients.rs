//! Micronutrient presence detection

use crate::config::NutrientThresholds;
use crate::models::{MicronutrientProfile, NutrientDetection, NutrientSource};
use crate::reference::{self, NutrientKeywords};

use super::ingredients::contains_token;

/// Keywords this short must match whole tokens ("iron" but not "ironbark")
const SHORT_KEYWORD_LEN: usize = 4;

fn keyword_present(lower_text: &str, keyword: &str) -> bool {
    // Vitamin names are whole tokens too: "vitamin b1" is not "vitamin b12", "vitamin a" is not "vitamin and"
    if keyword.len() <= SHORT_KEYWORD_LEN || keyword.starts_with("vitamin ") {
        contains_token(lower_text, keyword)
    } else {
        lower_text.contains(keyword)
    }
}

/// Nutrients signalled by ingredient keywords
pub fn nutrients_from_ingredients(ingredient_text: &str, keywords: &NutrientKeywords) -> NutrientDetection {
    let lower = ingredient_text.to_lowercase();
    if lower.trim().is_empty() {
        return NutrientDetection::new();
    }

    keywords
        .keywords
        .iter()
        .filter(|(_, words)| words.iter().any(|w| keyword_present(&lower, &w.to_lowercase())))
        .map(|(nutrient, _)| (*nutrient, NutrientSource::Ingredient))
        .collect()
}

/// Nutrients whose profile value is at least `min_daily_value` percent (or positive when None)
pub fn nutrients_from_profile(
    profile: &MicronutrientProfile,
    min_daily_value: Option<f64>,
) -> NutrientDetection {
    profile
        .iter()
        .filter(|(_, value)| value.is_finite())
        .filter(|(_, value)| match min_daily_value {
            Some(min) => **value >= min,
            None => **value > 0.0,
        })
        .map(|(nutrient, _)| (*nutrient, NutrientSource::Profile))
        .collect()
}

/// Detect micronutrients from ingredients and a daily-value profile.
///
/// Strict mode trusts only profile entries at or above the configured daily
/// value; otherwise any keyword or positive profile value counts. Each
/// nutrient appears once, tagged with every source that supports it.
pub fn detect_nutrients(
    ingredient_text: &str,
    profile: Option<&MicronutrientProfile>,
    strict: bool,
    thresholds: &NutrientThresholds,
) -> NutrientDetection {
    if strict {
        return profile
            .map(|p| nutrients_from_profile(p, Some(thresholds.strict_min_daily_value)))
            .unwrap_or_default();
    }

    let mut detected = nutrients_from_ingredients(ingredient_text, reference::nutrients());
    if let Some(profile) = profile {
        for (nutrient, source) in nutrients_from_profile(profile, None) {
            detected
                .entry(nutrient)
                .and_modify(|existing| *existing = existing.merge(source))
                .or_insert(source);
        }
    }
    detected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutrient;

    fn profile(entries: &[(Nutrient, f64)]) -> MicronutrientProfile {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_ingredient_keywords() {
        let found = detect_nutrients(
            "Orange juice, fortified with calcium carbonate",
            None,
            false,
            &NutrientThresholds::default(),
        );
        assert_eq!(found.get(&Nutrient::VitaminC), Some(&NutrientSource::Ingredient));
        assert_eq!(found.get(&Nutrient::Calcium), Some(&NutrientSource::Ingredient));
    }

    #[test]
    fn test_canonical_vitamin_names() {
        let found = nutrients_from_ingredients(
            "Vitamin C, vitamin B12, vitamin A, vitamin E",
            reference::nutrients(),
        );
        let nutrients: Vec<_> = found.keys().copied().collect();
        assert_eq!(
            nutrients,
            vec![Nutrient::VitaminA, Nutrient::VitaminB12, Nutrient::VitaminC, Nutrient::VitaminE]
        );

        let found = nutrients_from_ingredients("Vitamin B1, vitamin D3", reference::nutrients());
        assert!(found.contains_key(&Nutrient::VitaminB1));
        assert!(found.contains_key(&Nutrient::VitaminD));
        assert!(!found.contains_key(&Nutrient::VitaminB12));

        let found = nutrients_from_ingredients("Sugar, vitamin and mineral premix", reference::nutrients());
        assert!(!found.contains_key(&Nutrient::VitaminA));
    }

    #[test]
    fn test_short_keywords_are_whole_words() {
        let found = nutrients_from_ingredients("Ironbark honey", reference::nutrients());
        assert!(!found.contains_key(&Nutrient::Iron));
        let found = nutrients_from_ingredients("Reduced iron", reference::nutrients());
        assert!(found.contains_key(&Nutrient::Iron));
    }

    #[test]
    fn test_sources_merged_without_double_counting() {
        let p = profile(&[(Nutrient::VitaminC, 40.0), (Nutrient::Iron, 5.0), (Nutrient::Zinc, 0.0)]);
        let found = detect_nutrients("Ascorbic acid", Some(&p), false, &NutrientThresholds::default());
        assert_eq!(found.get(&Nutrient::VitaminC), Some(&NutrientSource::Both));
        assert_eq!(found.get(&Nutrient::Iron), Some(&NutrientSource::Profile));
        assert!(!found.contains_key(&Nutrient::Zinc));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_strict_mode_uses_profile_threshold() {
        let p = profile(&[(Nutrient::VitaminC, 40.0), (Nutrient::Iron, 14.9), (Nutrient::Calcium, 15.0)]);
        let found = detect_nutrients("Ascorbic acid, spinach", Some(&p), true, &NutrientThresholds::default());
        let nutrients: Vec<_> = found.keys().copied().collect();
        assert_eq!(nutrients, vec![Nutrient::VitaminC, Nutrient::Calcium]);
        assert!(found.values().all(|s| *s == NutrientSource::Profile));

        let none = detect_nutrients("Ascorbic acid", None, true, &NutrientThresholds::default());
        assert!(none.is_empty());
    }

    #[test]
    fn test_strict_threshold_is_configurable() {
        let p = profile(&[(Nutrient::VitaminD, 10.0)]);
        let lenient = NutrientThresholds { strict_min_daily_value: 10.0 };
        assert_eq!(detect_nutrients("", Some(&p), true, &lenient).len(), 1);
    }
}
