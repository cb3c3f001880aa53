//! Micronutrient identifiers and detection results

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tracked micronutrients
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    VitaminA,
    VitaminB1,
    VitaminB2,
    VitaminB3,
    VitaminB6,
    VitaminB12,
    Folate,
    VitaminC,
    VitaminD,
    VitaminE,
    VitaminK,
    Calcium,
    Iron,
    Magnesium,
    Potassium,
    Zinc,
    Iodine,
    Selenium,
    Omega3,
}

impl Nutrient {
    pub fn as_str(&self) -> &'static str {
        match self {
            Nutrient::VitaminA => "vitamin_a",
            Nutrient::VitaminB1 => "vitamin_b1",
            Nutrient::VitaminB2 => "vitamin_b2",
            Nutrient::VitaminB3 => "vitamin_b3",
            Nutrient::VitaminB6 => "vitamin_b6",
            Nutrient::VitaminB12 => "vitamin_b12",
            Nutrient::Folate => "folate",
            Nutrient::VitaminC => "vitamin_c",
            Nutrient::VitaminD => "vitamin_d",
            Nutrient::VitaminE => "vitamin_e",
            Nutrient::VitaminK => "vitamin_k",
            Nutrient::Calcium => "calcium",
            Nutrient::Iron => "iron",
            Nutrient::Magnesium => "magnesium",
            Nutrient::Potassium => "potassium",
            Nutrient::Zinc => "zinc",
            Nutrient::Iodine => "iodine",
            Nutrient::Selenium => "selenium",
            Nutrient::Omega3 => "omega_3",
        }
    }

    /// Parse an identifier such as "vitamin_c", "Vitamin C" or "omega-3"
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        let nutrient = match normalized.as_str() {
            "vitamin_a" => Nutrient::VitaminA,
            "vitamin_b1" | "thiamin" | "thiamine" => Nutrient::VitaminB1,
            "vitamin_b2" | "riboflavin" => Nutrient::VitaminB2,
            "vitamin_b3" | "niacin" => Nutrient::VitaminB3,
            "vitamin_b6" => Nutrient::VitaminB6,
            "vitamin_b12" => Nutrient::VitaminB12,
            "folate" | "folic_acid" | "vitamin_b9" => Nutrient::Folate,
            "vitamin_c" => Nutrient::VitaminC,
            "vitamin_d" => Nutrient::VitaminD,
            "vitamin_e" => Nutrient::VitaminE,
            "vitamin_k" => Nutrient::VitaminK,
            "calcium" => Nutrient::Calcium,
            "iron" => Nutrient::Iron,
            "magnesium" => Nutrient::Magnesium,
            "potassium" => Nutrient::Potassium,
            "zinc" => Nutrient::Zinc,
            "iodine" => Nutrient::Iodine,
            "selenium" => Nutrient::Selenium,
            "omega_3" | "omega3" => Nutrient::Omega3,
            _ => return None,
        };
        Some(nutrient)
    }
}

/// Evidence behind a detected nutrient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientSource {
    Ingredient,
    Profile,
    Both,
}

impl NutrientSource {
    /// Combine two pieces of evidence for the same nutrient
    pub fn merge(self, other: NutrientSource) -> NutrientSource {
        if self == other {
            self
        } else {
            NutrientSource::Both
        }
    }
}

/// Nutrients judged present, one entry per nutrient
pub type NutrientDetection = BTreeMap<Nutrient, NutrientSource>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nutrient_names() {
        assert_eq!(Nutrient::from_str("Vitamin C"), Some(Nutrient::VitaminC));
        assert_eq!(Nutrient::from_str("omega-3"), Some(Nutrient::Omega3));
        assert_eq!(Nutrient::from_str("folic acid"), Some(Nutrient::Folate));
        assert_eq!(Nutrient::from_str("unobtainium"), None);
    }

    #[test]
    fn test_source_merge() {
        assert_eq!(NutrientSource::Ingredient.merge(NutrientSource::Ingredient), NutrientSource::Ingredient);
        assert_eq!(NutrientSource::Ingredient.merge(NutrientSource::Profile), NutrientSource::Both);
        assert_eq!(NutrientSource::Both.merge(NutrientSource::Profile), NutrientSource::Both);
    }
}
