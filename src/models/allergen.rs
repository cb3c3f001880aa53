//! Allergen categories

use serde::{Deserialize, Serialize};

/// The fourteen regulated allergen categories.
///
/// Declaration order is the display order; `Ord` follows it so sets of
/// categories always iterate in a stable sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllergenCategory {
    Gluten,
    Dairy,
    Eggs,
    Nuts,
    Peanuts,
    Soy,
    Fish,
    Shellfish,
    Sesame,
    Sulphites,
    Celery,
    Mustard,
    Lupin,
    Molluscs,
}

impl AllergenCategory {
    pub const ALL: [AllergenCategory; 14] = [
        AllergenCategory::Gluten,
        AllergenCategory::Dairy,
        AllergenCategory::Eggs,
        AllergenCategory::Nuts,
        AllergenCategory::Peanuts,
        AllergenCategory::Soy,
        AllergenCategory::Fish,
        AllergenCategory::Shellfish,
        AllergenCategory::Sesame,
        AllergenCategory::Sulphites,
        AllergenCategory::Celery,
        AllergenCategory::Mustard,
        AllergenCategory::Lupin,
        AllergenCategory::Molluscs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AllergenCategory::Gluten => "gluten",
            AllergenCategory::Dairy => "dairy",
            AllergenCategory::Eggs => "eggs",
            AllergenCategory::Nuts => "nuts",
            AllergenCategory::Peanuts => "peanuts",
            AllergenCategory::Soy => "soy",
            AllergenCategory::Fish => "fish",
            AllergenCategory::Shellfish => "shellfish",
            AllergenCategory::Sesame => "sesame",
            AllergenCategory::Sulphites => "sulphites",
            AllergenCategory::Celery => "celery",
            AllergenCategory::Mustard => "mustard",
            AllergenCategory::Lupin => "lupin",
            AllergenCategory::Molluscs => "molluscs",
        }
    }

    /// Display name, e.g. "Tree nuts"
    pub fn display_name(&self) -> &'static str {
        match self {
            AllergenCategory::Gluten => "Gluten",
            AllergenCategory::Dairy => "Dairy",
            AllergenCategory::Eggs => "Eggs",
            AllergenCategory::Nuts => "Tree nuts",
            AllergenCategory::Peanuts => "Peanuts",
            AllergenCategory::Soy => "Soy",
            AllergenCategory::Fish => "Fish",
            AllergenCategory::Shellfish => "Shellfish",
            AllergenCategory::Sesame => "Sesame",
            AllergenCategory::Sulphites => "Sulphites",
            AllergenCategory::Celery => "Celery",
            AllergenCategory::Mustard => "Mustard",
            AllergenCategory::Lupin => "Lupin",
            AllergenCategory::Molluscs => "Molluscs",
        }
    }

    /// Parse a user-supplied allergen name, accepting common aliases
    pub fn from_str(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        let category = match lower.as_str() {
            "gluten" | "wheat" | "cereals" => AllergenCategory::Gluten,
            "dairy" | "milk" | "lactose" => AllergenCategory::Dairy,
            "eggs" | "egg" => AllergenCategory::Eggs,
            "nuts" | "tree nuts" | "tree_nuts" | "treenuts" => AllergenCategory::Nuts,
            "peanuts" | "peanut" => AllergenCategory::Peanuts,
            "soy" | "soya" | "soybeans" => AllergenCategory::Soy,
            "fish" => AllergenCategory::Fish,
            "shellfish" | "crustaceans" => AllergenCategory::Shellfish,
            "sesame" | "sesame seeds" => AllergenCategory::Sesame,
            "sulphites" | "sulfites" | "sulphur dioxide" | "sulfur dioxide" => {
                AllergenCategory::Sulphites
            }
            "celery" => AllergenCategory::Celery,
            "mustard" => AllergenCategory::Mustard,
            "lupin" | "lupine" => AllergenCategory::Lupin,
            "molluscs" | "mollusks" | "mollusc" => AllergenCategory::Molluscs,
            _ => return None,
        };
        Some(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(AllergenCategory::from_str("Milk"), Some(AllergenCategory::Dairy));
        assert_eq!(AllergenCategory::from_str("tree nuts"), Some(AllergenCategory::Nuts));
        assert_eq!(AllergenCategory::from_str("sulfites"), Some(AllergenCategory::Sulphites));
        assert_eq!(AllergenCategory::from_str("kiwi"), None);
    }

    #[test]
    fn test_display_order_is_stable() {
        let mut sorted = AllergenCategory::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, AllergenCategory::ALL.to_vec());
    }
}
