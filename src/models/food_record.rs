//! Food Record model
//!
//! The read-only input to every analysis: a catalog entry with per-100g
//! nutrition, free-text serving and ingredient data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Nutrient, Nutrition, PersistedAdditives};

/// Verification status of a food record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unverified,
    /// Sent to the catalog for review; ingredients may not be known yet
    SubmittedForReview,
    /// Confirmed by the user against the physical label
    UserVerified,
    /// Confirmed by the client application (e.g. barcode match)
    ClientVerified,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Unverified => "unverified",
            VerificationStatus::SubmittedForReview => "submitted_for_review",
            VerificationStatus::UserVerified => "user_verified",
            VerificationStatus::ClientVerified => "client_verified",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "submitted_for_review" | "submitted" | "pending" => VerificationStatus::SubmittedForReview,
            "user_verified" | "verified" => VerificationStatus::UserVerified,
            "client_verified" => VerificationStatus::ClientVerified,
            _ => VerificationStatus::Unverified,
        }
    }

    /// Whether the record's data has been confirmed by someone
    pub fn is_verified(&self) -> bool {
        matches!(
            self,
            VerificationStatus::UserVerified | VerificationStatus::ClientVerified
        )
    }
}

/// Percent daily value per nutrient, as printed on the label
pub type MicronutrientProfile = BTreeMap<Nutrient, f64>;

/// A food record from the catalog or diary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodRecord {
    pub name: String,
    pub brand: Option<String>,
    /// Raw ingredient entries, possibly containing placeholders
    pub ingredients: Option<Vec<String>>,
    /// Nutrition per 100g (or 100ml for liquids)
    #[serde(default)]
    pub nutrition: Nutrition,
    #[serde(default)]
    pub serving_description: String,
    /// Authoritative serving weight from the catalog
    pub serving_size_g: Option<f64>,
    #[serde(default)]
    pub is_liquid: bool,
    #[serde(default)]
    pub is_per_unit: bool,
    #[serde(default)]
    pub verification: VerificationStatus,
    pub additives: Option<PersistedAdditives>,
    pub micronutrients: Option<MicronutrientProfile>,
}

impl FoodRecord {
    /// Composite key used by the persistence layer and the analysis cache
    pub fn food_key(&self) -> String {
        food_key(&self.name, self.brand.as_deref())
    }

    /// Ingredient entries, treating an empty list the same as a missing one
    pub fn raw_ingredients(&self) -> &[String] {
        self.ingredients.as_deref().unwrap_or(&[])
    }
}

/// Build the name+brand composite key
pub fn food_key(name: &str, brand: Option<&str>) -> String {
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let brand = brand
        .map(|b| b.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .unwrap_or_default();
    format!("{}|{}", name, brand)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_key_ignores_case_and_spacing() {
        assert_eq!(
            food_key("  Chocolate   Bar ", Some("ACME")),
            food_key("chocolate bar", Some("acme"))
        );
        assert_eq!(food_key("Apple", None), "apple|");
    }

    #[test]
    fn test_verification_status_parsing() {
        assert_eq!(
            VerificationStatus::from_str("submitted-for-review"),
            VerificationStatus::SubmittedForReview
        );
        assert_eq!(VerificationStatus::from_str("client_verified"), VerificationStatus::ClientVerified);
        assert_eq!(VerificationStatus::from_str("garbage"), VerificationStatus::Unverified);
        assert!(VerificationStatus::UserVerified.is_verified());
        assert!(!VerificationStatus::SubmittedForReview.is_verified());
    }
}
