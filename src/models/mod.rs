//! Data models
//!
//! Rust structs for food records, analysis results and persisted markers.

mod additive;
mod allergen;
mod food_record;
mod grades;
mod markers;
mod nutrient;
mod nutrition;
mod serving;

pub use additive::{AdditiveOrigin, AdditiveRecord, PersistedAdditives, RiskLevel, Verdict};
pub use allergen::AllergenCategory;
pub use food_record::{food_key, FoodRecord, MicronutrientProfile, VerificationStatus};
pub use grades::{
    EvidenceStatus, ProcessingAssessment, ProcessingGrade, ProcessingLevel, SugarGrade, SugarScore,
};
pub use markers::{FoodMarkers, SavedAdditives, VerifiedBy};
pub use nutrient::{Nutrient, NutrientDetection, NutrientSource};
pub use nutrition::Nutrition;
pub use serving::{NormalizedServing, ServingSource, ServingUnit};
