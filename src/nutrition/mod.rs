//! Serving size module
//!
//! Handles unit recognition and serving resolution from free text.

pub mod serving;
pub mod units;

pub use serving::{extract_serving, is_plausible, per_unit_noun, resolve_serving};
pub use units::{countable_noun, grams_per_unit, ml_per_unit};
