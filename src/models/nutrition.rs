//! Shared nutrition data structure
//!
//! Values are per 100g (per 100ml for liquids) unless scaled to a serving.

use serde::{Deserialize, Serialize};

/// Nutritional information
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64, // grams
    #[serde(default)]
    pub carbs: f64, // grams
    #[serde(default)]
    pub fat: f64, // grams
    #[serde(default)]
    pub fiber: f64, // grams
    #[serde(default)]
    pub sugar: f64, // grams
    #[serde(default)]
    pub sodium: f64, // milligrams
}

impl Nutrition {
    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein: self.protein * multiplier,
            carbs: self.carbs * multiplier,
            fat: self.fat * multiplier,
            fiber: self.fiber * multiplier,
            sugar: self.sugar * multiplier,
            sodium: self.sodium * multiplier,
        }
    }
}

impl std::ops::Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_to_serving() {
        let per_100g = Nutrition {
            calories: 400.0,
            sugar: 20.0,
            sodium: 300.0,
            ..Default::default()
        };
        let serving = per_100g * 0.3;
        assert!((serving.calories - 120.0).abs() < 1e-9);
        assert!((serving.sugar - 6.0).abs() < 1e-9);
        assert!((serving.sodium - 90.0).abs() < 1e-9);
    }
}
