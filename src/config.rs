//! Analysis configuration
//!
//! Grade boundaries used by the sugar scorer, the processing grade calculator
//! and the nutrient detector. Defaults are built in; a JSON file named by
//! `FOODSCAN_CONFIG_PATH` may override any subset of them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an optional JSON override file
pub const CONFIG_PATH_ENV: &str = "FOODSCAN_CONFIG_PATH";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid range: {0}")]
    InvalidRange(&'static str),

    #[error("Value out of range: {0}")]
    ValueOutOfRange(&'static str),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Inclusive upper bounds for the first five sugar grades; anything above `high` is very high
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SugarCutoffs {
    pub excellent: f64,
    pub very_good: f64,
    pub good: f64,
    pub moderate: f64,
    pub high: f64,
}

impl SugarCutoffs {
    /// Bounds from most to least favourable
    pub fn bounds(&self) -> [f64; 5] {
        [self.excellent, self.very_good, self.good, self.moderate, self.high]
    }

    fn validate(&self, what: &'static str) -> Result<(), ConfigError> {
        let bounds = self.bounds();
        if bounds.iter().any(|b| !b.is_finite() || *b < 0.0) {
            return Err(ConfigError::ValueOutOfRange(what));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::InvalidRange(what));
        }
        Ok(())
    }
}

/// Sugar grade boundaries in grams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SugarThresholds {
    /// Grams of sugar per 100g
    pub density: SugarCutoffs,
    /// Grams of sugar per solid serving
    pub solid_serving: SugarCutoffs,
    /// Grams of sugar per liquid serving
    pub liquid_serving: SugarCutoffs,
}

impl Default for SugarThresholds {
    fn default() -> Self {
        Self {
            density: SugarCutoffs {
                excellent: 0.5,
                very_good: 5.0,
                good: 10.0,
                moderate: 15.0,
                high: 22.5,
            },
            solid_serving: SugarCutoffs {
                excellent: 1.0,
                very_good: 5.0,
                good: 10.0,
                moderate: 15.0,
                high: 25.0,
            },
            liquid_serving: SugarCutoffs {
                excellent: 2.0,
                very_good: 7.5,
                good: 12.5,
                moderate: 20.0,
                high: 30.0,
            },
        }
    }
}

impl SugarThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        self.density.validate("sugar density cutoffs must be ascending and non-negative")?;
        self.solid_serving
            .validate("solid serving cutoffs must be ascending and non-negative")?;
        self.liquid_serving
            .validate("liquid serving cutoffs must be ascending and non-negative")?;

        let liquid_lenient = self
            .liquid_serving
            .bounds()
            .iter()
            .zip(self.solid_serving.bounds())
            .all(|(liquid, solid)| *liquid >= solid);
        if !liquid_lenient {
            return Err(ConfigError::InvalidRange(
                "liquid serving cutoffs must be >= solid serving cutoffs",
            ));
        }
        Ok(())
    }
}

/// Minimum scores for each processing grade, checked from A+ down
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeBands {
    pub a_plus: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

/// Processing level and grade boundaries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingThresholds {
    /// Highest point total still counted as unprocessed
    pub unprocessed_max_points: u32,
    /// Highest point total still counted as minimally processed
    pub minimally_processed_max_points: u32,
    /// Highest point total still counted as processed; above is ultra-processed
    pub processed_max_points: u32,
    /// Score bands for A+ through D; below `d` is F
    pub grade_bands: GradeBands,
    /// Sugar per 100g at which the weak-evidence default drops a grade
    pub weak_evidence_sugar_g: f64,
}

impl Default for ProcessingThresholds {
    fn default() -> Self {
        Self {
            unprocessed_max_points: 0,
            minimally_processed_max_points: 2,
            processed_max_points: 6,
            grade_bands: GradeBands {
                a_plus: 90.0,
                a: 80.0,
                b: 65.0,
                c: 50.0,
                d: 35.0,
            },
            weak_evidence_sugar_g: 22.5,
        }
    }
}

impl ProcessingThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.unprocessed_max_points >= self.minimally_processed_max_points
            || self.minimally_processed_max_points >= self.processed_max_points
        {
            return Err(ConfigError::InvalidRange(
                "processing level points must be strictly ascending",
            ));
        }

        let bands = &self.grade_bands;
        let ordered = [bands.a_plus, bands.a, bands.b, bands.c, bands.d];
        if ordered.iter().any(|b| !b.is_finite() || *b < 0.0 || *b > 100.0) {
            return Err(ConfigError::ValueOutOfRange("grade bands must be within 0-100"));
        }
        if ordered.windows(2).any(|w| w[0] <= w[1]) {
            return Err(ConfigError::InvalidRange(
                "grade bands must be strictly descending from A+ to D",
            ));
        }

        if !self.weak_evidence_sugar_g.is_finite() || self.weak_evidence_sugar_g < 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "weak_evidence_sugar_g must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Nutrient detection boundaries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutrientThresholds {
    /// Minimum percent daily value for a profile entry to count in strict mode
    pub strict_min_daily_value: f64,
}

impl Default for NutrientThresholds {
    fn default() -> Self {
        Self {
            strict_min_daily_value: 15.0,
        }
    }
}

impl NutrientThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.strict_min_daily_value) {
            return Err(ConfigError::ValueOutOfRange(
                "strict_min_daily_value must be a percentage (0-100)",
            ));
        }
        Ok(())
    }
}

/// All analysis boundaries
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sugar: SugarThresholds,
    pub processing: ProcessingThresholds,
    pub nutrients: NutrientThresholds,
}

impl AnalysisConfig {
    /// Load the configuration: defaults, overridden by `FOODSCAN_CONFIG_PATH` if set
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Read and validate a JSON override file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        tracing::info!("Loaded analysis config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse and validate a JSON document; missing sections keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sugar.validate()?;
        self.processing.validate()?;
        self.nutrients.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config =
            AnalysisConfig::from_json(r#"{"nutrients": {"strict_min_daily_value": 20}}"#).unwrap();
        assert_eq!(config.nutrients.strict_min_daily_value, 20.0);
        assert_eq!(config.sugar, SugarThresholds::default());
        assert_eq!(config.processing, ProcessingThresholds::default());
    }

    #[test]
    fn test_unordered_cutoffs_rejected() {
        let mut config = AnalysisConfig::default();
        config.sugar.density.good = 2.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRange(_))));
    }

    #[test]
    fn test_liquid_stricter_than_solid_rejected() {
        let mut config = AnalysisConfig::default();
        config.sugar.liquid_serving.excellent = 0.5;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRange(_))));
    }

    #[test]
    fn test_grade_bands_must_descend() {
        let mut config = AnalysisConfig::default();
        config.processing.grade_bands.b = 85.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRange(_))));

        config = AnalysisConfig::default();
        config.processing.grade_bands.a_plus = 120.0;
        assert!(matches!(config.validate(), Err(ConfigError::ValueOutOfRange(_))));
    }

    #[test]
    fn test_percentage_out_of_range() {
        let result = AnalysisConfig::from_json(r#"{"nutrients": {"strict_min_daily_value": 150}}"#);
        assert!(matches!(result, Err(ConfigError::ValueOutOfRange(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            AnalysisConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
