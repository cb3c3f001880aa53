//! Normalized serving model

use serde::{Deserialize, Serialize};

use crate::nutrition::units::G_PER_OZ;

/// Unit of a normalized serving
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServingUnit {
    Grams,
    Millilitres,
    Ounces,
    /// Countable item label, e.g. "burger" or "slice"
    PerUnit(String),
}

impl ServingUnit {
    /// Short display label
    pub fn label(&self) -> &str {
        match self {
            ServingUnit::Grams => "g",
            ServingUnit::Millilitres => "ml",
            ServingUnit::Ounces => "oz",
            ServingUnit::PerUnit(noun) => noun.as_str(),
        }
    }

    /// Canonical mass/volume unit for a food category
    pub fn metric(is_liquid: bool) -> Self {
        if is_liquid {
            ServingUnit::Millilitres
        } else {
            ServingUnit::Grams
        }
    }
}

/// How a serving was determined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServingSource {
    /// Catalog-supplied serving weight
    Authoritative,
    /// Matched by a named extraction rule
    Extracted { rule: String },
    /// "1 <noun>" per-unit fallback
    CountableNoun,
    /// No usable signal; the per-100 reference was used
    Default,
}

/// Canonical serving size. `amount` is always positive and the unit label never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedServing {
    pub amount: f64,
    pub unit: ServingUnit,
    pub is_per_unit: bool,
    pub source: ServingSource,
}

impl NormalizedServing {
    /// The 100g / 100ml fallback serving
    pub fn reference(is_liquid: bool) -> Self {
        Self {
            amount: 100.0,
            unit: ServingUnit::metric(is_liquid),
            is_per_unit: false,
            source: ServingSource::Default,
        }
    }

    /// Approximate weight in grams (1ml treated as 1g); None for per-unit servings
    pub fn grams_equivalent(&self) -> Option<f64> {
        match self.unit {
            ServingUnit::Grams | ServingUnit::Millilitres => Some(self.amount),
            ServingUnit::Ounces => Some(self.amount * G_PER_OZ),
            ServingUnit::PerUnit(_) => None,
        }
    }

    /// Human-readable form, e.g. "150 g" or "1 burger"
    pub fn display(&self) -> String {
        let amount = if self.amount.fract() == 0.0 {
            format!("{}", self.amount as i64)
        } else {
            format!("{:.1}", self.amount)
        };
        format!("{} {}", amount, self.unit.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_serving() {
        let serving = NormalizedServing::reference(true);
        assert_eq!(serving.amount, 100.0);
        assert_eq!(serving.unit, ServingUnit::Millilitres);
        assert_eq!(serving.display(), "100 ml");
    }

    #[test]
    fn test_grams_equivalent() {
        let oz = NormalizedServing {
            amount: 2.0,
            unit: ServingUnit::Ounces,
            is_per_unit: false,
            source: ServingSource::Default,
        };
        assert!((oz.grams_equivalent().unwrap() - 56.699).abs() < 0.01);

        let burger = NormalizedServing {
            amount: 1.0,
            unit: ServingUnit::PerUnit("burger".to_string()),
            is_per_unit: true,
            source: ServingSource::CountableNoun,
        };
        assert_eq!(burger.grams_equivalent(), None);
        assert_eq!(burger.display(), "1 burger");
    }
}
