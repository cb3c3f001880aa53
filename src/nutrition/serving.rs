//! Serving size resolution
//!
//! Turns a catalog serving description such as "1 portion (150g)" into a
//! [`NormalizedServing`]. Extraction is an ordered list of rules; the first
//! rule to produce a plausible amount wins.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::units::{countable_noun, grams_per_unit, ml_per_unit, G_PER_OZ};
use crate::models::{NormalizedServing, ServingSource, ServingUnit};

/// Plausible serving weight in grams (inclusive)
pub const GRAMS_RANGE: (f64, f64) = (5.0, 500.0);
/// Plausible serving volume in millilitres (inclusive)
pub const MILLILITRES_RANGE: (f64, f64) = (5.0, 2000.0);
/// The per-100 reference amount printed on every label; never a real serving
pub const REFERENCE_AMOUNT: f64 = 100.0;

const NUM: &str = r"(?P<amount>\d+(?:[.,]\d+)?)";
const GRAMS: &str = r"(?P<unit>g|gr|grams?|grammes?)";
const MILLILITRES: &str = r"(?P<unit>ml|millilitres?|milliliters?|cl|l|litres?|liters?)";
const QUALIFIER: &str = r"(?:serving|portion|pack|packet|bag|pot|can|bottle)";
const APPROX: &str = r"(?:approx\.?|about|ca\.?|~)?";

/// One extraction rule: a pattern with `amount`/`unit` groups and the unit it yields
pub struct ServingRule {
    pub name: &'static str,
    pattern: Regex,
    pub unit: ServingUnit,
}

impl ServingRule {
    fn new(name: &'static str, pattern: String, unit: ServingUnit) -> Self {
        Self {
            name,
            pattern: Regex::new(&format!("(?i){}", pattern))
                .unwrap_or_else(|e| panic!("Invalid serving rule '{}': {}", name, e)),
            unit,
        }
    }

    /// All candidate amounts in this rule's unit, in order of appearance
    fn candidates<'a>(&'a self, text: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.pattern
            .captures_iter(text)
            .filter_map(move |caps| self.amount(&caps))
    }

    fn amount(&self, caps: &Captures) -> Option<f64> {
        // Fluid ounces are a volume, not a weight
        if caps.name("reject").is_some() {
            return None;
        }
        let raw = caps.name("amount")?.as_str().replace(',', ".");
        let value: f64 = raw.parse().ok()?;
        let unit_word = caps.name("unit").map(|m| m.as_str()).unwrap_or_default();

        let factor = match self.unit {
            ServingUnit::Grams => grams_per_unit(unit_word)?,
            ServingUnit::Millilitres => ml_per_unit(unit_word)?,
            ServingUnit::Ounces => grams_per_unit(unit_word)? / G_PER_OZ,
            ServingUnit::PerUnit(_) => return None,
        };
        Some(value * factor)
    }
}

/// Extraction cascade in priority order
pub static SERVING_RULES: LazyLock<Vec<ServingRule>> = LazyLock::new(|| {
    vec![
        // "1 portion (150g)" - a parenthetical weight beats every other number
        ServingRule::new(
            "parenthetical_grams",
            format!(r"\(\s*{APPROX}\s*{NUM}\s*{GRAMS}\s*\)"),
            ServingUnit::Grams,
        ),
        ServingRule::new(
            "parenthetical_millilitres",
            format!(r"\(\s*{APPROX}\s*{NUM}\s*{MILLILITRES}\s*\)"),
            ServingUnit::Millilitres,
        ),
        // "30g serving", "45 g per pack"
        ServingRule::new(
            "qualified_grams",
            format!(r"{NUM}\s*{GRAMS}\s+(?:per\s+|a\s+|each\s+)?{QUALIFIER}\b"),
            ServingUnit::Grams,
        ),
        ServingRule::new(
            "qualified_millilitres",
            format!(r"{NUM}\s*{MILLILITRES}\s+(?:per\s+|a\s+|each\s+)?{QUALIFIER}\b"),
            ServingUnit::Millilitres,
        ),
        // "serving size: 30g", "pack of 45g"
        ServingRule::new(
            "qualifier_then_grams",
            format!(r"{QUALIFIER}(?:\s+size)?\s*(?:of|:|-)?\s*{NUM}\s*{GRAMS}\b"),
            ServingUnit::Grams,
        ),
        ServingRule::new(
            "qualifier_then_millilitres",
            format!(r"{QUALIFIER}(?:\s+size)?\s*(?:of|:|-)?\s*{NUM}\s*{MILLILITRES}\b"),
            ServingUnit::Millilitres,
        ),
        // "2 biscuits = 25g"
        ServingRule::new(
            "yield_grams",
            format!(r"=\s*{APPROX}\s*{NUM}\s*{GRAMS}\b"),
            ServingUnit::Grams,
        ),
        ServingRule::new(
            "yield_millilitres",
            format!(r"=\s*{APPROX}\s*{NUM}\s*{MILLILITRES}\b"),
            ServingUnit::Millilitres,
        ),
        // "30g", "250 ml"
        ServingRule::new("bare_grams", format!(r"{NUM}\s*{GRAMS}\b"), ServingUnit::Grams),
        ServingRule::new(
            "bare_millilitres",
            format!(r"{NUM}\s*{MILLILITRES}\b"),
            ServingUnit::Millilitres,
        ),
        // "1 oz"; "8 fl oz" is captured as `reject`
        ServingRule::new(
            "ounces",
            format!(r"{NUM}\s*(?P<reject>fl\.?\s*)?(?P<unit>oz|ounces?)\b"),
            ServingUnit::Ounces,
        ),
    ]
});

/// Size words allowed between "1" and the countable noun
const SIZE_WORDS: &[&str] = &["small", "medium", "large", "regular", "mini", "whole", "standard"];

/// Whether an extracted amount is a believable serving in the given unit
pub fn is_plausible(amount: f64, unit: &ServingUnit) -> bool {
    let (min, max, value) = match unit {
        ServingUnit::Grams => (GRAMS_RANGE.0, GRAMS_RANGE.1, amount),
        ServingUnit::Millilitres => (MILLILITRES_RANGE.0, MILLILITRES_RANGE.1, amount),
        ServingUnit::Ounces => (GRAMS_RANGE.0, GRAMS_RANGE.1, amount * G_PER_OZ),
        ServingUnit::PerUnit(_) => return amount > 0.0,
    };
    value.is_finite() && value >= min && value <= max && value != REFERENCE_AMOUNT
}

/// Run the extraction cascade over a description.
///
/// Returns the first plausible amount together with the rule that produced it.
pub fn extract_serving(description: &str) -> Option<(f64, &'static ServingRule)> {
    for rule in SERVING_RULES.iter() {
        for amount in rule.candidates(description) {
            if is_plausible(amount, &rule.unit) {
                return Some((amount, rule));
            }
            tracing::debug!(
                "Serving rule '{}' rejected {} {} in '{}'",
                rule.name,
                amount,
                rule.unit.label(),
                description
            );
        }
    }
    None
}

/// Detect "1 burger" style per-unit descriptions
pub fn per_unit_noun(description: &str) -> Option<&'static str> {
    let lower = description.trim().to_lowercase();
    let mut rest = lower.strip_prefix("1 ")?.trim_start();

    for size in SIZE_WORDS {
        if let Some(stripped) = rest.strip_prefix(size).and_then(|r| r.strip_prefix(' ')) {
            rest = stripped.trim_start();
            break;
        }
    }

    // Leading words up to the first digit or punctuation: "hot dogs (90g)" -> ["hot", "dogs"]
    let phrase = rest
        .split(|c: char| !(c.is_alphabetic() || c == ' '))
        .next()
        .unwrap_or_default();
    let words: Vec<&str> = phrase.split_whitespace().take(2).collect();

    match words.as_slice() {
        [first, second] => countable_noun(&format!("{} {}", first, second))
            .or_else(|| countable_noun(first)),
        [first] => countable_noun(first),
        _ => None,
    }
}

/// Resolve the canonical serving for a food.
///
/// Never fails: an authoritative weight wins, then the extraction cascade,
/// then the "1 <noun>" fallback, then 100g (100ml for liquids).
pub fn resolve_serving(
    description: &str,
    serving_size_g: Option<f64>,
    is_liquid: bool,
) -> NormalizedServing {
    if let Some(grams) = serving_size_g.filter(|g| g.is_finite() && *g > 0.0) {
        return NormalizedServing {
            amount: grams,
            unit: ServingUnit::metric(is_liquid),
            is_per_unit: false,
            source: ServingSource::Authoritative,
        };
    }

    if let Some((amount, rule)) = extract_serving(description) {
        return NormalizedServing {
            amount,
            unit: rule.unit.clone(),
            is_per_unit: false,
            source: ServingSource::Extracted {
                rule: rule.name.to_string(),
            },
        };
    }

    if let Some(noun) = per_unit_noun(description) {
        return NormalizedServing {
            amount: 1.0,
            unit: ServingUnit::PerUnit(noun.to_string()),
            is_per_unit: true,
            source: ServingSource::CountableNoun,
        };
    }

    if !description.trim().is_empty() {
        tracing::debug!("No serving signal in '{}', using per-100 reference", description);
    }
    NormalizedServing::reference(is_liquid)
}
