//! Unit conversion constants and countable food nouns
//!
//! Provides unit recognition for serving descriptions and standard conversion factors.

// ============================================================================
// Volume Conversion Constants (to milliliters)
// ============================================================================

/// Milliliters per centiliter
pub const ML_PER_CL: f64 = 10.0;
/// Milliliters per liter
pub const ML_PER_LITER: f64 = 1000.0;

// ============================================================================
// Weight Conversion Constants (to grams)
// ============================================================================

/// Grams per milligram
pub const G_PER_MG: f64 = 0.001;
/// Grams per kilogram
pub const G_PER_KG: f64 = 1000.0;
/// Grams per ounce
pub const G_PER_OZ: f64 = 28.3495;

/// Countable food nouns accepted by the "1 <noun>" per-unit fallback.
///
/// Generic portion words ("serving", "portion", "pack") are absent.
pub const COUNTABLE_NOUNS: &[&str] = &[
    "hot dog",
    "spring roll",
    "sausage roll",
    "bagel",
    "bar",
    "biscuit",
    "bun",
    "burger",
    "burrito",
    "cake",
    "cookie",
    "croissant",
    "cupcake",
    "donut",
    "doughnut",
    "egg",
    "fillet",
    "flapjack",
    "kebab",
    "muffin",
    "nugget",
    "pancake",
    "pasty",
    "patty",
    "pie",
    "piece",
    "pizza",
    "roll",
    "samosa",
    "sandwich",
    "sausage",
    "scone",
    "slice",
    "taco",
    "tart",
    "waffle",
    "wrap",
];

// ============================================================================
// Unit Recognition
// ============================================================================

/// Get the conversion factor to grams for a weight unit
pub fn grams_per_unit(unit: &str) -> Option<f64> {
    let lower = unit.to_lowercase();
    let trimmed = lower.trim();

    match trimmed {
        "g" | "gr" | "gram" | "grams" | "gramme" | "grammes" => Some(1.0),
        "mg" | "milligram" | "milligrams" => Some(G_PER_MG),
        "kg" | "kilogram" | "kilograms" => Some(G_PER_KG),
        "oz" | "ounce" | "ounces" => Some(G_PER_OZ),
        _ => None,
    }
}

/// Get the conversion factor to milliliters for a volume unit
pub fn ml_per_unit(unit: &str) -> Option<f64> {
    let lower = unit.to_lowercase();
    let trimmed = lower.trim();

    match trimmed {
        "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => Some(1.0),
        "cl" | "centiliter" | "centiliters" | "centilitre" | "centilitres" => Some(ML_PER_CL),
        "l" | "liter" | "liters" | "litre" | "litres" => Some(ML_PER_LITER),
        _ => None,
    }
}

/// Match a countable food noun (singular or simple plural) to its canonical form
pub fn countable_noun(word: &str) -> Option<&'static str> {
    let lower = word.trim().to_lowercase();
    COUNTABLE_NOUNS.iter().copied().find(|noun| {
        lower == *noun
            || lower.strip_suffix('s') == Some(*noun)
            || lower.strip_suffix("es") == Some(*noun)
    })
}
