//! Sugar content scoring
//!
//! Grades sugar density (per 100g) and sugar per serving separately and
//! reports the less favourable of the two.

use crate::config::{SugarCutoffs, SugarThresholds};
use crate::models::{NormalizedServing, SugarGrade, SugarScore};

use super::display;

/// Grades in cutoff order, followed by the open-ended top grade
const GRADE_STEPS: [SugarGrade; 6] = [
    SugarGrade::Excellent,
    SugarGrade::VeryGood,
    SugarGrade::Good,
    SugarGrade::Moderate,
    SugarGrade::High,
    SugarGrade::VeryHigh,
];

/// Grade a sugar amount. Absent means no sugar; negative or non-finite is unknown.
pub fn grade(grams: Option<f64>, cutoffs: &SugarCutoffs) -> SugarGrade {
    let Some(grams) = grams else {
        return SugarGrade::Excellent;
    };
    if !grams.is_finite() || grams < 0.0 {
        return SugarGrade::Unknown;
    }

    cutoffs
        .bounds()
        .iter()
        .position(|bound| grams <= *bound)
        .map(|i| GRADE_STEPS[i])
        .unwrap_or(SugarGrade::VeryHigh)
}

/// Density grade from grams of sugar per 100g
pub fn density_grade(sugar_per_100g: Option<f64>, thresholds: &SugarThresholds) -> SugarGrade {
    grade(sugar_per_100g, &thresholds.density)
}

/// Serving grade from grams of sugar in one serving
pub fn serving_grade(
    sugar_per_serving: Option<f64>,
    is_liquid: bool,
    thresholds: &SugarThresholds,
) -> SugarGrade {
    let cutoffs = if is_liquid {
        &thresholds.liquid_serving
    } else {
        &thresholds.solid_serving
    };
    grade(sugar_per_serving, cutoffs)
}

/// Grams of sugar in a serving.
///
/// Per-unit servings carry no weight, so the 100g reference stands in.
pub fn sugar_per_serving(sugar_per_100g: Option<f64>, serving: &NormalizedServing) -> Option<f64> {
    let per_100g = sugar_per_100g?;
    let grams = serving.grams_equivalent().unwrap_or(100.0);
    Some(per_100g * grams / 100.0)
}

fn format_grams(grams: Option<f64>) -> String {
    match grams {
        Some(g) if g.is_finite() => format!("{:.1}g", g),
        Some(_) => "an invalid amount of".to_string(),
        None => "0g".to_string(),
    }
}

fn explanation(
    sugar_per_100g: Option<f64>,
    sugar_per_serving: Option<f64>,
    is_liquid: bool,
    density: SugarGrade,
    serving: SugarGrade,
) -> String {
    let reference = if is_liquid { "100ml" } else { "100g" };
    format!(
        "{} sugar per {} ({}); {} sugar per serving ({}).",
        format_grams(sugar_per_100g),
        reference,
        display::sugar_grade(density).label.to_lowercase(),
        format_grams(sugar_per_serving),
        display::sugar_grade(serving).label.to_lowercase(),
    )
}

fn recommendation(density: SugarGrade, serving: SugarGrade, is_liquid: bool) -> String {
    let reference = if is_liquid { "100ml" } else { "100g" };

    if density != SugarGrade::Unknown && serving != SugarGrade::Unknown && density != serving {
        return if density > serving {
            format!(
                "Sugar density drives this grade: it is sugar-dense per {}, so keep portions small.",
                reference
            )
        } else {
            "Serving size drives this grade: a single serving carries a lot of sugar, so consider a smaller portion."
                .to_string()
        };
    }

    let message = match density.worse(serving) {
        SugarGrade::Excellent | SugarGrade::VeryGood => "Low in sugar.",
        SugarGrade::Good => "A reasonable choice for sugar.",
        SugarGrade::Moderate => "Moderate sugar; enjoy in sensible portions.",
        SugarGrade::High | SugarGrade::VeryHigh => "High in sugar; best kept as an occasional treat.",
        SugarGrade::Unknown => "Sugar content could not be graded; check the label.",
    };
    message.to_string()
}

/// Score sugar content. Never fails: invalid input yields an unknown grade.
pub fn score_sugar(
    sugar_per_100g: Option<f64>,
    sugar_per_serving: Option<f64>,
    is_liquid: bool,
    thresholds: &SugarThresholds,
) -> SugarScore {
    let density = density_grade(sugar_per_100g, thresholds);
    let serving = serving_grade(sugar_per_serving, is_liquid, thresholds);
    let final_grade = density.worse(serving);

    if final_grade == SugarGrade::Unknown {
        tracing::warn!(
            "Sugar values could not be graded: per 100g {:?}, per serving {:?}",
            sugar_per_100g,
            sugar_per_serving
        );
    }

    SugarScore {
        density_grade: density,
        serving_grade: serving,
        final_grade,
        explanation: explanation(sugar_per_100g, sugar_per_serving, is_liquid, density, serving),
        recommendation: recommendation(density, serving, is_liquid),
    }
}
