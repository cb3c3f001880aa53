//! Offline utility to analyze a food record from a JSON file
//! Usage: cargo run --bin analyze_food -- <record.json> [--json] [--strict] [--allergens dairy,nuts]

use std::collections::BTreeSet;

use foodscan::analysis::{analyze_food, AnalysisOptions};
use foodscan::analysis::display;
use foodscan::config::AnalysisConfig;
use foodscan::models::{AllergenCategory, FoodRecord};

fn parse_allergens(list: &str) -> Result<BTreeSet<AllergenCategory>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| AllergenCategory::from_str(name).ok_or_else(|| format!("Unknown allergen category: {}", name)))
        .collect()
}

/// First positional argument, skipping the value that follows `--allergens`
fn record_path(args: &[String]) -> Option<&String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--allergens" {
            iter.next();
        } else if !arg.starts_with("--") {
            return Some(arg);
        }
    }
    None
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(path) = record_path(&args) else {
        eprintln!("Usage: analyze_food <record.json> [--json] [--strict] [--allergens dairy,nuts]");
        std::process::exit(2);
    };

    let json_output = args.iter().any(|a| a == "--json");
    let mut options = AnalysisOptions {
        strict_nutrients: args.iter().any(|a| a == "--strict"),
        ..Default::default()
    };
    if let Some(pos) = args.iter().position(|a| a == "--allergens") {
        let list = args.get(pos + 1).ok_or("--allergens needs a comma-separated list")?;
        options.user_allergens = Some(parse_allergens(list)?);
    }

    let config = AnalysisConfig::load()?;
    let record: FoodRecord = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let analysis = analyze_food(&record, &options, &config);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("{} [{}]", record.name, analysis.food_key);
    println!("  Serving: {}", analysis.serving.display());
    println!("  Ingredients: {}", analysis.ingredients.len());
    for ingredient in &analysis.ingredients {
        println!("    {}", ingredient);
    }

    let allergens: Vec<&str> = analysis.allergens.iter().map(|c| c.display_name()).collect();
    println!("  Allergens: {}", if allergens.is_empty() { "none".to_string() } else { allergens.join(", ") });
    if let Some(personal) = &analysis.personal_allergens {
        println!("  Your allergens: {}", personal.display_names().join(", "));
    }

    println!("  Additives (db v{}): {}", analysis.additives.db_version, analysis.additives.records.len());
    for additive in &analysis.additives.records {
        println!("    {} {} - {}",
            additive.code.as_deref().unwrap_or("-"),
            additive.name,
            display::risk_level(additive.risk).label
        );
    }

    println!("  Sugar: {} ({})", display::sugar_grade(analysis.sugar.final_grade).label, analysis.sugar.explanation);
    println!("  Processing: {} - {} [{:?}]",
        analysis.processing.grade.as_str(),
        analysis.processing.label,
        analysis.processing.status
    );
    if let Some(reason) = analysis.grade_visibility.reason {
        println!("    Hidden: {}", reason.message());
    }

    let nutrients: Vec<&str> = analysis.nutrients.keys().map(|n| n.as_str()).collect();
    println!("  Nutrients: {}", nutrients.join(", "));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_record_path_skips_allergen_list() {
        let flags_first = args(&["--allergens", "dairy,nuts", "--json", "cola.json"]);
        assert_eq!(record_path(&flags_first).map(String::as_str), Some("cola.json"));

        let path_first = args(&["cola.json", "--allergens", "dairy"]);
        assert_eq!(record_path(&path_first).map(String::as_str), Some("cola.json"));

        assert_eq!(record_path(&args(&["--allergens", "dairy"])), None);
    }
}
