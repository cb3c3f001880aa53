//! Additive analysis
//!
//! Matches normalized ingredient text against the versioned additive table.
//! Saved results are reused while their version stamp matches the table.

use serde::{Deserialize, Serialize};

use crate::models::{AdditiveRecord, PersistedAdditives, RiskLevel};
use crate::reference::{AdditiveEntry, AdditiveTable};

use super::ingredients::{contains_code, contains_token};

/// Terms this short only match as whole tokens ("msg", "bha", "agar")
const SHORT_TERM_LEN: usize = 4;

/// Where an additive list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdditiveSource {
    Computed,
    Persisted,
}

/// Additives found in a food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveAnalysis {
    pub records: Vec<AdditiveRecord>,
    /// Table version the records correspond to
    pub db_version: u32,
    pub source: AdditiveSource,
}

impl AdditiveAnalysis {
    /// Records stamped for persistence
    pub fn to_persisted(&self) -> PersistedAdditives {
        PersistedAdditives {
            records: self.records.clone(),
            db_version: Some(self.db_version),
        }
    }

    pub fn count_at(&self, risk: RiskLevel) -> usize {
        self.records.iter().filter(|r| r.risk == risk).count()
    }

    pub fn has_child_warning(&self) -> bool {
        self.records.iter().any(|r| r.child_warning)
    }
}

/// Whether persisted records must be recomputed against the current table
pub fn needs_recompute(persisted: Option<&PersistedAdditives>, current_version: u32) -> bool {
    match persisted {
        None => true,
        Some(saved) => saved.db_version != Some(current_version),
    }
}

/// Lower-cased names and synonyms, with a singular form for plural names
fn match_terms(entry: &AdditiveEntry) -> Vec<String> {
    let mut terms = Vec::with_capacity(entry.synonyms.len() + 2);
    for term in std::iter::once(&entry.name).chain(entry.synonyms.iter()) {
        let lower = term.trim().to_lowercase();
        if lower.is_empty() {
            continue;
        }
        if lower.len() > 5 {
            if let Some(singular) = lower.strip_suffix('s') {
                terms.push(singular.to_string());
            }
        }
        terms.push(lower);
    }
    terms
}

/// Whether a table entry occurs in lower-cased ingredient text
pub fn entry_matches(entry: &AdditiveEntry, lower_text: &str) -> bool {
    let code_hit = entry
        .code
        .as_deref()
        .is_some_and(|code| contains_code(lower_text, &code.to_lowercase()));

    code_hit
        || match_terms(entry).iter().any(|term| {
            if term.len() <= SHORT_TERM_LEN {
                contains_token(lower_text, term)
            } else {
                lower_text.contains(term.as_str())
            }
        })
}

/// Consumer explanation: the curated text, or the overview plus typical uses
pub fn explanation(entry: &AdditiveEntry) -> String {
    if let Some(curated) = entry.explanation.as_deref().filter(|e| !e.trim().is_empty()) {
        return with_period(curated.trim());
    }

    let overview = entry.overview.trim().trim_end_matches('.');
    match entry.typical_uses.as_slice() {
        [] => with_period(overview),
        uses => format!("{}. Commonly used in {}.", overview, join_list(uses)),
    }
}

fn with_period(text: &str) -> String {
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{}.", text)
    }
}

/// "a", "a and b", "a, b and c"
fn join_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Build the consumer record for a matched entry
pub fn to_record(entry: &AdditiveEntry) -> AdditiveRecord {
    AdditiveRecord {
        code: entry.code.clone(),
        name: entry.display_name().to_string(),
        origin: entry.origin,
        explanation: explanation(entry),
        risk: RiskLevel::from(entry.verdict),
        child_warning: entry.child_warning,
    }
}

/// Scan ingredient text against the table, in table order
pub fn find_additives(ingredient_text: &str, table: &AdditiveTable) -> Vec<AdditiveRecord> {
    let lower = ingredient_text.to_lowercase();
    if lower.trim().is_empty() {
        return Vec::new();
    }

    table
        .entries
        .iter()
        .filter(|entry| entry_matches(entry, &lower))
        .map(to_record)
        .collect()
}

/// Additives for a food: persisted records when their stamp is current,
/// otherwise a fresh scan.
pub fn analyze_additives(
    ingredient_text: &str,
    persisted: Option<&PersistedAdditives>,
    table: &AdditiveTable,
) -> AdditiveAnalysis {
    if let Some(saved) = persisted.filter(|p| !needs_recompute(Some(*p), table.version)) {
        return AdditiveAnalysis {
            records: saved.records.clone(),
            db_version: table.version,
            source: AdditiveSource::Persisted,
        };
    }

    if let Some(saved) = persisted {
        tracing::debug!(
            "Additive stamp {:?} is not current (v{}), recomputing",
            saved.db_version,
            table.version
        );
    }

    AdditiveAnalysis {
        records: find_additives(ingredient_text, table),
        db_version: table.version,
        source: AdditiveSource::Computed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdditiveOrigin;
    use crate::reference;

    fn table() -> &'static AdditiveTable {
        reference::additives()
    }

    fn codes(records: &[AdditiveRecord]) -> Vec<Option<&str>> {
        records.iter().map(|r| r.code.as_deref()).collect()
    }

    #[test]
    fn test_codes_match_on_boundaries() {
        let found = find_additives("Acid (E330), colour E150d", table());
        assert_eq!(codes(&found), vec![Some("E150d"), Some("E330")]);

        // E3300 is not E330
        assert!(find_additives("Thing E3300", table()).is_empty());
    }

    #[test]
    fn test_roman_subtype_codes_match() {
        let found = find_additives("Raising agent (E500ii)", table());
        assert_eq!(codes(&found), vec![Some("E500")]);
    }

    #[test]
    fn test_names_and_synonyms_match() {
        let found = find_additives("Sugar, cocoa butter, emulsifier (soya lecithin), flavouring", table());
        assert_eq!(codes(&found), vec![Some("E322")]);

        let found = find_additives("Water, modified maize starch", table());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, None);
        assert_eq!(found[0].name, "Modified starch");
    }

    #[test]
    fn test_short_terms_need_whole_tokens() {
        assert!(find_additives("Seasoning (MSG)", table())
            .iter()
            .any(|r| r.code.as_deref() == Some("E621")));
        assert!(find_additives("Sugar, vinegar", table()).is_empty());
    }

    #[test]
    fn test_record_fields() {
        let found = find_additives("Sweetener (aspartame), colour (tartrazine)", table());
        assert_eq!(codes(&found), vec![Some("E102"), Some("E951")]);

        let tartrazine = &found[0];
        assert_eq!(tartrazine.risk, RiskLevel::High);
        assert!(tartrazine.child_warning);
        assert_eq!(tartrazine.origin, AdditiveOrigin::Synthetic);
        assert_eq!(
            tartrazine.explanation,
            "A synthetic lemon-yellow azo dye. Commonly used in soft drinks, sweets and desserts."
        );

        let aspartame = &found[1];
        assert!(aspartame.explanation.starts_with("Aspartame is an artificial sweetener"));
        assert!(!aspartame.child_warning);
    }

    #[test]
    fn test_display_name_override() {
        let found = find_additives("Flavour enhancer E621", table());
        assert_eq!(found[0].name, "MSG (monosodium glutamate)");
        assert_eq!(found[0].risk, RiskLevel::Moderate);
    }

    #[test]
    fn test_idempotent_and_order_stable() {
        let text = "Preservative (E211), citric acid, E102";
        let first = find_additives(text, table());
        let second = find_additives(text, table());
        assert_eq!(first, second);

        let reordered = find_additives("E102, citric acid, Preservative (E211)", table());
        assert_eq!(first, reordered);
    }

    #[test]
    fn test_empty_text() {
        assert!(find_additives("", table()).is_empty());
        assert!(find_additives("   ", table()).is_empty());
    }

    #[test]
    fn test_current_stamp_reuses_persisted() {
        let saved = PersistedAdditives {
            records: vec![],
            db_version: Some(table().version),
        };
        let result = analyze_additives("Citric acid", Some(&saved), table());
        assert_eq!(result.source, AdditiveSource::Persisted);
        assert!(result.records.is_empty());
    }

    #[test]
    fn test_stale_or_missing_stamp_recomputes() {
        let stale = PersistedAdditives {
            records: vec![],
            db_version: Some(table().version - 1),
        };
        let result = analyze_additives("Citric acid", Some(&stale), table());
        assert_eq!(result.source, AdditiveSource::Computed);
        assert_eq!(codes(&result.records), vec![Some("E330")]);

        let unstamped = PersistedAdditives { records: vec![], db_version: None };
        assert!(needs_recompute(Some(&unstamped), table().version));
        assert!(needs_recompute(None, table().version));

        let fresh = analyze_additives("Citric acid", None, table());
        assert_eq!(fresh.to_persisted().db_version, Some(table().version));
    }

    #[test]
    fn test_join_list() {
        assert_eq!(join_list(&["a".to_string()]), "a");
        assert_eq!(join_list(&["a".to_string(), "b".to_string()]), "a and b");
        assert_eq!(
            join_list(&["a".to_string(), "b".to_string(), "c".to_string()]),
            "a, b and c"
        );
    }
}
