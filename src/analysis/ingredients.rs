//! Ingredient text normalization
//!
//! Cleans the raw ingredient entries of a food record into a consistent,
//! de-duplicated list. Every other analysis reads the cleaned form.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// US spellings rewritten to the house (British) spelling, matched as whole words
const DIALECT_SPELLINGS: &[(&str, &str)] = &[
    ("flavor", "flavour"),
    ("flavors", "flavours"),
    ("flavored", "flavoured"),
    ("flavoring", "flavouring"),
    ("flavorings", "flavourings"),
    ("color", "colour"),
    ("colors", "colours"),
    ("colored", "coloured"),
    ("coloring", "colouring"),
    ("colorings", "colourings"),
    ("aluminum", "aluminium"),
    ("fiber", "fibre"),
    ("fibers", "fibres"),
    ("sulfite", "sulphite"),
    ("sulfites", "sulphites"),
    ("sulfur", "sulphur"),
    ("sulfate", "sulphate"),
    ("sulfates", "sulphates"),
    ("stabilizer", "stabiliser"),
    ("stabilizers", "stabilisers"),
    ("hydrolyzed", "hydrolysed"),
    ("caramelized", "caramelised"),
    ("pasteurized", "pasteurised"),
    ("homogenized", "homogenised"),
    ("carbonized", "carbonised"),
    ("oxidized", "oxidised"),
    ("modified food starch", "modified starch"),
    ("yogurt", "yoghurt"),
    ("chili", "chilli"),
    ("savory", "savoury"),
];

/// Uppercase abbreviations that survive case normalization
const ABBREVIATIONS: &[&str] = &[
    "UHT", "MSG", "DHA", "EPA", "ALA", "CLA", "MCT", "PGPR", "TBHQ", "BHA", "BHT", "DATEM",
    "HFCS", "GMO", "PDO", "PGI", "TVP", "BBQ", "UK", "EU", "USA", "RDA", "NRV", "DNA",
];

/// Entries that stand in for missing data rather than naming an ingredient
const PLACEHOLDERS: &[&str] = &[
    "n/a", "na", "none", "unknown", "tbc", "tba", "-", ".", "?", "not available", "not provided",
];

/// Prefixes of placeholder entries produced by upstream scanners
const PLACEHOLDER_PREFIXES: &[&str] = &[
    "processing ingredient image",
    "ingredient image",
    "ingredients not available",
    "ingredients not provided",
    "no ingredients",
    "no ingredient information",
];

static DIALECT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let mut words: Vec<&str> = DIALECT_SPELLINGS.iter().map(|(us, _)| *us).collect();
    words.sort_by(|a, b| b.len().cmp(&a.len()));
    let alternation = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("Invalid dialect regex")
});

static LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*ingredients?\s*[:\-]\s*").expect("Invalid label regex"));

static SPACE_BEFORE_PUNCT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.:;)])").expect("Invalid punctuation regex"));

static SPACE_AFTER_PAREN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s+").expect("Invalid parenthesis regex"));

static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}[\p{L}\p{N}]*").expect("Invalid token regex"));

static E_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\be\s?(\d{3,4})((?:iii|ii|iv|i|v|[a-z])?)\b").expect("Invalid E-number regex")
});

static VITAMIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(vitamins?)\s+([a-z])(\d{0,2})\b").expect("Invalid vitamin regex")
});

// ============================================================================
// Individual steps
// ============================================================================

/// Trim and collapse internal whitespace
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove spaces before `, . : ; )` and after `(`
pub fn tidy_punctuation(text: &str) -> String {
    let text = SPACE_BEFORE_PUNCT_REGEX.replace_all(text, "$1");
    SPACE_AFTER_PAREN_REGEX.replace_all(&text, "(").into_owned()
}

/// Exactly one space after each comma, leaving decimal commas ("1,5") alone
pub fn space_after_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        if c != ',' {
            continue;
        }
        let prev = i.checked_sub(1).and_then(|p| chars.get(p));
        let next = chars.get(i + 1);
        let decimal = matches!((prev, next), (Some(p), Some(n)) if p.is_ascii_digit() && n.is_ascii_digit());
        if let Some(n) = next {
            if !decimal && !n.is_whitespace() {
                out.push(' ');
            }
        }
    }

    collapse_whitespace(&out)
}

/// Rewrite US spellings to British ones, keeping the original capitalization
pub fn standardize_spelling(text: &str) -> String {
    DIALECT_REGEX
        .replace_all(text, |caps: &Captures| {
            let found = &caps[0];
            let lower = found.to_lowercase();
            let replacement = DIALECT_SPELLINGS
                .iter()
                .find(|(us, _)| *us == lower)
                .map(|(_, uk)| *uk)
                .unwrap_or(found);
            match_case(found, replacement)
        })
        .into_owned()
}

fn match_case(original: &str, replacement: &str) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        replacement.to_uppercase()
    } else if letters.first().is_some_and(|c| c.is_uppercase()) {
        capitalize(replacement)
    } else {
        replacement.to_string()
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether an uppercase token is an allow-listed abbreviation, exactly or as
/// a prefix followed by a non-letter ("DHA3")
fn is_abbreviation(token: &str) -> bool {
    ABBREVIATIONS.iter().any(|abbr| {
        token == *abbr
            || token
                .strip_prefix(abbr)
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| !c.is_alphabetic())
    })
}

fn is_shouting(token: &str) -> bool {
    token.chars().any(|c| c.is_alphabetic()) && !token.chars().any(|c| c.is_lowercase())
}

/// Lower-case all-uppercase tokens longer than two characters unless allow-listed
pub fn lowercase_shouting(text: &str) -> String {
    TOKEN_REGEX
        .replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            if token.chars().count() > 2 && is_shouting(token) && !is_abbreviation(token) {
                token.to_lowercase()
            } else {
                token.to_string()
            }
        })
        .into_owned()
}

/// First letter upper, the rest lower, allow-listed abbreviations kept
pub fn sentence_case(text: &str) -> String {
    let lowered = TOKEN_REGEX.replace_all(text, |caps: &Captures| {
        let token = &caps[0];
        if is_shouting(token) && is_abbreviation(token) {
            token.to_string()
        } else {
            token.to_lowercase()
        }
    });

    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => first.to_uppercase().chain(chars).collect(),
        Some(first) => std::iter::once(first).chain(chars).collect(),
        None => String::new(),
    }
}

/// Re-uppercase E-numbers ("e330" -> "E330") and vitamin letters ("vitamin b12" -> "vitamin B12")
pub fn restore_codes(text: &str) -> String {
    let text = E_NUMBER_REGEX.replace_all(text, |caps: &Captures| {
        format!("E{}{}", &caps[1], caps[2].to_lowercase())
    });
    VITAMIN_REGEX
        .replace_all(&text, |caps: &Captures| {
            format!("{} {}{}", &caps[1], caps[2].to_uppercase(), &caps[3])
        })
        .into_owned()
}

/// Whether `needle` occurs in `haystack` with no alphanumeric character on either side
pub fn contains_token(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
    })
}

/// Roman-numeral subtype suffixes on E-numbers, longest first ("e500ii")
const ROMAN_SUFFIXES: [&str; 5] = ["iii", "ii", "iv", "i", "v"];

/// Whether an additive code occurs as a token, allowing a roman-numeral subtype.
///
/// Both arguments are lower-cased. "e500" matches "e500ii" but not "e5001" or "e500d".
pub fn contains_code(haystack: &str, code: &str) -> bool {
    if code.is_empty() {
        return false;
    }
    let ends_token = |rest: &str| !rest.chars().next().is_some_and(|c| c.is_alphanumeric());

    haystack.match_indices(code).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        if before.is_some_and(|c| c.is_alphanumeric()) {
            return false;
        }
        let rest = &haystack[start + code.len()..];
        ends_token(rest)
            || ROMAN_SUFFIXES
                .iter()
                .any(|suffix| rest.strip_prefix(suffix).is_some_and(ends_token))
    })
}

/// Whether an entry carries no ingredient information
pub fn is_placeholder(entry: &str) -> bool {
    let lower = entry.trim().to_lowercase();
    let lower = lower.trim_end_matches(['.', '!']).trim();
    lower.is_empty()
        || PLACEHOLDERS.contains(&lower)
        || PLACEHOLDER_PREFIXES.iter().any(|p| lower.starts_with(p))
}

// ============================================================================
// Pipeline
// ============================================================================

/// Normalize a single ingredient entry. Returns None for empty or placeholder entries.
pub fn normalize_ingredient(raw: &str) -> Option<String> {
    let text = LABEL_REGEX.replace(raw, "");
    let text = collapse_whitespace(&text);
    if is_placeholder(&text) {
        return None;
    }

    let text = tidy_punctuation(&text);
    let text = space_after_commas(&text);
    let text = standardize_spelling(&text);
    let text = lowercase_shouting(&text);
    let text = sentence_case(&text);
    let text = restore_codes(&text);

    if is_placeholder(&text) {
        None
    } else {
        Some(text)
    }
}

/// Normalize an ingredient list: clean each entry, drop placeholders, and
/// de-duplicate case-insensitively keeping the first occurrence.
pub fn normalize_ingredients<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::with_capacity(raw.len());

    for entry in raw {
        let Some(normalized) = normalize_ingredient(entry.as_ref()) else {
            continue;
        };
        if seen.insert(normalized.to_lowercase()) {
            cleaned.push(normalized);
        }
    }

    cleaned
}

/// Join normalized entries into the single text the keyword scanners read
pub fn ingredient_text(ingredients: &[String]) -> String {
    ingredients.join(", ")
}

/// Split ingredient text into top-level items.
///
/// Commas inside parentheses or brackets and decimal commas do not split.
pub fn split_items(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut items = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' | ';' if depth == 0 => {
                let prev = i.checked_sub(1).and_then(|p| chars.get(p));
                let next = chars.get(i + 1);
                let decimal = matches!((prev, next), (Some(p), Some(n)) if p.is_ascii_digit() && n.is_ascii_digit());
                if !decimal {
                    let item = current.trim();
                    if !item.is_empty() {
                        items.push(item.to_string());
                    }
                    current.clear();
                    continue;
                }
            }
            _ => {}
        }
        current.push(c);
    }

    let item = current.trim();
    if !item.is_empty() {
        items.push(item.to_string());
    }
    items
}

/// Number of top-level ingredients across all entries
pub fn ingredient_count(ingredients: &[String]) -> usize {
    ingredients.iter().map(|entry| split_items(entry).len()).sum()
}
