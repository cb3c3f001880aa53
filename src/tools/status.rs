//! FoodScan Status Tool
//!
//! Provides runtime status information about the FoodScan service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::migrations::get_schema_version;
use crate::db::Database;

/// Food analysis instructions for AI assistants
pub const ANALYSIS_INSTRUCTIONS: &str = r#"
# FoodScan Analysis Instructions

This guide explains how to analyze packaged foods with the FoodScan tools.

## Overview

FoodScan turns a food record (name, brand, ingredient text, nutrition per 100g/100ml and a
free-text serving description) into:
1. **A normalized serving** - amount + unit, or a per-item serving like "1 burger"
2. **Cleaned ingredients** - consistent spelling, casing and punctuation
3. **Allergens** - 14 categories, with plant "milks" kept out of dairy
4. **Additives** - matched against a versioned additive table, each with a risk level
5. **A sugar grade** - the worse of the per-100g grade and the per-serving grade
6. **A processing grade** - A+ to F, from ingredient evidence and nutrients
7. **Micronutrients** - from ingredient keywords and label daily values

All analysis is rule-based and never fails: missing data produces a status, not an error.

---

## Analyzing a Food

Call `analyze_food` with as much of the record as you have:

```
analyze_food(
  name: "Milk Chocolate Bar",
  brand: "Acme",
  ingredients: ["Sugar, cocoa butter, whole milk powder, emulsifier (soy lecithin)"],
  sugar: 56,
  calories: 530,
  serving_description: "1 bar (45g)"
)
```

- Nutrition values are **per 100g** (per 100ml when `is_liquid: true`).
- `serving_size_g` overrides anything found in `serving_description`.
- Pass `tracked_allergens` to limit the allergen scan, and `user_allergens` for the
  personalized result.
- Repeat calls with unchanged inputs are served from cache (`cached: true`).

### Serving Descriptions

| Description | Result |
|-------------|--------|
| `"1 portion (150g)"` | 150 g |
| `"2 tbsp (30 ml)"` | 30 ml |
| `"1 burger"` | 1 burger (per-item) |
| `"1 serving"` | 100 g default |
| `"100"` | 100 g default (a bare 100 is not trusted) |

---

## Verification Markers

Verification status changes how the processing grade is reported:

| Status | Meaning |
|--------|---------|
| `insufficient_evidence` | No ingredients; a conservative default grade from the name |
| `unverified` | Computed from ingredients nobody has confirmed |
| `verified` | Computed from ingredients confirmed against the label |
| `awaiting_verification` | Submitted for review and no ingredients yet |

| Task | Tool |
|------|------|
| Sent the food for catalog review | `mark_submitted_for_review` |
| User or app confirmed the label | `mark_verified(verified_by: "user" \| "client")` |
| View stored markers | `get_food_markers` |
| Reset markers | `clear_food_markers` |

Markers are keyed by name + brand, ignoring case and extra spaces.

---

## Hidden Grades

A processing grade is computed but flagged as hidden when:
- the ingredients are unknown,
- the serving is per-item (e.g. "1 burger"), or
- the brand is on the ultra-processed brand list.

Show the `display.hidden_reason` text instead of the grade in these cases.

---

## Single-Step Tools

| Task | Tool |
|------|------|
| Clean ingredient text | `normalize_ingredients` |
| Parse a serving description | `resolve_serving` |
| Scan for allergens | `detect_allergens` |
| Allergens for one user | `detect_personal_allergens` |
| List additives | `analyze_additives` |
| Grade sugar | `score_sugar` |
| Find micronutrients | `detect_nutrients` |

## Notes

- Allergen categories: gluten, dairy, eggs, nuts, peanuts, soy, fish, shellfish, sesame,
  sulphites, celery, mustard, lupin, molluscs
- Micronutrient daily values are percentages (0-100+) as printed on the label
- `strict_nutrients: true` only counts label values of at least 15% daily value
"#;

/// Runtime status of the FoodScan service
#[derive(Debug, Clone, Serialize)]
pub struct FoodScanStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Reference data
    pub additive_db_version: u32,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: Option<i32>,

    /// Analysis cache
    pub cached_analyses: usize,

    /// Process information
    pub started_at: String,
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    started_at: DateTime<Utc>,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            started_at: Utc::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self, database: &Database, cached_analyses: usize) -> FoodScanStatus {
        let build_info = BuildInfo::current();

        // Get database size if it exists
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let schema_version = database
            .get_conn()
            .ok()
            .and_then(|conn| get_schema_version(&conn).ok());

        // Get process info
        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        FoodScanStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            additive_db_version: build_info.additive_db_version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version,
            cached_analyses,
            started_at: self.started_at.to_rfc3339(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
