//! Food marker and saved additive models
//!
//! Local state keyed by the name+brand composite food key: review and
//! verification markers, and the additive records from the last analysis.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::{AdditiveRecord, PersistedAdditives, VerificationStatus};

/// Review/verification markers for a food
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodMarkers {
    pub food_key: String,
    pub submitted_for_review: bool,
    pub user_verified: bool,
    pub client_verified: bool,
    pub updated_at: String,
}

/// Which verification marker to set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifiedBy {
    User,
    Client,
}

impl VerifiedBy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(VerifiedBy::User),
            "client" => Some(VerifiedBy::Client),
            _ => None,
        }
    }
}

impl FoodMarkers {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            food_key: row.get("food_key")?,
            submitted_for_review: row.get::<_, i64>("submitted_for_review")? != 0,
            user_verified: row.get::<_, i64>("user_verified")? != 0,
            client_verified: row.get::<_, i64>("client_verified")? != 0,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Markers for a food, if any were ever recorded
    pub fn get(conn: &Connection, food_key: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM food_markers WHERE food_key = ?1")?;

        let result = stmt.query_row([food_key], Self::from_row);
        match result {
            Ok(markers) => Ok(Some(markers)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Mark a food as submitted for review
    pub fn mark_submitted(conn: &Connection, food_key: &str) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO food_markers (food_key, submitted_for_review)
            VALUES (?1, 1)
            ON CONFLICT(food_key) DO UPDATE SET
                submitted_for_review = 1,
                updated_at = datetime('now')
            "#,
            [food_key],
        )?;
        Self::require(conn, food_key)
    }

    /// Mark a food as verified by the user or the client
    pub fn mark_verified(conn: &Connection, food_key: &str, by: VerifiedBy) -> DbResult<Self> {
        let column = match by {
            VerifiedBy::User => "user_verified",
            VerifiedBy::Client => "client_verified",
        };
        let sql = format!(
            "INSERT INTO food_markers (food_key, {col}) VALUES (?1, 1)
             ON CONFLICT(food_key) DO UPDATE SET {col} = 1, updated_at = datetime('now')",
            col = column
        );
        conn.execute(&sql, [food_key])?;
        Self::require(conn, food_key)
    }

    /// Remove all markers for a food. Returns false if none existed.
    pub fn clear(conn: &Connection, food_key: &str) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM food_markers WHERE food_key = ?1", [food_key])?;
        Ok(rows > 0)
    }

    fn require(conn: &Connection, food_key: &str) -> DbResult<Self> {
        Self::get(conn, food_key)?
            .ok_or_else(|| crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Combine the stored markers with the status carried by the record.
    ///
    /// Verification wins over a pending review; otherwise the record's own status stands.
    pub fn effective_status(&self, record_status: VerificationStatus) -> VerificationStatus {
        if record_status.is_verified() {
            record_status
        } else if self.user_verified {
            VerificationStatus::UserVerified
        } else if self.client_verified {
            VerificationStatus::ClientVerified
        } else if self.submitted_for_review {
            VerificationStatus::SubmittedForReview
        } else {
            record_status
        }
    }
}

/// Additive records saved from the last fresh analysis of a food
pub struct SavedAdditives;

impl SavedAdditives {
    /// Load saved additives with their database version stamp.
    ///
    /// Rows saved from different ingredient text are ignored.
    pub fn get(conn: &Connection, food_key: &str, ingredients_hash: &str) -> DbResult<Option<PersistedAdditives>> {
        let mut stmt = conn.prepare(
            "SELECT additives_json, db_version, ingredients_hash FROM saved_additives WHERE food_key = ?1",
        )?;

        let result = stmt.query_row([food_key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        });
        let (json, version, saved_hash) = match result {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if saved_hash.as_deref() != Some(ingredients_hash) {
            tracing::debug!("Saved additives for '{}' came from other ingredients", food_key);
            return Ok(None);
        }

        let records: Vec<AdditiveRecord> = serde_json::from_str(&json)?;
        Ok(Some(PersistedAdditives {
            records,
            db_version: version.and_then(|v| u32::try_from(v).ok()),
        }))
    }

    /// Save (or replace) additives for a food
    pub fn save(
        conn: &Connection,
        food_key: &str,
        ingredients_hash: &str,
        additives: &PersistedAdditives,
    ) -> DbResult<()> {
        let json = serde_json::to_string(&additives.records)?;
        conn.execute(
            r#"
            INSERT INTO saved_additives (food_key, additives_json, db_version, ingredients_hash)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(food_key) DO UPDATE SET
                additives_json = excluded.additives_json,
                db_version = excluded.db_version,
                ingredients_hash = excluded.ingredients_hash,
                saved_at = datetime('now')
            "#,
            params![food_key, json, additives.db_version.map(i64::from), ingredients_hash],
        )?;
        tracing::info!(
            "Saved {} additive record(s) for '{}' (db v{:?})",
            additives.records.len(),
            food_key,
            additives.db_version
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{AdditiveOrigin, RiskLevel};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_markers_lifecycle() {
        let conn = test_conn();
        assert!(FoodMarkers::get(&conn, "cola|acme").unwrap().is_none());

        let markers = FoodMarkers::mark_submitted(&conn, "cola|acme").unwrap();
        assert!(markers.submitted_for_review);
        assert!(!markers.user_verified);

        let markers = FoodMarkers::mark_verified(&conn, "cola|acme", VerifiedBy::Client).unwrap();
        assert!(markers.submitted_for_review);
        assert!(markers.client_verified);

        assert!(FoodMarkers::clear(&conn, "cola|acme").unwrap());
        assert!(!FoodMarkers::clear(&conn, "cola|acme").unwrap());
    }

    #[test]
    fn test_effective_status() {
        let pending = FoodMarkers {
            submitted_for_review: true,
            ..Default::default()
        };
        assert_eq!(
            pending.effective_status(VerificationStatus::Unverified),
            VerificationStatus::SubmittedForReview
        );

        let verified = FoodMarkers {
            submitted_for_review: true,
            user_verified: true,
            ..Default::default()
        };
        assert_eq!(
            verified.effective_status(VerificationStatus::Unverified),
            VerificationStatus::UserVerified
        );
        assert_eq!(
            pending.effective_status(VerificationStatus::ClientVerified),
            VerificationStatus::ClientVerified
        );
    }

    #[test]
    fn test_saved_additives_roundtrip_keeps_version() {
        let conn = test_conn();
        let saved = PersistedAdditives {
            records: vec![AdditiveRecord {
                code: Some("E330".to_string()),
                name: "Citric acid".to_string(),
                origin: AdditiveOrigin::Mixed,
                explanation: "An acid.".to_string(),
                risk: RiskLevel::Low,
                child_warning: false,
            }],
            db_version: Some(3),
        };
        SavedAdditives::save(&conn, "jam|", "h1", &saved).unwrap();
        assert_eq!(SavedAdditives::get(&conn, "jam|", "h1").unwrap(), Some(saved));

        let replaced = PersistedAdditives { records: vec![], db_version: None };
        SavedAdditives::save(&conn, "jam|", "h1", &replaced).unwrap();
        assert_eq!(SavedAdditives::get(&conn, "jam|", "h1").unwrap(), Some(replaced));
    }

    #[test]
    fn test_saved_additives_ignored_for_other_ingredients() {
        let conn = test_conn();
        let saved = PersistedAdditives { records: vec![], db_version: Some(3) };
        SavedAdditives::save(&conn, "cola|fizz", "before", &saved).unwrap();

        assert_eq!(SavedAdditives::get(&conn, "cola|fizz", "after").unwrap(), None);

        // Rows from before the hash column existed are never reused
        conn.execute("UPDATE saved_additives SET ingredients_hash = NULL", []).unwrap();
        assert_eq!(SavedAdditives::get(&conn, "cola|fizz", "before").unwrap(), None);
    }
}
