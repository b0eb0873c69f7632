//! # Fault Repository
//!
//! Two fault surfaces live here:
//! - Locally detected PV string faults, appended one row per finding to the
//!   `fault_records` table and never updated in place.
//! - The master's own reported fault list, stored as the `master_faults`
//!   document and replaced wholesale on every poll.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use solbridge_core::{FaultCategory, FaultEvent, FaultRecord};

use crate::error::{DbError, DbResult};
use crate::repository::{fmt_timestamp, parse_timestamp};

#[derive(Debug, Clone)]
pub struct FaultRepository {
    pool: SqlitePool,
}

impl FaultRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FaultRepository { pool }
    }

    // =========================================================================
    // Detected faults (append-only)
    // =========================================================================

    /// Appends one detected fault record.
    pub async fn record(&self, fault: &FaultRecord) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO fault_records
             (id, dev_id, category, event, position, description, reason, suggestion, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&fault.id)
        .bind(&fault.dev_id)
        .bind(fault.category.to_string())
        .bind(fault.event.to_string())
        .bind(fault.position.map(|p| p as i64))
        .bind(&fault.description)
        .bind(&fault.reason)
        .bind(&fault.suggestion)
        .bind(fmt_timestamp(&fault.created_at))
        .execute(&self.pool)
        .await?;

        debug!(dev_id = %fault.dev_id, description = %fault.description, "Fault recorded");
        Ok(())
    }

    /// Returns the most recent detected faults, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<FaultRecord>> {
        let rows = sqlx::query(
            "SELECT id, dev_id, category, event, position, description, reason, suggestion,
                    created_at
             FROM fault_records
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_fault).collect()
    }

    /// Deletes detected faults strictly older than `cutoff`. Returns the
    /// number of rows removed.
    pub async fn delete_older_than(&self, cutoff: &DateTime<Utc>) -> DbResult<u64> {
        let cutoff = fmt_timestamp(cutoff);
        let result = sqlx::query("DELETE FROM fault_records WHERE created_at < ?")
            .bind(&cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    // Master-reported fault list (replace semantics)
    // =========================================================================

    /// Replaces the master's reported fault list with the latest pull.
    pub async fn replace_master_list(&self, list: &[serde_json::Value]) -> DbResult<()> {
        let body = serde_json::to_string(list)
            .map_err(|e| DbError::corrupt("master_faults", e.to_string()))?;

        sqlx::query(
            "INSERT INTO documents (name, body, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        )
        .bind("master_faults")
        .bind(&body)
        .bind(fmt_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;

        debug!(count = list.len(), "Master fault list replaced");
        Ok(())
    }

    /// Returns the most recently pulled master fault list, empty when the
    /// master was never polled.
    pub async fn master_list(&self) -> DbResult<Vec<serde_json::Value>> {
        let row = sqlx::query("SELECT body FROM documents WHERE name = ?")
            .bind("master_faults")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.get("body");
                serde_json::from_str(&body)
                    .map_err(|e| DbError::corrupt("master_faults", e.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }
}

fn row_to_fault(row: &sqlx::sqlite::SqliteRow) -> DbResult<FaultRecord> {
    let category: String = row.get("category");
    let event: String = row.get("event");
    let position: Option<i64> = row.get("position");
    let created_at: String = row.get("created_at");

    Ok(FaultRecord {
        id: row.get("id"),
        dev_id: row.get("dev_id"),
        category: match category.as_str() {
            "SOLAR_FAULT" => FaultCategory::SolarFault,
            other => {
                return Err(DbError::Internal(format!("unknown fault category '{other}'")))
            }
        },
        event: match event.as_str() {
            "STRING" => FaultEvent::String,
            other => return Err(DbError::Internal(format!("unknown fault event '{other}'"))),
        },
        position: position.map(|p| p as u32),
        description: row.get("description"),
        reason: row.get("reason"),
        suggestion: row.get("suggestion"),
        created_at: parse_timestamp(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_record_and_recent() {
        let db = test_db().await;
        let repo = db.faults();

        let fault = FaultRecord::string_fault(
            3,
            2,
            "PV String 2 not connected",
            "string open or disconnected",
            "check wiring at the combiner box",
            Utc::now(),
        );
        repo.record(&fault).await.unwrap();

        let recent = repo.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].dev_id, "3");
        assert_eq!(recent[0].position, Some(2));
        assert_eq!(recent[0].category, FaultCategory::SolarFault);
    }

    #[tokio::test]
    async fn test_recent_orders_newest_first() {
        let db = test_db().await;
        let repo = db.faults();

        let base = Utc::now();
        for i in 0..3 {
            let fault = FaultRecord::string_fault(
                1,
                i,
                format!("fault {i}"),
                "r",
                "s",
                base + chrono::Duration::seconds(i as i64),
            );
            repo.record(&fault).await.unwrap();
        }

        let recent = repo.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].description, "fault 2");
        assert_eq!(recent[1].description, "fault 1");
    }

    #[tokio::test]
    async fn test_retention_keeps_record_at_exact_cutoff() {
        let db = test_db().await;
        let repo = db.faults();

        let cutoff = Utc::now();
        let old = FaultRecord::string_fault(
            1,
            1,
            "old",
            "r",
            "s",
            cutoff - chrono::Duration::microseconds(1),
        );
        let at_cutoff = FaultRecord::string_fault(1, 2, "edge", "r", "s", cutoff);
        repo.record(&old).await.unwrap();
        repo.record(&at_cutoff).await.unwrap();

        let removed = repo.delete_older_than(&cutoff).await.unwrap();
        assert_eq!(removed, 1);

        let remaining = repo.recent(10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].description, "edge");
    }

    #[tokio::test]
    async fn test_master_list_replace() {
        let db = test_db().await;
        let repo = db.faults();

        assert!(repo.master_list().await.unwrap().is_empty());

        repo.replace_master_list(&[serde_json::json!({"code": 17})])
            .await
            .unwrap();
        repo.replace_master_list(&[serde_json::json!({"code": 4}), serde_json::json!({"code": 9})])
            .await
            .unwrap();

        let list = repo.master_list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["code"], 4);
    }
}
