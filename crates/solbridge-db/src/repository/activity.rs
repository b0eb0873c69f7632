//! # Activity Log Repository
//!
//! Append-only record of notable gateway events (connection successes and
//! failures, upload outcomes). Surfaced to operators, pruned by retention.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use solbridge_core::{ActivityCategory, ActivityLevel, ActivityLogEntry};

use crate::error::{DbError, DbResult};
use crate::repository::{fmt_timestamp, parse_timestamp};

#[derive(Debug, Clone)]
pub struct ActivityLogRepository {
    pool: SqlitePool,
}

impl ActivityLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ActivityLogRepository { pool }
    }

    /// Appends a success entry.
    pub async fn success(
        &self,
        category: ActivityCategory,
        description: impl Into<String>,
    ) -> DbResult<()> {
        self.append(ActivityLevel::Success, category, description.into())
            .await
    }

    /// Appends an error entry.
    pub async fn error(
        &self,
        category: ActivityCategory,
        description: impl Into<String>,
    ) -> DbResult<()> {
        self.append(ActivityLevel::Error, category, description.into())
            .await
    }

    async fn append(
        &self,
        level: ActivityLevel,
        category: ActivityCategory,
        description: String,
    ) -> DbResult<()> {
        let id = Uuid::new_v4().to_string();
        let created_at = fmt_timestamp(&Utc::now());

        sqlx::query(
            "INSERT INTO activity_log (id, level, category, description, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(level.to_string())
        .bind(category.to_string())
        .bind(&description)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        debug!(%level, %category, description, "Activity logged");
        Ok(())
    }

    /// Returns the most recent entries, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<ActivityLogEntry>> {
        let rows = sqlx::query(
            "SELECT id, level, category, description, created_at
             FROM activity_log
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Deletes entries strictly older than `cutoff`. Returns the number of
    /// rows removed.
    pub async fn delete_older_than(&self, cutoff: &DateTime<Utc>) -> DbResult<u64> {
        let cutoff = fmt_timestamp(cutoff);
        let result = sqlx::query("DELETE FROM activity_log WHERE created_at < ?")
            .bind(&cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> DbResult<ActivityLogEntry> {
    let level: String = row.get("level");
    let category: String = row.get("category");
    let created_at: String = row.get("created_at");

    Ok(ActivityLogEntry {
        id: row.get("id"),
        level: match level.as_str() {
            "success" => ActivityLevel::Success,
            "error" => ActivityLevel::Error,
            other => return Err(DbError::Internal(format!("unknown activity level '{other}'"))),
        },
        category: match category.as_str() {
            "MASTER" => ActivityCategory::Master,
            other => {
                return Err(DbError::Internal(format!("unknown activity category '{other}'")))
            }
        },
        description: row.get("description"),
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
    async fn test_success_and_error_entries() {
        let db = test_db().await;
        let repo = db.activity();

        repo.success(ActivityCategory::Master, "master data uploaded")
            .await
            .unwrap();
        repo.error(ActivityCategory::Master, "master not found: 192.168.1.40")
            .await
            .unwrap();

        let entries = repo.recent(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, ActivityLevel::Error);
        assert_eq!(entries[1].level, ActivityLevel::Success);
        assert_eq!(entries[1].description, "master data uploaded");
    }

    #[tokio::test]
    async fn test_retention_removes_old_entries() {
        let db = test_db().await;
        let repo = db.activity();

        repo.success(ActivityCategory::Master, "kept").await.unwrap();

        let past = Utc::now() - chrono::Duration::days(1);
        assert_eq!(repo.delete_older_than(&past).await.unwrap(), 0);

        let future = Utc::now() + chrono::Duration::seconds(1);
        assert_eq!(repo.delete_older_than(&future).await.unwrap(), 1);
        assert!(repo.recent(10).await.unwrap().is_empty());
    }
}
