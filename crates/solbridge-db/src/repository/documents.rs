//! # Document Repositories
//!
//! Small named JSON documents stored in the `documents` table, one row per
//! name, latest write wins. Each repository wraps one document name with a
//! typed body:
//!
//! | Repository             | Document name     | Body type            |
//! |------------------------|-------------------|----------------------|
//! | `SessionRepository`    | `session`         | `SessionRecord`      |
//! | `AboutRepository`      | `about`           | `AboutDocument`      |
//! | `StatisticsRepository` | `statistics`      | `StatisticsDocument` |
//! | `DeviceRepository`     | `devices`         | `DeviceDocument`     |
//! | `DeviceLogRepository`  | `device_logs`     | `DeviceLogDocument`  |
//! | `WiringRepository`     | `wiring_settings` | `WiringSettings`     |
//!
//! Reading a document that was never written returns the body type's
//! `Default` rather than an error, so callers never special-case first run.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use solbridge_core::{
    AboutDocument, DeviceDocument, DeviceLogDocument, SessionRecord, StatisticsDocument,
    WiringSettings,
};

use crate::error::{DbError, DbResult};
use crate::repository::fmt_timestamp;

// =============================================================================
// Shared document access
// =============================================================================

/// Loads the document with the given name, or `Default` when absent.
async fn get_doc<T>(pool: &SqlitePool, name: &str) -> DbResult<T>
where
    T: DeserializeOwned + Default,
{
    let row = sqlx::query("SELECT body FROM documents WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let body: String = row.get("body");
            serde_json::from_str(&body).map_err(|e| DbError::corrupt(name, e.to_string()))
        }
        None => Ok(T::default()),
    }
}

/// Replaces the document with the given name.
async fn save_doc<T>(pool: &SqlitePool, name: &str, body: &T) -> DbResult<()>
where
    T: Serialize,
{
    let body = serde_json::to_string(body).map_err(|e| DbError::corrupt(name, e.to_string()))?;
    let updated_at = fmt_timestamp(&Utc::now());

    sqlx::query(
        "INSERT INTO documents (name, body, updated_at) VALUES (?, ?, ?)
         ON CONFLICT(name) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
    )
    .bind(name)
    .bind(&body)
    .bind(&updated_at)
    .execute(pool)
    .await?;

    debug!(document = name, bytes = body.len(), "Document saved");
    Ok(())
}

// =============================================================================
// Session
// =============================================================================

/// Repository for the master session document (token, connection flag,
/// captured product identity).
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    pub async fn get(&self) -> DbResult<SessionRecord> {
        get_doc(&self.pool, "session").await
    }

    pub async fn save(&self, record: &SessionRecord) -> DbResult<()> {
        save_doc(&self.pool, "session", record).await
    }
}

// =============================================================================
// About
// =============================================================================

/// Repository for the master's about/product document.
#[derive(Debug, Clone)]
pub struct AboutRepository {
    pool: SqlitePool,
}

impl AboutRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AboutRepository { pool }
    }

    pub async fn get(&self) -> DbResult<AboutDocument> {
        get_doc(&self.pool, "about").await
    }

    pub async fn save(&self, doc: &AboutDocument) -> DbResult<()> {
        save_doc(&self.pool, "about", doc).await
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Repository for the plant statistics document.
#[derive(Debug, Clone)]
pub struct StatisticsRepository {
    pool: SqlitePool,
}

impl StatisticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StatisticsRepository { pool }
    }

    pub async fn get(&self) -> DbResult<StatisticsDocument> {
        get_doc(&self.pool, "statistics").await
    }

    pub async fn save(&self, doc: &StatisticsDocument) -> DbResult<()> {
        save_doc(&self.pool, "statistics", doc).await
    }
}

// =============================================================================
// Devices
// =============================================================================

/// Repository for the device inventory document. `save` replaces the whole
/// inventory; devices absent from the new list are gone after the write.
#[derive(Debug, Clone)]
pub struct DeviceRepository {
    pool: SqlitePool,
}

impl DeviceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DeviceRepository { pool }
    }

    pub async fn get(&self) -> DbResult<DeviceDocument> {
        get_doc(&self.pool, "devices").await
    }

    pub async fn save(&self, doc: &DeviceDocument) -> DbResult<()> {
        save_doc(&self.pool, "devices", doc).await
    }
}

// =============================================================================
// Device logs
// =============================================================================

/// Repository for per-device operating logs.
///
/// The working set (`get`/`save`) is a single document rebuilt each polling
/// cycle. `append_history` additionally snapshots one device's readings into
/// the append-only `device_log_history` table for trend queries.
#[derive(Debug, Clone)]
pub struct DeviceLogRepository {
    pool: SqlitePool,
}

impl DeviceLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DeviceLogRepository { pool }
    }

    pub async fn get(&self) -> DbResult<DeviceLogDocument> {
        get_doc(&self.pool, "device_logs").await
    }

    pub async fn save(&self, doc: &DeviceLogDocument) -> DbResult<()> {
        save_doc(&self.pool, "device_logs", doc).await
    }

    /// Appends a history snapshot for one device. `body` is the serialized
    /// readings for that device at this instant.
    pub async fn append_history(
        &self,
        dev_id: i64,
        body: &serde_json::Value,
    ) -> DbResult<()> {
        let id = Uuid::new_v4().to_string();
        let body = serde_json::to_string(body)
            .map_err(|e| DbError::corrupt("device_log_history", e.to_string()))?;
        let created_at = fmt_timestamp(&Utc::now());

        sqlx::query(
            "INSERT INTO device_log_history (id, dev_id, body, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(dev_id)
        .bind(&body)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        debug!(dev_id, "Device log history appended");
        Ok(())
    }

    /// Counts history rows for one device.
    pub async fn history_count(&self, dev_id: i64) -> DbResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM device_log_history WHERE dev_id = ?")
            .bind(dev_id)
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n as u64)
    }

    /// Deletes history rows strictly older than `cutoff`. Returns the number
    /// of rows removed.
    pub async fn delete_history_older_than(
        &self,
        cutoff: &chrono::DateTime<Utc>,
    ) -> DbResult<u64> {
        let cutoff = fmt_timestamp(cutoff);
        let result = sqlx::query("DELETE FROM device_log_history WHERE created_at < ?")
            .bind(&cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Wiring settings
// =============================================================================

/// Repository for the installer-entered PV string wiring layout.
#[derive(Debug, Clone)]
pub struct WiringRepository {
    pool: SqlitePool,
}

impl WiringRepository {
    pub fn new(pool: SqlitePool) -> Self {
        WiringRepository { pool }
    }

    pub async fn get(&self) -> DbResult<WiringSettings> {
        get_doc(&self.pool, "wiring_settings").await
    }

    pub async fn save(&self, settings: &WiringSettings) -> DbResult<()> {
        save_doc(&self.pool, "wiring_settings", settings).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use solbridge_core::Device;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_missing_document_returns_default() {
        let db = test_db().await;

        let session = db.session().get().await.unwrap();
        assert!(session.token.is_none());
        assert!(!session.is_connected);

        let devices = db.devices().get().await.unwrap();
        assert!(devices.list.is_empty());
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let db = test_db().await;

        let mut record = SessionRecord::default();
        record.token = Some("abc123".into());
        record.is_connected = true;
        record.master_addr = "192.168.1.40".into();
        db.session().save(&record).await.unwrap();

        let loaded = db.session().get().await.unwrap();
        assert_eq!(loaded.token.as_deref(), Some("abc123"));
        assert!(loaded.is_connected);
        assert_eq!(loaded.master_addr, "192.168.1.40");
    }

    #[tokio::test]
    async fn test_device_inventory_replace_semantics() {
        let db = test_db().await;
        let repo = db.devices();

        let first = DeviceDocument {
            list: vec![
                Device::from_raw(1, "SN-1".into(), "Inverter 1".into(), 1),
                Device::from_raw(2, "SN-2".into(), "Inverter 2".into(), 1),
            ],
        };
        repo.save(&first).await.unwrap();

        // Second save drops device 2; it must not survive.
        let second = DeviceDocument {
            list: vec![Device::from_raw(1, "SN-1".into(), "Inverter 1".into(), 2)],
        };
        repo.save(&second).await.unwrap();

        let loaded = repo.get().await.unwrap();
        assert_eq!(loaded.list.len(), 1);
        assert_eq!(loaded.list[0].dev_id, 1);
        assert_eq!(loaded.list[0].dev_status, 2);
    }

    #[tokio::test]
    async fn test_history_append_and_retention_boundary() {
        let db = test_db().await;
        let repo = db.device_logs();

        repo.append_history(7, &serde_json::json!({"list": []}))
            .await
            .unwrap();
        repo.append_history(7, &serde_json::json!({"list": []}))
            .await
            .unwrap();
        assert_eq!(repo.history_count(7).await.unwrap(), 2);

        // Cutoff in the past removes nothing; cutoff in the future removes all.
        let past = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(repo.delete_history_older_than(&past).await.unwrap(), 0);

        let future = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(repo.delete_history_older_than(&future).await.unwrap(), 2);
        assert_eq!(repo.history_count(7).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_document_reported_by_name() {
        let db = test_db().await;

        sqlx::query("INSERT INTO documents (name, body, updated_at) VALUES (?, ?, ?)")
            .bind("session")
            .bind("{not json")
            .bind(fmt_timestamp(&Utc::now()))
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.session().get().await.unwrap_err();
        match err {
            DbError::CorruptDocument { name, .. } => assert_eq!(name, "session"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
