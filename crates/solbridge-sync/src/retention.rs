//! # Retention Pruner
//!
//! Deletes append-only records older than the retention window. Documents
//! are latest-wins and never accumulate, so only the fault, activity, and
//! device-log-history tables are pruned.
//!
//! The cutoff comparison is strict: a record stamped exactly at the cutoff
//! instant survives.

use chrono::{Duration, Utc};
use tracing::info;

use solbridge_db::Database;

use crate::error::SyncResult;

/// How long append-only records are kept.
const RETENTION_WINDOW_DAYS: i64 = 1;

/// Prunes fault, activity, and device-log-history records older than the
/// retention window.
pub async fn clear_data(db: &Database) -> SyncResult<()> {
    let cutoff = Utc::now() - Duration::days(RETENTION_WINDOW_DAYS);

    let faults = db.faults().delete_older_than(&cutoff).await?;
    let activity = db.activity().delete_older_than(&cutoff).await?;
    let history = db.device_logs().delete_history_older_than(&cutoff).await?;

    info!(
        %cutoff,
        faults,
        activity,
        history,
        "Retention prune complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solbridge_core::{ActivityCategory, FaultRecord};
    use solbridge_db::DbConfig;

    #[tokio::test]
    async fn test_clear_data_prunes_only_expired_records() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        // One fault well past the window, one from this instant.
        let stale = FaultRecord::string_fault(
            1,
            1,
            "stale",
            "r",
            "s",
            Utc::now() - Duration::days(2),
        );
        let fresh = FaultRecord::string_fault(1, 2, "fresh", "r", "s", Utc::now());
        db.faults().record(&stale).await.unwrap();
        db.faults().record(&fresh).await.unwrap();

        db.activity()
            .success(ActivityCategory::Master, "recent entry")
            .await
            .unwrap();

        clear_data(&db).await.unwrap();

        let faults = db.faults().recent(10).await.unwrap();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].description, "fresh");
        assert_eq!(db.activity().recent(10).await.unwrap().len(), 1);
    }
}
