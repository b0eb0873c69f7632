//! # Repository Layer
//!
//! Data access split by concern:
//! - `documents` — versionless JSON documents (session, about, statistics,
//!   device inventory, device logs, wiring settings)
//! - `fault` — append-only fault records plus the master-reported fault list
//! - `activity` — append-only activity log
//!
//! All timestamps are stored as RFC 3339 UTC text with a fixed fractional
//! precision so that lexicographic text comparison matches chronological
//! order.

pub mod activity;
pub mod documents;
pub mod fault;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{DbError, DbResult};

/// Formats a timestamp for storage. Fixed microsecond precision keeps
/// string comparisons in SQL consistent with time order.
pub(crate) fn fmt_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp back into `DateTime<Utc>`.
pub(crate) fn parse_timestamp(raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Internal(format!("invalid stored timestamp '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_round_trip() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let text = fmt_timestamp(&ts);
        assert_eq!(parse_timestamp(&text).unwrap(), ts);
    }

    #[test]
    fn test_timestamp_text_order_matches_time_order() {
        let earlier = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let later = earlier + chrono::Duration::milliseconds(1);
        assert!(fmt_timestamp(&earlier) < fmt_timestamp(&later));
    }
}
