//! # Message Templates
//!
//! User-facing message templates keyed by code. The dashboard localizes
//! these; the engine treats them as opaque strings it composes into
//! activity-log and fault descriptions.

/// Master could not be reached; composed with the master address.
pub const MASTER_NOT_FOUND: &str = "master not found";

/// A full sync cycle completed and data was persisted.
pub const MASTER_UPLOAD_SUCCESS: &str = "master data uploaded";

/// Suffix for a missing-string fault description; composed with the
/// channel name.
pub const STRING_NOT_CONNECTED: &str = " not connected";

/// Reason template for a missing-string fault.
pub const MISSING_STRING_REASON: &str =
    "the string reports zero power at a wired position";

/// Suggestion template for a missing-string fault.
pub const MISSING_STRING_SUGGEST: &str =
    "check the string fuse and DC wiring at the reported position";

/// Suffix for a low-power fault description; composed with the channel name.
pub const LOW_STRING_POWER: &str = " low power";

/// Reason template for a low-power fault.
pub const LOW_STRING_POWER_REASON: &str =
    "the string underperforms the average of its direction group by more than 10%";

/// Suggestion template for a low-power fault.
pub const LOW_STRING_POWER_SUGGEST: &str =
    "check the string for shading, soiling or module degradation";
