//! # Domain Types
//!
//! Core domain types used throughout solbridge.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  SessionRecord  │   │     Device      │   │  FaultRecord    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  token          │   │  dev_id         │   │  category       │       │
//! │  │  is_connected   │   │  raw status     │   │  event=STRING   │       │
//! │  │  master_addr    │   │  derived status │   │  position       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ DeviceLogDoc.   │   │  WiringConfig   │   │ ActivityLogEntry│       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  power blocks   │   │  1st direction  │   │  level          │       │
//! │  │  io blocks      │   │  2nd direction  │   │  category       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Document vs Record
//! Entity families with "latest wins" semantics (session, about, statistics,
//! device inventory, the device-log working set, wiring settings) are whole
//! documents replaced on save. Fault and activity entries are append-only
//! records pruned by retention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Session
// =============================================================================

/// Connection/session state persisted across sync cycles.
///
/// The token survives between cycles until the master re-issues it on a
/// CONNECT response. `is_connected` is cleared at the start of every cycle
/// and only set back by a successful handshake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque auth token issued by the master on CONNECT.
    pub token: Option<String>,

    /// Whether the last cycle reached the master.
    pub is_connected: bool,

    /// Master address (host[:port]) the gateway dials.
    pub master_addr: String,

    /// Product name reported by the master (ABOUT response).
    pub product_name: Option<String>,

    /// Master serial number (first ABOUT list entry).
    pub device_sn: Option<String>,

    /// Master key - mirrors the serial number, kept for the dashboard.
    pub master_key: Option<String>,
}

// =============================================================================
// Device Inventory
// =============================================================================

/// Derived device status, computed from the raw status code the master
/// reports in the inventory list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    /// Device is producing normally.
    Normal,
    /// Device reported an alarm condition.
    Alarm,
    /// Device is unreachable or powered down.
    Offline,
}

impl DeviceStatus {
    /// Derives the display status from the master's raw status code.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => DeviceStatus::Normal,
            2 => DeviceStatus::Alarm,
            _ => DeviceStatus::Offline,
        }
    }

    /// Dashboard color for this status.
    pub fn color(&self) -> &'static str {
        match self {
            DeviceStatus::Normal => "#67C23A",
            DeviceStatus::Alarm => "#F56C6C",
            DeviceStatus::Offline => "#909399",
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceStatus::Normal => write!(f, "normal"),
            DeviceStatus::Alarm => write!(f, "alarm"),
            DeviceStatus::Offline => write!(f, "offline"),
        }
    }
}

/// One device from the master's inventory, enriched with derived display
/// fields and (optionally) the per-device extended info pull.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Master-assigned device id.
    pub dev_id: i64,

    /// Device serial number.
    pub dev_sn: String,

    /// Human-readable device name.
    pub dev_name: String,

    /// Raw status code as reported by the master.
    pub dev_status: i64,

    /// Derived status (from `dev_status`).
    pub status: DeviceStatus,

    /// Derived dashboard color (from `status`).
    pub status_color: String,

    /// Extended info attached by the per-device info pull.
    /// Absent when the info call returned nothing for this device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<Vec<DataPoint>>,
}

impl Device {
    /// Builds a device record from raw inventory fields, deriving the
    /// display status and color.
    pub fn from_raw(dev_id: i64, dev_sn: String, dev_name: String, dev_status: i64) -> Self {
        let status = DeviceStatus::from_raw(dev_status);
        Device {
            dev_id,
            dev_sn,
            dev_name,
            dev_status,
            status,
            status_color: status.color().to_string(),
            device_info: None,
        }
    }
}

/// The persisted device inventory. Replaced wholesale on every sync cycle -
/// there is no incremental merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceDocument {
    pub list: Vec<Device>,
}

// =============================================================================
// Data Points
// =============================================================================

/// A generic name/value/unit triple, used by extended device info, power
/// logs, and the ABOUT list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub data_value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

// =============================================================================
// Device Logs
// =============================================================================

/// One power-log block for a single device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerLogBlock {
    /// Device this block belongs to. Filled in by the poller - the master
    /// does not echo the id back in the response.
    #[serde(default)]
    pub dev_id: Option<i64>,

    #[serde(default)]
    pub list: Vec<DataPoint>,
}

/// One IO channel reading (voltage/current pair) from the IO log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IoChannel {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub voltage: f64,

    #[serde(default)]
    pub current: f64,
}

/// One IO-log block for a single device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IoLogBlock {
    /// Device this block belongs to. Filled in by the poller.
    #[serde(default)]
    pub dev_id: Option<i64>,

    #[serde(default)]
    pub list: Vec<IoChannel>,
}

/// The in-progress device-log working set for one sync cycle.
///
/// Reset once at the start of the per-device log phase, appended to as
/// blocks arrive, and flushed into durable history at the end of each
/// per-device iteration. IO blocks are validated by the anomaly rules
/// before the flush.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceLogDocument {
    #[serde(default)]
    pub list: Vec<PowerLogBlock>,

    #[serde(default)]
    pub list_io: Vec<IoLogBlock>,
}

// =============================================================================
// Wiring Configuration
// =============================================================================

/// Per-device wiring configuration: which string positions belong to which
/// roof direction. External, read-only input to the anomaly rules; a device
/// with no entry is simply not validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WiringConfig {
    pub dev_id: i64,

    /// String positions wired to the first roof direction.
    #[serde(default)]
    pub first_direction: Vec<u32>,

    /// String positions wired to the second roof direction.
    #[serde(default)]
    pub second_direction: Vec<u32>,
}

impl WiringConfig {
    /// True if the given string position is wired in either direction.
    pub fn is_wired(&self, position: u32) -> bool {
        self.first_direction.contains(&position) || self.second_direction.contains(&position)
    }
}

/// The persisted settings document holding all wiring configurations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WiringSettings {
    #[serde(default)]
    pub list: Vec<WiringConfig>,
}

impl WiringSettings {
    /// Looks up the wiring configuration for a device, if any.
    pub fn for_device(&self, dev_id: i64) -> Option<&WiringConfig> {
        self.list.iter().find(|cfg| cfg.dev_id == dev_id)
    }
}

// =============================================================================
// Faults
// =============================================================================

/// Fault category. Currently every detector fault is a solar-string fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultCategory {
    SolarFault,
}

impl std::fmt::Display for FaultCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultCategory::SolarFault => write!(f, "SOLAR_FAULT"),
        }
    }
}

/// The fault event scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultEvent {
    String,
}

impl std::fmt::Display for FaultEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultEvent::String => write!(f, "STRING"),
        }
    }
}

/// An append-only fault record emitted by the anomaly rules.
///
/// Emission is fire-and-forget per string per cycle - the same fault is
/// re-emitted on the next cycle if the condition persists. Records are
/// pruned by the retention pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultRecord {
    pub id: String,
    pub dev_id: String,
    pub category: FaultCategory,
    pub event: FaultEvent,
    pub position: Option<u32>,
    pub description: String,
    pub reason: Option<String>,
    pub suggestion: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FaultRecord {
    /// Creates a string fault for a device at a given position.
    pub fn string_fault(
        dev_id: i64,
        position: u32,
        description: impl Into<String>,
        reason: &str,
        suggestion: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        FaultRecord {
            id: Uuid::new_v4().to_string(),
            dev_id: dev_id.to_string(),
            category: FaultCategory::SolarFault,
            event: FaultEvent::String,
            position: Some(position),
            description: description.into(),
            reason: Some(reason.to_string()),
            suggestion: Some(suggestion.to_string()),
            created_at,
        }
    }
}

// =============================================================================
// Activity Log
// =============================================================================

/// Activity log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Success,
    Error,
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityLevel::Success => write!(f, "success"),
            ActivityLevel::Error => write!(f, "error"),
        }
    }
}

/// Activity log category. The sync engine only writes master-connectivity
/// entries; the dashboard owns the other categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityCategory {
    Master,
}

impl std::fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityCategory::Master => write!(f, "MASTER"),
        }
    }
}

/// An append-only activity log entry (cycle success/failure audit trail).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: String,
    pub level: ActivityLevel,
    pub category: ActivityCategory,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// About & Statistics Documents
// =============================================================================

/// The merged ABOUT document. The master answers the product-identity call
/// and the localized about call with the same service tag; successive
/// responses are merged field-wise, latest wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AboutDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<DataPoint>>,
}

impl AboutDocument {
    /// Merges a newer about payload into this document, field-wise.
    pub fn merge(&mut self, other: AboutDocument) {
        if other.product_name.is_some() {
            self.product_name = other.product_name;
        }
        if other.list.is_some() {
            self.list = other.list;
        }
    }
}

/// The statistics snapshot document. The per-device statistic detail block
/// is appended into `list` before the document is persisted; beyond that
/// the entries are opaque to the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsDocument {
    #[serde(default)]
    pub list: Vec<serde_json::Value>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_status_derivation() {
        assert_eq!(DeviceStatus::from_raw(1), DeviceStatus::Normal);
        assert_eq!(DeviceStatus::from_raw(2), DeviceStatus::Alarm);
        assert_eq!(DeviceStatus::from_raw(0), DeviceStatus::Offline);
        assert_eq!(DeviceStatus::from_raw(99), DeviceStatus::Offline);
    }

    #[test]
    fn test_device_from_raw_derives_color() {
        let device = Device::from_raw(7, "SN-7".into(), "Inverter 7".into(), 1);
        assert_eq!(device.status, DeviceStatus::Normal);
        assert_eq!(device.status_color, "#67C23A");
        assert!(device.device_info.is_none());
    }

    #[test]
    fn test_wiring_lookup() {
        let settings = WiringSettings {
            list: vec![WiringConfig {
                dev_id: 3,
                first_direction: vec![1, 2],
                second_direction: vec![5],
            }],
        };
        assert!(settings.for_device(3).is_some());
        assert!(settings.for_device(4).is_none());

        let cfg = settings.for_device(3).unwrap();
        assert!(cfg.is_wired(2));
        assert!(cfg.is_wired(5));
        assert!(!cfg.is_wired(9));
    }

    #[test]
    fn test_about_merge_latest_wins() {
        let mut about = AboutDocument {
            product_name: Some("Solar Gateway".into()),
            list: None,
        };
        about.merge(AboutDocument {
            product_name: None,
            list: Some(vec![DataPoint {
                name: "SN".into(),
                data_value: "ABC123".into(),
                unit: None,
            }]),
        });
        // product_name untouched, list filled in
        assert_eq!(about.product_name.as_deref(), Some("Solar Gateway"));
        assert!(about.list.is_some());
    }
}
