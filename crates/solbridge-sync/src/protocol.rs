//! # Master Wire Protocol
//!
//! JSON text frames over WebSocket. Requests carry a `service` discriminator
//! plus payload fields; responses carry `result_code` (1 = success) and a
//! `result_data` object repeating the `service` discriminator.
//!
//! ## Message Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Gateway                                   Master                       │
//! │     │                                         │                         │
//! │     │──{"service":"connect","token":nonce}───▶│                         │
//! │     │◀─{"result_code":1,"result_data":                                  │
//! │     │      {"service":"connect","token":t}}───│                         │
//! │     │                                         │                         │
//! │     │──{"service":"device_list","token":t}───▶│                         │
//! │     │◀─{"result_code":1,"result_data":                                  │
//! │     │      {"service":"device_list",...}}─────│                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both envelopes are internally tagged serde enums, so routing a response is
//! an exhaustive match instead of string comparisons. Service tags the
//! gateway does not know fall into `ResultData::Unknown` and are dropped by
//! the dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use solbridge_core::{DataPoint, Device, IoChannel};

// =============================================================================
// Requests
// =============================================================================

/// A request to the master, tagged by service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "snake_case")]
pub enum Request {
    /// Authentication handshake. `token` is a locally generated nonce; the
    /// master answers with the real session token.
    Connect { token: String },

    /// Product identity (no auth required by the master).
    Product,

    /// Localized about/version info.
    About { token: String, lang: String },

    /// Plant-level statistics snapshot.
    Statistics { token: String },

    /// Per-device statistics detail rows.
    StatisticDeviceDetails { token: String },

    /// Device inventory.
    DeviceList { token: String },

    /// Extended info for one device.
    DeviceInfo { token: String, dev_id: i64 },

    /// Power log for one device.
    DeviceLog { token: String, dev_id: i64 },

    /// IO (string voltage/current) log for one device.
    DeviceLogIo { token: String, dev_id: i64 },

    /// Master-reported fault list.
    Fault { token: String },
}

impl Request {
    /// Builds a CONNECT request with a fresh nonce.
    pub fn connect() -> Self {
        Request::Connect {
            token: Uuid::new_v4().to_string(),
        }
    }

    /// The service tag this request carries on the wire.
    pub fn service(&self) -> &'static str {
        match self {
            Request::Connect { .. } => "connect",
            Request::Product => "product",
            Request::About { .. } => "about",
            Request::Statistics { .. } => "statistics",
            Request::StatisticDeviceDetails { .. } => "statistic_device_details",
            Request::DeviceList { .. } => "device_list",
            Request::DeviceInfo { .. } => "device_info",
            Request::DeviceLog { .. } => "device_log",
            Request::DeviceLogIo { .. } => "device_log_io",
            Request::Fault { .. } => "fault",
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Response envelope. `result_code` 1 means success; any other code means
/// the payload (if present) must not be trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub result_code: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_data: Option<ResultData>,
}

impl Response {
    pub const SUCCESS: i64 = 1;

    /// Returns the payload only when the master reported success.
    pub fn into_success_data(self) -> Option<ResultData> {
        if self.result_code == Self::SUCCESS {
            self.result_data
        } else {
            None
        }
    }
}

/// Response payload, tagged by the same service discriminator as requests.
///
/// `device_log` and `device_log_io` payloads do not echo the device id back;
/// the poller injects it before dispatch, which is why the blocks carry an
/// `Option<i64>` id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "snake_case")]
pub enum ResultData {
    /// Session token issued by the master.
    Connect { token: String },

    /// Product identity and/or localized about info. The master answers the
    /// PRODUCT and ABOUT calls with the same tag, fields filled as known.
    About {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        product_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        list: Option<Vec<DataPoint>>,
    },

    /// Plant statistics rows (opaque to the gateway).
    Statistics {
        #[serde(default)]
        list: Vec<Value>,
    },

    /// Per-device statistics detail rows.
    StatisticDeviceDetails {
        #[serde(default)]
        list: Vec<Value>,
    },

    /// Device inventory rows.
    DeviceList {
        #[serde(default)]
        list: Vec<DeviceRow>,
    },

    /// Extended info for one device.
    DeviceInfo {
        #[serde(default)]
        list: Vec<DataPoint>,
    },

    /// Power log block for one device.
    DeviceLog {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dev_id: Option<i64>,
        #[serde(default)]
        list: Vec<DataPoint>,
    },

    /// IO log block for one device.
    DeviceLogIo {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dev_id: Option<i64>,
        #[serde(default)]
        list: Vec<IoChannel>,
    },

    /// Master-reported fault list (opaque to the gateway).
    Fault {
        #[serde(default)]
        list: Vec<Value>,
    },

    /// A service tag this gateway version does not know.
    #[serde(other)]
    Unknown,
}

/// One raw inventory row as the master reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRow {
    pub dev_id: i64,

    #[serde(default)]
    pub dev_sn: String,

    #[serde(default)]
    pub dev_name: String,

    #[serde(default)]
    pub dev_status: i64,
}

impl DeviceRow {
    /// Enriches the raw row into a display-ready device record.
    pub fn into_device(self) -> Device {
        Device::from_raw(self.dev_id, self.dev_sn, self.dev_name, self.dev_status)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_with_service_tag() {
        let req = Request::DeviceInfo {
            token: "t1".into(),
            dev_id: 4,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({"service": "device_info", "token": "t1", "dev_id": 4})
        );
    }

    #[test]
    fn test_connect_nonces_are_unique() {
        let (a, b) = (Request::connect(), Request::connect());
        assert_ne!(a, b);
        assert_eq!(a.service(), "connect");
    }

    #[test]
    fn test_response_parses_connect_payload() {
        let raw = r#"{"result_code":1,"result_data":{"service":"connect","token":"sess-9"}}"#;
        let response: Response = serde_json::from_str(raw).unwrap();
        match response.into_success_data() {
            Some(ResultData::Connect { token }) => assert_eq!(token, "sess-9"),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_failed_result_code_hides_payload() {
        let raw = r#"{"result_code":0,"result_data":{"service":"connect","token":"x"}}"#;
        let response: Response = serde_json::from_str(raw).unwrap();
        assert!(response.into_success_data().is_none());
    }

    #[test]
    fn test_unknown_service_tag_is_tolerated() {
        let raw = r#"{"result_code":1,"result_data":{"service":"firmware_update","pct":40}}"#;
        let response: Response = serde_json::from_str(raw).unwrap();
        assert_eq!(response.into_success_data(), Some(ResultData::Unknown));
    }

    #[test]
    fn test_device_list_rows_enrich() {
        let raw = r#"{"result_code":1,"result_data":{"service":"device_list",
            "list":[{"dev_id":1,"dev_sn":"SN1","dev_name":"Inverter 1","dev_status":2}]}}"#;
        let response: Response = serde_json::from_str(raw).unwrap();
        let Some(ResultData::DeviceList { list }) = response.into_success_data() else {
            panic!("expected device list");
        };
        let device = list.into_iter().next().unwrap().into_device();
        assert_eq!(device.status_color, "#F56C6C");
    }

    #[test]
    fn test_io_log_without_dev_id() {
        // The master does not echo the device id per the wire contract.
        let raw = r#"{"result_code":1,"result_data":{"service":"device_log_io",
            "list":[{"name":"PV String 1","voltage":310.0,"current":2.5}]}}"#;
        let response: Response = serde_json::from_str(raw).unwrap();
        match response.into_success_data() {
            Some(ResultData::DeviceLogIo { dev_id, list }) => {
                assert!(dev_id.is_none());
                assert_eq!(list.len(), 1);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }
}
