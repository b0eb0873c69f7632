//! # Gateway Configuration
//!
//! Configuration management for the sync engine and daemon.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SOLBRIDGE_MASTER_IP=192.168.1.40                                   │
//! │     SOLBRIDGE_DB_PATH=/var/lib/solbridge/gateway.db                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/solbridge/gateway.toml (Linux)                           │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # gateway.toml
//! [master]
//! ip = "192.168.1.40"
//! lang = "en_us"
//!
//! [sync]
//! call_timeout_ms = 3000
//! auth_attempts = 3
//! auth_retry_delay_ms = 1000
//! poll_interval_secs = 30
//!
//! [database]
//! path = "/var/lib/solbridge/gateway.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Master Settings
// =============================================================================

/// Where and how to reach the master device controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterSettings {
    /// Master address (host[:port]).
    #[serde(default)]
    pub ip: String,

    /// Language code sent with the ABOUT call.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// WebSocket endpoint path on the master.
    #[serde(default = "default_ws_path")]
    pub path: String,

    /// WebSocket sub-protocol the master expects.
    #[serde(default = "default_subprotocol")]
    pub subprotocol: String,
}

fn default_lang() -> String {
    "en_us".to_string()
}

fn default_ws_path() -> String {
    "/ws/home/overview".to_string()
}

fn default_subprotocol() -> String {
    "echo-protocol".to_string()
}

impl Default for MasterSettings {
    fn default() -> Self {
        MasterSettings {
            ip: String::new(),
            lang: default_lang(),
            path: default_ws_path(),
            subprotocol: default_subprotocol(),
        }
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Timing and retry behavior for one sync cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// How long a call waits for its response before giving up (ms).
    #[serde(default = "default_call_timeout")]
    pub call_timeout_ms: u64,

    /// CONNECT handshake attempts per cycle.
    #[serde(default = "default_auth_attempts")]
    pub auth_attempts: u32,

    /// Pause between failed handshake attempts (ms).
    #[serde(default = "default_auth_retry_delay")]
    pub auth_retry_delay_ms: u64,

    /// Interval between sync cycles (seconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Optional pause between per-device log pulls (ms). Zero disables it.
    #[serde(default)]
    pub device_pause_ms: u64,
}

fn default_call_timeout() -> u64 {
    3000
}
fn default_auth_attempts() -> u32 {
    3
}
fn default_auth_retry_delay() -> u64 {
    1000
}
fn default_poll_interval() -> u64 {
    30
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            call_timeout_ms: default_call_timeout(),
            auth_attempts: default_auth_attempts(),
            auth_retry_delay_ms: default_auth_retry_delay(),
            poll_interval_secs: default_poll_interval(),
            device_pause_ms: 0,
        }
    }
}

impl SyncSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn auth_retry_delay(&self) -> Duration {
        Duration::from_millis(self.auth_retry_delay_ms)
    }
}

// =============================================================================
// Database Settings
// =============================================================================

/// Where the SQLite database lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("io", "solbridge", "gateway")
        .map(|dirs| dirs.data_dir().join("gateway.db"))
        .unwrap_or_else(|| PathBuf::from("gateway.db"))
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
        }
    }
}

// =============================================================================
// Main Gateway Configuration
// =============================================================================

/// Complete gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Master connection settings.
    #[serde(default)]
    pub master: MasterSettings,

    /// Sync cycle behavior.
    #[serde(default)]
    pub sync: SyncSettings,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl GatewayConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (gateway.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading gateway config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load gateway config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::Config("no config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Gateway config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.master.ip.is_empty() {
            return Err(SyncError::Config("master.ip is required".into()));
        }
        if self.sync.auth_attempts == 0 {
            return Err(SyncError::Config(
                "sync.auth_attempts must be at least 1".into(),
            ));
        }
        if self.sync.call_timeout_ms == 0 {
            return Err(SyncError::Config(
                "sync.call_timeout_ms must be greater than 0".into(),
            ));
        }

        // Fail early on an address the dialer could never use.
        self.master_url()?;

        Ok(())
    }

    /// Builds the WebSocket URL for the master endpoint.
    pub fn master_url(&self) -> SyncResult<url::Url> {
        let raw = format!("ws://{}{}", self.master.ip, self.master.path);
        url::Url::parse(&raw).map_err(|e| SyncError::InvalidAddress(format!("{raw}: {e}")))
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(ip) = std::env::var("SOLBRIDGE_MASTER_IP") {
            debug!(master_ip = %ip, "Overriding master address from environment");
            self.master.ip = ip;
        }

        if let Ok(lang) = std::env::var("SOLBRIDGE_LANG") {
            self.master.lang = lang;
        }

        if let Ok(path) = std::env::var("SOLBRIDGE_DB_PATH") {
            debug!(db_path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(interval) = std::env::var("SOLBRIDGE_POLL_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse::<u64>() {
                self.sync.poll_interval_secs = secs;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "solbridge", "gateway")
            .map(|dirs| dirs.config_dir().join("gateway.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.master.ip = "192.168.1.40".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.master.lang, "en_us");
        assert_eq!(config.master.subprotocol, "echo-protocol");
        assert_eq!(config.sync.call_timeout_ms, 3000);
        assert_eq!(config.sync.auth_attempts, 3);
        assert_eq!(config.sync.auth_retry_delay_ms, 1000);
    }

    #[test]
    fn test_validation_requires_master_ip() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_err());
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_master_url_composition() {
        let url = configured().master_url().unwrap();
        assert_eq!(url.as_str(), "ws://192.168.1.40/ws/home/overview");

        let mut with_port = configured();
        with_port.master.ip = "10.0.0.2:8082".to_string();
        assert_eq!(
            with_port.master_url().unwrap().as_str(),
            "ws://10.0.0.2:8082/ws/home/overview"
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let config = configured();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[master]"));
        assert!(toml_str.contains("[sync]"));

        let parsed: GatewayConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.master.ip, "192.168.1.40");
    }
}
