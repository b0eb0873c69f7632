//! # Sync Error Types
//!
//! Error taxonomy for the sync engine. Transport and authentication
//! failures are expected operating conditions (the master reboots, the
//! network drops) and are retryable; persistence and config errors are not.

use thiserror::Error;

/// Errors that can occur during a sync cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The WebSocket connection could not be established or dropped.
    #[error("transport error: {0}")]
    Transport(String),

    /// The master never accepted the CONNECT handshake.
    #[error("authentication failed after {attempts} attempts")]
    AuthFailed { attempts: u32 },

    /// The master address could not be parsed into a URL.
    #[error("invalid master address: {0}")]
    InvalidAddress(String),

    /// Persistence failure.
    #[error("database error: {0}")]
    Database(#[from] solbridge_db::DbError),

    /// A payload could not be serialized for the wire.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration file problem.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Whether the operation is worth retrying on the next cycle.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(_) | SyncError::AuthFailed { .. }
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SyncError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SyncError::Transport("refused".into()).is_retryable());
        assert!(SyncError::AuthFailed { attempts: 3 }.is_retryable());
        assert!(!SyncError::Config("missing ip".into()).is_retryable());
        assert!(!SyncError::InvalidAddress("::".into()).is_retryable());
    }

    #[test]
    fn test_display_messages() {
        let err = SyncError::AuthFailed { attempts: 3 };
        assert_eq!(err.to_string(), "authentication failed after 3 attempts");
    }
}
