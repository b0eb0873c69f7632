//! # Session Manager
//!
//! Drives the handshake with the master and owns the session state.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Session State Machine                              │
//! │                                                                         │
//! │  ┌────────────┐  open()   ┌────────────┐  socket up  ┌────────────┐    │
//! │  │Disconnected│ ────────► │ Connecting │ ──────────► │ Connected  │    │
//! │  └────────────┘           └────────────┘             └─────┬──────┘    │
//! │        ▲                        │                          │           │
//! │        │                        │ dial failed              │ CONNECT   │
//! │        │◄───────────────────────┘                          │ accepted  │
//! │        │                                                   ▼           │
//! │        │                 auth exhausted           ┌──────────────┐     │
//! │        └◄──────────────────────────────────────── │Authenticated │     │
//! │                                                   └──────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure is terminal for the current cycle; the scheduler decides when
//! the next cycle runs.

use tracing::{info, warn};

use crate::client::MasterClient;
use crate::config::SyncSettings;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{Request, Response};
use crate::transport::MasterLink;

/// Session lifecycle state, from cold start to an authenticated pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Authenticated,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Connected => write!(f, "connected"),
            SessionState::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Owns the handshake sequencing for one cycle.
#[derive(Debug)]
pub struct SessionManager {
    state: SessionState,
    auth_attempts: u32,
    auth_retry_delay: std::time::Duration,
}

impl SessionManager {
    pub fn new(settings: &SyncSettings) -> Self {
        SessionManager {
            state: SessionState::Disconnected,
            auth_attempts: settings.auth_attempts,
            auth_retry_delay: settings.auth_retry_delay(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Opens the transport if it is not already up. An existing live link is
    /// reused as-is; dialing over it would leak the old connection.
    pub async fn open(&mut self, link: &mut MasterLink, url: &url::Url) -> SyncResult<()> {
        if link.is_connected() {
            self.state = SessionState::Connected;
            return Ok(());
        }

        self.state = SessionState::Connecting;
        match link.dial(url).await {
            Ok(()) => {
                self.state = SessionState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Runs the CONNECT handshake: up to `auth_attempts` calls, pausing
    /// between failed attempts, stopping at the first response. Returns the
    /// raw response for the dispatcher to persist the token from.
    pub async fn authenticate(
        &mut self,
        client: &mut MasterClient<'_>,
    ) -> SyncResult<Response> {
        for attempt in 1..=self.auth_attempts {
            info!(attempt, max = self.auth_attempts, "Sending CONNECT handshake");

            if let Some(response) = client.call(&Request::connect()).await {
                self.state = SessionState::Authenticated;
                return Ok(response);
            }

            warn!(attempt, "CONNECT attempt got no response");
            if attempt < self.auth_attempts {
                tokio::time::sleep(self.auth_retry_delay).await;
            }
        }

        self.state = SessionState::Disconnected;
        Err(SyncError::AuthFailed {
            attempts: self.auth_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncSettings;

    #[test]
    fn test_initial_state() {
        let manager = SessionManager::new(&SyncSettings::default());
        assert_eq!(manager.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_open_failure_returns_to_disconnected() {
        let mut manager = SessionManager::new(&SyncSettings::default());
        let mut link = MasterLink::new("echo-protocol");
        let url = url::Url::parse("ws://127.0.0.1:1/ws/home/overview").unwrap();

        assert!(manager.open(&mut link, &url).await.is_err());
        assert_eq!(manager.state(), SessionState::Disconnected);
    }
}
