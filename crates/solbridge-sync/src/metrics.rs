//! # Sync Metrics
//!
//! Plain counters owned by the engine, logged as a structured snapshot at
//! the end of every cycle. Process-lifetime only; nothing here is persisted.

/// Counters for one engine instance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncMetrics {
    /// Cycles that attempted to reach the master.
    pub connect_attempts: u64,

    /// Cycles that authenticated and pulled successfully.
    pub connect_successes: u64,

    /// Cycles that failed (transport, auth, or pull).
    pub connect_failures: u64,

    /// Requests written to the socket.
    pub requests_sent: u64,

    /// Frames received and parsed as responses.
    pub responses_received: u64,

    /// Calls that expired without a response.
    pub call_timeouts: u64,
}

impl SyncMetrics {
    pub fn new() -> Self {
        SyncMetrics::default()
    }

    /// Emits the current counters as one structured log event.
    pub fn log_snapshot(&self) {
        tracing::info!(
            connect_attempts = self.connect_attempts,
            connect_successes = self.connect_successes,
            connect_failures = self.connect_failures,
            requests_sent = self.requests_sent,
            responses_received = self.responses_received,
            call_timeouts = self.call_timeouts,
            "Sync metrics"
        );
    }
}
