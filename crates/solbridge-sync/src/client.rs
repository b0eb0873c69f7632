//! # Request Correlator
//!
//! Pairs each request with the next response frame. The master answers
//! strictly in order and the gateway only ever has one request in flight,
//! so correlation is positional: send, then wait for the next text frame.
//!
//! ## Call Outcome Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Outcome                          │  call() returns                     │
//! │  ─────────────────────────────────┼──────────────────────────────────── │
//! │  Response frame within timeout    │  Some(Response)                     │
//! │  Timeout expired                  │  None (timeout counter bumped)      │
//! │  Frame is not valid JSON          │  None                               │
//! │  Connection closed / transport    │  None (link dropped)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `None` never aborts the cycle on its own; each caller decides whether
//! the missing response is fatal for its step. The single-outstanding-call
//! rule is enforced by the borrow checker: `call` takes `&mut self` and the
//! client holds `&mut` over the link, so a second concurrent call does not
//! compile.

use std::time::Duration;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::metrics::SyncMetrics;
use crate::protocol::{Request, Response};
use crate::transport::MasterLink;

/// The calling side of the master protocol for one sync cycle.
pub struct MasterClient<'a> {
    link: &'a mut MasterLink,
    metrics: &'a mut SyncMetrics,
    timeout: Duration,
}

impl<'a> MasterClient<'a> {
    pub fn new(link: &'a mut MasterLink, metrics: &'a mut SyncMetrics, timeout: Duration) -> Self {
        MasterClient {
            link,
            metrics,
            timeout,
        }
    }

    /// Sends one request and waits for its response.
    pub async fn call(&mut self, request: &Request) -> Option<Response> {
        let service = request.service();

        let payload = match serde_json::to_string(request) {
            Ok(payload) => payload,
            Err(e) => {
                // A request that cannot serialize is a programming error;
                // surface it loudly but keep the cycle alive.
                warn!(service, error = %e, "Failed to encode request");
                return None;
            }
        };

        if let Err(e) = self.link.send_text(payload).await {
            warn!(service, error = %e, "Failed to send request");
            return None;
        }
        self.metrics.requests_sent += 1;
        debug!(service, "Request sent");

        match tokio::time::timeout(self.timeout, self.link.recv_text()).await {
            Ok(Ok(Some(frame))) => {
                self.metrics.responses_received += 1;
                match serde_json::from_str::<Response>(&frame) {
                    Ok(response) => {
                        debug!(service, result_code = response.result_code, "Response received");
                        Some(response)
                    }
                    Err(e) => {
                        warn!(service, error = %e, "Response frame is not a valid envelope");
                        None
                    }
                }
            }
            Ok(Ok(None)) => {
                warn!(service, "Connection closed while waiting for response");
                None
            }
            Ok(Err(SyncError::Transport(e))) => {
                warn!(service, error = %e, "Transport error while waiting for response");
                None
            }
            Ok(Err(e)) => {
                warn!(service, error = %e, "Error while waiting for response");
                None
            }
            Err(_) => {
                self.metrics.call_timeouts += 1;
                warn!(service, timeout_ms = self.timeout.as_millis() as u64, "Call timed out");
                // The link stays up so the handshake retry loop can reuse
                // it. A response arriving after the deadline is consumed as
                // the answer to the NEXT call; the protocol has no request
                // ids, so a master that answers late rather than never will
                // desynchronize until the connection is recycled.
                None
            }
        }
    }

    /// Whether the underlying link is still up.
    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }
}
