//! # Master WebSocket Transport
//!
//! Owns the raw WebSocket connection to the master device controller.
//!
//! ## Connection Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Master Link States                                 │
//! │                                                                         │
//! │  ┌────────────┐      dial()       ┌────────────┐                       │
//! │  │Disconnected│ ────────────────► │ Connected  │                       │
//! │  └────────────┘                   └─────┬──────┘                       │
//! │        ▲                                │                               │
//! │        │      close / error / EOF      │                               │
//! │        └────────────────────────────────┘                               │
//! │                                                                         │
//! │  No automatic reconnection here: the engine re-dials at the start of   │
//! │  the next cycle if the link is down. One cycle = one logical thread,   │
//! │  so the stream is owned directly rather than split behind channels.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The master speaks a fixed WebSocket sub-protocol; the handshake carries
//! it in `Sec-WebSocket-Protocol`.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The WebSocket link to the master.
pub struct MasterLink {
    stream: Option<WsStream>,
    subprotocol: String,
}

impl MasterLink {
    /// Creates a disconnected link that will request the given sub-protocol
    /// when dialing.
    pub fn new(subprotocol: impl Into<String>) -> Self {
        MasterLink {
            stream: None,
            subprotocol: subprotocol.into(),
        }
    }

    /// Whether the link currently holds a live connection.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Dials the master. Replaces any existing connection.
    pub async fn dial(&mut self, url: &Url) -> SyncResult<()> {
        debug!(%url, "Dialing master");

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| SyncError::InvalidAddress(format!("{url}: {e}")))?;
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_str(&self.subprotocol)
                .map_err(|e| SyncError::Transport(e.to_string()))?,
        );

        let (stream, response) = connect_async(request).await?;
        info!(%url, status = %response.status(), "Master link established");

        self.stream = Some(stream);
        Ok(())
    }

    /// Sends one text frame. Drops the connection on write failure.
    pub async fn send_text(&mut self, text: String) -> SyncResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| SyncError::Transport("link is not connected".into()))?;

        if let Err(e) = stream.send(WsMessage::text(text)).await {
            warn!(error = %e, "Send failed, dropping master link");
            self.stream = None;
            return Err(e.into());
        }
        Ok(())
    }

    /// Receives the next text frame.
    ///
    /// Control frames (ping/pong) are consumed silently; binary frames are
    /// logged and skipped - the master only ever speaks JSON text. Returns
    /// `Ok(None)` when the peer closed the connection.
    pub async fn recv_text(&mut self) -> SyncResult<Option<String>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| SyncError::Transport("link is not connected".into()))?;

        loop {
            match stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(WsMessage::Binary(payload))) => {
                    warn!(bytes = payload.len(), "Ignoring unexpected binary frame");
                }
                Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => {}
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!(?frame, "Master closed the connection");
                    self.stream = None;
                    return Ok(None);
                }
                Some(Ok(WsMessage::Frame(_))) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "Receive failed, dropping master link");
                    self.stream = None;
                    return Err(e.into());
                }
                None => {
                    debug!("Master link stream ended");
                    self.stream = None;
                    return Ok(None);
                }
            }
        }
    }

    /// Closes the connection, if any. Errors during close are ignored - the
    /// link is considered down either way.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
            debug!("Master link closed");
        }
    }

}

impl std::fmt::Debug for MasterLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterLink")
            .field("connected", &self.is_connected())
            .field("subprotocol", &self.subprotocol)
            .finish()
    }
}
