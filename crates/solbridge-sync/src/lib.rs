//! # solbridge-sync
//!
//! The master sync engine: dials the master device controller over
//! WebSocket, authenticates, pulls the full data set service by service,
//! validates PV string readings against the installer's wiring layout, and
//! persists everything through solbridge-db.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          solbridge-sync                                 │
//! │                                                                         │
//! │   ┌──────────┐    run_cycle    ┌──────────┐   open/authenticate        │
//! │   │  engine  │────────────────▶│ session  │──────────────┐             │
//! │   └────┬─────┘                 └──────────┘              │             │
//! │        │ pull_all                                        ▼             │
//! │   ┌────┴─────┐   call/dispatch  ┌──────────┐ frames ┌──────────┐      │
//! │   │  poller  │─────────────────▶│  client  │───────▶│transport │──WS──▶│
//! │   └────┬─────┘                  └──────────┘        └──────────┘      │
//! │        │ responses                                                     │
//! │   ┌────┴─────┐   IO blocks  ┌──────────┐   records  ┌──────────┐      │
//! │   │ dispatch │─────────────▶│ anomaly  │───────────▶│   db     │      │
//! │   └──────────┘              └──────────┘            └──────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One sync cycle is a single logical thread: exactly one request is in
//! flight at a time, enforced by `&mut` access to the client.

pub mod anomaly;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod poller;
pub mod protocol;
pub mod retention;
pub mod session;
pub mod transport;

pub use client::MasterClient;
pub use config::GatewayConfig;
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use metrics::SyncMetrics;
pub use protocol::{Request, Response, ResultData};
pub use session::SessionManager;
pub use transport::MasterLink;
