//! # solbridge-core: Pure Domain Logic for solbridge
//!
//! This crate holds every type the gateway persists or evaluates, as pure
//! data with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      solbridge Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  solbridge-sync (Engine)                        │   │
//! │  │   master link ─► correlator ─► dispatcher ─► anomaly rules     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ solbridge-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────────────────────┐  │   │
//! │  │   │   types   │  │  strings  │  │        messages           │  │   │
//! │  │   │  Device   │  │StringRead.│  │  opaque templates keyed   │  │   │
//! │  │   │  Fault    │  │ position  │  │  by code                  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 solbridge-db (Persistence)                      │   │
//! │  │          SQLite documents, fault/activity repositories          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Device, FaultRecord, documents, etc.)
//! - [`strings`] - PV string readings and power derivation
//! - [`messages`] - Message templates keyed by code

// =============================================================================
// Module Declarations
// =============================================================================

pub mod messages;
pub mod strings;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use strings::StringReading;
pub use types::{
    AboutDocument, ActivityCategory, ActivityLevel, ActivityLogEntry, DataPoint, Device,
    DeviceDocument, DeviceLogDocument, DeviceStatus, FaultCategory, FaultEvent, FaultRecord,
    IoChannel, IoLogBlock, PowerLogBlock, SessionRecord, StatisticsDocument, WiringConfig,
    WiringSettings,
};
