//! # solbridge-db: Database Layer for solbridge
//!
//! This crate provides persistence for the sync gateway. It uses SQLite for
//! local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       solbridge Data Flow                               │
//! │                                                                         │
//! │  Sync Engine (dispatcher handlers, retention pass)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   solbridge-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ documents.rs  │    │  (embedded)  │  │   │
//! │  │   │               │    │ fault.rs      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ activity.rs   │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (or :memory: in tests)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persistence Model
//!
//! Entity families with get/save ("latest wins") semantics - session, about,
//! statistics, device inventory, the device-log working set, wiring settings
//! - live as JSON documents in a single `documents` table. Fault records,
//! activity-log entries, and finalized device-log snapshots are append-only
//! rows in their own tables, pruned by the retention pass.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations per entity family

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::activity::ActivityLogRepository;
pub use repository::documents::{
    AboutRepository, DeviceLogRepository, DeviceRepository, SessionRepository,
    StatisticsRepository, WiringRepository,
};
pub use repository::fault::FaultRepository;
