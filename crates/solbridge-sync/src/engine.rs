//! # Sync Engine
//!
//! Top-level cycle driver: one call to `run_cycle` takes the gateway from
//! "maybe disconnected" through handshake, authentication, and the full
//! pull, and records the outcome.
//!
//! ## Cycle Outcome
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transport failed   → activity ERROR entry, Ok(false)                   │
//! │  auth exhausted     → Ok(false) (no extra activity entry)               │
//! │  no token issued    → Ok(false)                                         │
//! │  pull completed     → activity SUCCESS entry, Ok(true)                  │
//! │  persistence failed → Err (fatal, not a connectivity matter)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never loops: the caller (the daemon's interval timer, or a
//! test) decides when to run the next cycle.

use tracing::{info, warn};

use solbridge_core::messages;
use solbridge_core::ActivityCategory;
use solbridge_db::Database;

use crate::client::MasterClient;
use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::error::SyncResult;
use crate::metrics::SyncMetrics;
use crate::poller::Poller;
use crate::session::SessionManager;
use crate::transport::MasterLink;

/// Owns everything one gateway needs to sync against its master.
pub struct SyncEngine {
    config: GatewayConfig,
    db: Database,
    link: MasterLink,
    metrics: SyncMetrics,
    dispatcher: Dispatcher,
    poller: Poller,
}

impl SyncEngine {
    pub fn new(config: GatewayConfig, db: Database) -> Self {
        let dispatcher = Dispatcher::new(db.clone());
        let poller = Poller::new(
            db.clone(),
            dispatcher.clone(),
            config.master.lang.clone(),
            std::time::Duration::from_millis(config.sync.device_pause_ms),
        );
        let link = MasterLink::new(config.master.subprotocol.clone());

        SyncEngine {
            config,
            db,
            link,
            metrics: SyncMetrics::new(),
            dispatcher,
            poller,
        }
    }

    /// Counters accumulated since the engine was created.
    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    /// Runs one full sync cycle. `Ok(true)` means the master was reached,
    /// authenticated, and fully pulled; `Ok(false)` is a connectivity or
    /// auth failure worth retrying next interval.
    pub async fn run_cycle(&mut self) -> SyncResult<bool> {
        self.metrics.connect_attempts += 1;
        info!(master = %self.config.master.ip, "Sync cycle starting");

        let outcome = self.cycle_inner().await;
        match &outcome {
            Ok(true) => self.metrics.connect_successes += 1,
            Ok(false) | Err(_) => self.metrics.connect_failures += 1,
        }
        self.metrics.log_snapshot();
        outcome
    }

    async fn cycle_inner(&mut self) -> SyncResult<bool> {
        let url = self.config.master_url()?;

        // Down until proven up: the flag only comes back on a successful
        // CONNECT dispatch.
        let sessions = self.db.session();
        let mut session = sessions.get().await?;
        session.is_connected = false;
        session.master_addr = self.config.master.ip.clone();
        sessions.save(&session).await?;

        let mut manager = SessionManager::new(&self.config.sync);
        if let Err(e) = manager.open(&mut self.link, &url).await {
            warn!(error = %e, master = %self.config.master.ip, "Master unreachable");
            self.db
                .activity()
                .error(
                    ActivityCategory::Master,
                    format!("{}: {}", messages::MASTER_NOT_FOUND, self.config.master.ip),
                )
                .await?;
            return Ok(false);
        }

        let timeout = self.config.sync.call_timeout();
        let mut client = MasterClient::new(&mut self.link, &mut self.metrics, timeout);

        let login = match manager.authenticate(&mut client).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Authentication failed, aborting cycle");
                return Ok(false);
            }
        };
        self.dispatcher.handle(&mut client, Some(login)).await?;

        let Some(token) = self.db.session().get().await?.token else {
            warn!("CONNECT response carried no token, aborting cycle");
            return Ok(false);
        };
        info!(token_len = token.len(), "Authenticated, starting full pull");

        self.poller.pull_all(&mut client).await?;

        self.db
            .activity()
            .success(ActivityCategory::Master, messages::MASTER_UPLOAD_SUCCESS)
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solbridge_db::DbConfig;

    fn unreachable_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.master.ip = "127.0.0.1:1".to_string();
        config.sync.auth_retry_delay_ms = 10;
        config
    }

    #[tokio::test]
    async fn test_unreachable_master_logs_activity_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut engine = SyncEngine::new(unreachable_config(), db.clone());

        let reached = engine.run_cycle().await.unwrap();
        assert!(!reached);
        assert_eq!(engine.metrics().connect_attempts, 1);
        assert_eq!(engine.metrics().connect_failures, 1);

        let entries = db.activity().recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "master not found: 127.0.0.1:1");

        let session = db.session().get().await.unwrap();
        assert!(!session.is_connected);
        assert_eq!(session.master_addr, "127.0.0.1:1");
    }
}
