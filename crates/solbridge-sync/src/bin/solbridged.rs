//! # solbridged
//!
//! Reference daemon: loads the gateway config, opens the database, and runs
//! sync cycles on the configured interval with a daily retention prune.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  every poll_interval_secs  →  engine.run_cycle()                        │
//! │  every 24h                 →  retention::clear_data()                   │
//! │  SIGINT / ctrl-c           →  close the database, exit                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use solbridge_db::{Database, DbConfig};
use solbridge_sync::{retention, GatewayConfig, SyncEngine};

const RETENTION_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = GatewayConfig::load(config_path)?;
    info!(
        master = %config.master.ip,
        interval_secs = config.sync.poll_interval_secs,
        "solbridged starting"
    );

    let db = Database::new(DbConfig::new(config.database.path.clone())).await?;
    let mut engine = SyncEngine::new(config.clone(), db.clone());

    let mut cycle_timer =
        tokio::time::interval(Duration::from_secs(config.sync.poll_interval_secs));
    let mut retention_timer = tokio::time::interval(RETENTION_INTERVAL);

    loop {
        tokio::select! {
            _ = cycle_timer.tick() => {
                match engine.run_cycle().await {
                    Ok(true) => info!("Cycle complete"),
                    Ok(false) => info!("Cycle failed, will retry next interval"),
                    Err(e) => error!(error = %e, "Cycle aborted"),
                }
            }
            _ = retention_timer.tick() => {
                if let Err(e) = retention::clear_data(&db).await {
                    error!(error = %e, "Retention prune failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    db.close().await;
    Ok(())
}
