//! # Sync Orchestrator
//!
//! Drives the full pull after authentication, one service at a time.
//!
//! ## Pull Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. product         product identity (answered with the about tag)      │
//! │  2. about           localized version/info block                        │
//! │  3. statistics      plant snapshot (+ detail sub-call in the handler)   │
//! │  4. device_list     inventory (+ per-device info in the handler)        │
//! │  5. per device:     device_log, device_log_io, history flush            │
//! │  6. fault           master-reported fault list                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every step's response goes through the dispatcher; a step that returns
//! nothing is logged there and the sequence continues. The device-log
//! working set is reset once before the per-device phase so each cycle's
//! document only holds that cycle's readings.

use std::time::Duration;
use tracing::{debug, info};

use solbridge_core::DeviceLogDocument;
use solbridge_db::Database;

use crate::client::MasterClient;
use crate::dispatch::Dispatcher;
use crate::error::SyncResult;
use crate::protocol::{Request, Response, ResultData};

/// Pulls the master's full data set for one cycle.
#[derive(Debug)]
pub struct Poller {
    db: Database,
    dispatcher: Dispatcher,
    lang: String,
    device_pause: Duration,
}

impl Poller {
    pub fn new(db: Database, dispatcher: Dispatcher, lang: String, device_pause: Duration) -> Self {
        Poller {
            db,
            dispatcher,
            lang,
            device_pause,
        }
    }

    /// Runs the full pull sequence with the given authenticated client.
    pub async fn pull_all(&self, client: &mut MasterClient<'_>) -> SyncResult<()> {
        let token = self
            .db
            .session()
            .get()
            .await?
            .token
            .unwrap_or_default();

        let response = client.call(&Request::Product).await;
        self.dispatcher.handle(client, response).await?;

        let response = client
            .call(&Request::About {
                token: token.clone(),
                lang: self.lang.clone(),
            })
            .await;
        self.dispatcher.handle(client, response).await?;

        let response = client
            .call(&Request::Statistics {
                token: token.clone(),
            })
            .await;
        self.dispatcher.handle(client, response).await?;

        let response = client
            .call(&Request::DeviceList {
                token: token.clone(),
            })
            .await;
        self.dispatcher.handle(client, response).await?;

        self.pull_device_logs(client, &token).await?;

        let response = client
            .call(&Request::Fault {
                token: token.clone(),
            })
            .await;
        self.dispatcher.handle(client, response).await?;

        info!("Full pull complete");
        Ok(())
    }

    /// Step 5: per-device power and IO logs, flushed into history after
    /// each device.
    async fn pull_device_logs(
        &self,
        client: &mut MasterClient<'_>,
        token: &str,
    ) -> SyncResult<()> {
        // Fresh working set for this cycle.
        self.db.device_logs().save(&DeviceLogDocument::default()).await?;

        let inventory = self.db.devices().get().await?;
        debug!(devices = inventory.list.len(), "Pulling per-device logs");

        for device in &inventory.list {
            let dev_id = device.dev_id;

            let response = client
                .call(&Request::DeviceLog {
                    token: token.to_string(),
                    dev_id,
                })
                .await;
            self.dispatcher
                .handle(client, tag_device(response, dev_id))
                .await?;

            let response = client
                .call(&Request::DeviceLogIo {
                    token: token.to_string(),
                    dev_id,
                })
                .await;
            self.dispatcher
                .handle(client, tag_device(response, dev_id))
                .await?;

            self.flush_history(dev_id).await?;

            if !self.device_pause.is_zero() {
                tokio::time::sleep(self.device_pause).await;
            }
        }

        Ok(())
    }

    /// Snapshots one device's blocks from the working set into durable
    /// history.
    async fn flush_history(&self, dev_id: i64) -> SyncResult<()> {
        let logs = self.db.device_logs();
        let doc = logs.get().await?;

        let power: Vec<_> = doc
            .list
            .iter()
            .filter(|b| b.dev_id == Some(dev_id))
            .collect();
        let io: Vec<_> = doc
            .list_io
            .iter()
            .filter(|b| b.dev_id == Some(dev_id))
            .collect();

        if power.is_empty() && io.is_empty() {
            debug!(dev_id, "No log blocks to flush");
            return Ok(());
        }

        let body = serde_json::json!({ "list": power, "list_io": io });
        logs.append_history(dev_id, &body).await?;
        Ok(())
    }
}

/// Stamps the device id onto a log payload. The master does not echo the id
/// back, so the poller is the only place that knows which device a block
/// belongs to.
fn tag_device(response: Option<Response>, dev_id: i64) -> Option<Response> {
    let mut response = response?;
    match &mut response.result_data {
        Some(ResultData::DeviceLog { dev_id: id, .. })
        | Some(ResultData::DeviceLogIo { dev_id: id, .. }) => *id = Some(dev_id),
        _ => {}
    }
    Some(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_device_stamps_log_payloads() {
        let raw = r#"{"result_code":1,"result_data":{"service":"device_log","list":[]}}"#;
        let response: Response = serde_json::from_str(raw).unwrap();

        let tagged = tag_device(Some(response), 42).unwrap();
        match tagged.result_data {
            Some(ResultData::DeviceLog { dev_id, .. }) => assert_eq!(dev_id, Some(42)),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_tag_device_leaves_other_payloads_alone() {
        let raw = r#"{"result_code":1,"result_data":{"service":"connect","token":"t"}}"#;
        let response: Response = serde_json::from_str(raw).unwrap();

        let tagged = tag_device(Some(response.clone()), 42).unwrap();
        assert_eq!(tagged, response);
        assert!(tag_device(None, 42).is_none());
    }
}
