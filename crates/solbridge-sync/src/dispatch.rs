//! # Response Dispatcher
//!
//! Routes a decoded response to its transform-and-persist handler. Routing
//! is an exhaustive match over the service tag, one arm per service:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  connect                  → persist token, mark connected               │
//! │  about                    → merge about doc, capture product identity   │
//! │  statistics               → pull detail rows, append, persist           │
//! │  device_list              → enrich rows, per-device info, persist       │
//! │  device_log               → append power block                          │
//! │  device_log_io            → append IO block, run anomaly rules          │
//! │  fault                    → replace master fault list                   │
//! │  statistic_device_details │ unsolicited (only valid as a sub-call)      │
//! │  device_info              │ → log and drop                              │
//! │  <anything else>          → log and drop                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A missing response, a failed `result_code`, or an unknown tag is never an
//! error here: the cycle keeps going and the gap shows up in the logs. Only
//! persistence failures propagate.

use tracing::{debug, warn};

use solbridge_core::{
    AboutDocument, Device, DeviceDocument, IoLogBlock, PowerLogBlock, StatisticsDocument,
};
use solbridge_db::Database;

use crate::anomaly;
use crate::client::MasterClient;
use crate::error::SyncResult;
use crate::protocol::{Request, Response, ResultData};

/// Routes responses into the database.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    db: Database,
}

impl Dispatcher {
    pub fn new(db: Database) -> Self {
        Dispatcher { db }
    }

    /// Routes one response. `client` is borrowed for the handlers that make
    /// follow-up calls (statistics detail, per-device info).
    pub async fn handle(
        &self,
        client: &mut MasterClient<'_>,
        response: Option<Response>,
    ) -> SyncResult<()> {
        let Some(response) = response else {
            debug!("No response to dispatch");
            return Ok(());
        };

        let result_code = response.result_code;
        let Some(data) = response.into_success_data() else {
            warn!(result_code, "Dropping failed or empty response");
            return Ok(());
        };

        match data {
            ResultData::Connect { token } => self.on_connect(token).await,
            ResultData::About { product_name, list } => {
                self.on_about(product_name, list).await
            }
            ResultData::Statistics { list } => self.on_statistics(client, list).await,
            ResultData::DeviceList { list } => {
                let devices = list.into_iter().map(|row| row.into_device()).collect();
                self.on_device_list(client, devices).await
            }
            ResultData::DeviceLog { dev_id, list } => {
                self.on_device_log(PowerLogBlock { dev_id, list }).await
            }
            ResultData::DeviceLogIo { dev_id, list } => {
                self.on_device_log_io(IoLogBlock { dev_id, list }).await
            }
            ResultData::Fault { list } => {
                self.db.faults().replace_master_list(&list).await?;
                Ok(())
            }
            ResultData::StatisticDeviceDetails { .. } => {
                warn!("Unsolicited statistic detail response, dropping");
                Ok(())
            }
            ResultData::DeviceInfo { .. } => {
                warn!("Unsolicited device info response, dropping");
                Ok(())
            }
            ResultData::Unknown => {
                warn!("Unrecognized service tag, dropping");
                Ok(())
            }
        }
    }

    /// CONNECT accepted: persist the issued token and mark the session up.
    async fn on_connect(&self, token: String) -> SyncResult<()> {
        let sessions = self.db.session();
        let mut session = sessions.get().await?;
        session.token = Some(token);
        session.is_connected = true;
        sessions.save(&session).await?;
        debug!("Session token persisted");
        Ok(())
    }

    /// ABOUT (also answers the PRODUCT call): merge into the about document
    /// and mirror the product identity into the session record.
    async fn on_about(
        &self,
        product_name: Option<String>,
        list: Option<Vec<solbridge_core::DataPoint>>,
    ) -> SyncResult<()> {
        let abouts = self.db.about();
        let mut about = abouts.get().await?;
        about.merge(AboutDocument {
            product_name: product_name.clone(),
            list: list.clone(),
        });
        abouts.save(&about).await?;

        let sessions = self.db.session();
        let mut session = sessions.get().await?;
        if let Some(name) = product_name {
            session.product_name = Some(name);
        }
        if let Some(sn) = list
            .as_deref()
            .and_then(|l| l.first())
            .map(|p| p.data_value.clone())
        {
            session.device_sn = Some(sn.clone());
            session.master_key = Some(sn);
        }
        sessions.save(&session).await?;
        Ok(())
    }

    /// STATISTICS: pull the per-device detail rows, append them as one extra
    /// block, and persist the snapshot. A missing detail response persists
    /// the plant rows alone.
    async fn on_statistics(
        &self,
        client: &mut MasterClient<'_>,
        mut list: Vec<serde_json::Value>,
    ) -> SyncResult<()> {
        let token = self.current_token().await?;
        let detail = client
            .call(&Request::StatisticDeviceDetails {
                token: token.clone(),
            })
            .await
            .and_then(Response::into_success_data);

        if let Some(ResultData::StatisticDeviceDetails { list: rows }) = detail {
            list.push(serde_json::json!({
                "service": "statistic_device_details",
                "list": rows,
            }));
        } else {
            warn!("Statistic detail pull returned nothing");
        }

        self.db.statistics().save(&StatisticsDocument { list }).await?;
        Ok(())
    }

    /// DEVICE_LIST: replace the inventory, enriching each device with its
    /// extended info. One device's failed info pull must not block the rest.
    async fn on_device_list(
        &self,
        client: &mut MasterClient<'_>,
        mut devices: Vec<Device>,
    ) -> SyncResult<()> {
        let token = self.current_token().await?;

        for device in &mut devices {
            let info = client
                .call(&Request::DeviceInfo {
                    token: token.clone(),
                    dev_id: device.dev_id,
                })
                .await
                .and_then(Response::into_success_data);

            match info {
                Some(ResultData::DeviceInfo { list }) => device.device_info = Some(list),
                _ => warn!(dev_id = device.dev_id, "Device info pull returned nothing"),
            }
        }

        self.db.devices().save(&DeviceDocument { list: devices }).await?;
        Ok(())
    }

    /// DEVICE_LOG: append the power block to the working set.
    async fn on_device_log(&self, block: PowerLogBlock) -> SyncResult<()> {
        let logs = self.db.device_logs();
        let mut doc = logs.get().await?;
        doc.list.push(block);
        logs.save(&doc).await?;
        Ok(())
    }

    /// DEVICE_LOG_IO: append the IO block, then validate its string readings
    /// against the wiring layout. Devices without a wiring entry are not
    /// validated.
    async fn on_device_log_io(&self, block: IoLogBlock) -> SyncResult<()> {
        if let Some(dev_id) = block.dev_id {
            let settings = self.db.wiring().get().await?;
            if let Some(config) = settings.for_device(dev_id) {
                let faults = anomaly::evaluate(dev_id, &block, config, chrono::Utc::now());
                for fault in &faults {
                    self.db.faults().record(fault).await?;
                }
                if !faults.is_empty() {
                    warn!(dev_id, count = faults.len(), "String anomalies detected");
                }
            }
        }

        let logs = self.db.device_logs();
        let mut doc = logs.get().await?;
        doc.list_io.push(block);
        logs.save(&doc).await?;
        Ok(())
    }

    /// The persisted session token, empty when the master never issued one.
    /// Sub-calls with an empty token fail on the master side and come back
    /// as dropped responses, which is the behavior we want.
    async fn current_token(&self) -> SyncResult<String> {
        Ok(self.db.session().get().await?.token.unwrap_or_default())
    }
}
