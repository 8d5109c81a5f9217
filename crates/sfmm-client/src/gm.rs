//! Game-master calls: start a level, restart/resume/stop an instance.

use std::collections::HashMap;

use reqwest::Method;
use serde::Deserialize;
use tracing::info;

use crate::client::StockfighterClient;
use crate::error::{ClientError, ClientResult};

/// Level instance returned by the game master.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub balances: HashMap<String, i64>,
    pub instance_id: u64,
    #[serde(default)]
    pub instructions: HashMap<String, String>,
    #[serde(default)]
    pub seconds_per_trading_day: u64,
    #[serde(default)]
    pub tickers: Vec<String>,
    #[serde(default)]
    pub venues: Vec<String>,
}

impl InstanceInfo {
    /// First (venue, ticker) pair of the instance.
    pub fn primary_market(&self) -> ClientResult<(String, String)> {
        match (self.venues.first(), self.tickers.first()) {
            (Some(venue), Some(ticker)) => Ok((venue.clone(), ticker.clone())),
            _ => Err(ClientError::Business(format!(
                "instance {} lists no venue/ticker",
                self.instance_id
            ))),
        }
    }
}

impl StockfighterClient {
    async fn gm_post<T: serde::de::DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = format!("{}{}", self.gm_url, path);
        self.request_url::<T, ()>(Method::POST, url, None).await
    }

    /// Start a fresh instance of `level`.
    pub async fn start_level(&self, level: &str) -> ClientResult<InstanceInfo> {
        let info: InstanceInfo = self.gm_post(&format!("/levels/{level}")).await?;
        info!(level, instance_id = info.instance_id, account = %info.account, "Level started");
        Ok(info)
    }

    /// Restart an instance, resetting its market and account.
    pub async fn restart_instance(&self, instance_id: u64) -> ClientResult<InstanceInfo> {
        let info: InstanceInfo = self
            .gm_post(&format!("/instances/{instance_id}/restart"))
            .await?;
        info!(
            instance_id,
            account = %info.account,
            venues = ?info.venues,
            tickers = ?info.tickers,
            "Instance restarted"
        );
        Ok(info)
    }

    /// Resume a stopped instance.
    pub async fn resume_instance(&self, instance_id: u64) -> ClientResult<InstanceInfo> {
        let info: InstanceInfo = self
            .gm_post(&format!("/instances/{instance_id}/resume"))
            .await?;
        info!(instance_id, "Instance resumed");
        Ok(info)
    }

    /// Stop an instance.
    pub async fn stop_instance(&self, instance_id: u64) -> ClientResult<()> {
        self.gm_post::<serde_json::Value>(&format!("/instances/{instance_id}/stop"))
            .await?;
        info!(instance_id, "Instance stopped");
        Ok(())
    }
}
