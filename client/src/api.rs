//! HTTP side-channel: the toggle actions under `/api/vehicle/{id}/...`.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::debug;

use tracker_common::config::Config;
use tracker_common::protocol::{AudioToggleResponse, ShutdownResponse, VehicleId};

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .context("Cannot build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    /// Flip the remote power cut of `vehicle`.
    pub async fn toggle_shutdown(&self, vehicle: &VehicleId) -> Result<ShutdownResponse> {
        self.post(&format!("/api/vehicle/{vehicle}/shutdown")).await
    }

    /// Flip audio transmission of `vehicle`.
    pub async fn toggle_audio(&self, vehicle: &VehicleId) -> Result<AudioToggleResponse> {
        self.post(&format!("/api/vehicle/{vehicle}/audio")).await
    }

    /// POST with an empty JSON body. Error statuses that still carry a JSON
    /// `{status, message}` body are returned as parsed replies.
    async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .with_context(|| format!("POST {path}"))?;

        let status = resp.status();
        let body = resp.text().await.with_context(|| format!("Read {path} reply"))?;
        debug!("POST {path} → {status}");

        match serde_json::from_str(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => anyhow::bail!("POST {url} returned {status}"),
            Err(e) => Err(e).with_context(|| format!("Parse {path} reply")),
        }
    }
}
