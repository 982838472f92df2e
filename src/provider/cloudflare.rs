use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::config::UpstreamConfig;
use super::{RecordUpdate, UpstreamResult};

pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

#[derive(Debug, Clone)]
pub struct CloudflareClient {
    client: Client,
    api_base: String,
}

impl CloudflareClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.api_base, zone_id, record_id)
    }

    /// PATCH a single record. Non-2xx answers are not errors here; they come
    /// back in the result so the caller can relay them.
    pub async fn update_record(&self, update: &RecordUpdate) -> Result<UpstreamResult> {
        let url = self.record_url(&update.zone_id, &update.record_id);
        debug!("PATCH {} ({} {})", url, update.record.record_type, update.record.name);

        let response = self
            .client
            .patch(&url)
            .header("Authorization", format!("Bearer {}", update.api_token))
            .header("Content-Type", "application/json")
            .json(&update.record)
            .send()
            .await
            .context("Failed to send update request to Cloudflare")?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .context("Failed to parse Cloudflare update response")?;

        Ok(UpstreamResult {
            status,
            success: status.is_success(),
            body,
        })
    }
}
