//! Client side of `stop` and `resolve`: plain HTTP against the local gateway

use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const STOPPING_MESSAGE: &str = "Ens Resolver Stopping...";
pub const NOT_FOUND_MESSAGE: &str = "Not found";

pub struct ControlClient {
    http: reqwest::Client,
    base_url: String,
}

impl ControlClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Ask the daemon to stop
    pub async fn stop(&self) -> Result<()> {
        let url = format!("{}/resolver/stop", self.base_url);
        self.http
            .post(&url)
            .send()
            .await
            .with_context(|| format!("no resolver answering at {}", self.base_url))?;
        Ok(())
    }

    /// Resolve `name`, returning the text to print
    ///
    /// Any non-200 answer becomes [`NOT_FOUND_MESSAGE`].
    pub async fn resolve(&self, name: &str, dns: bool, lookup: bool) -> Result<String> {
        let url = if dns {
            format!("{}/resolver/dns/{}?lookup={}", self.base_url, name, lookup)
        } else {
            format!("{}/resolver/address/{}", self.base_url, name)
        };

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("no resolver answering at {}", self.base_url))?;

        if response.status() != StatusCode::OK {
            return Ok(NOT_FOUND_MESSAGE.to_string());
        }
        response.text().await.context("failed to read resolver response")
    }
}
