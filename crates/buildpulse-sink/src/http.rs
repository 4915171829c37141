//! HTTP metric sink

use serde_json::json;
use tracing::{debug, info};

use async_trait::async_trait;
use buildpulse_core::{MetricToSend, PulseError, Result};

use crate::MetricSink;

/// Posts the metric series to a remote endpoint as one JSON batch
pub struct HttpSink {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build the sink from config, reading the API key from its env var
    pub fn from_env(endpoint: &str, api_key_env: &str) -> Result<Self> {
        let api_key = std::env::var(api_key_env)
            .map_err(|_| PulseError::Sink(format!("{} is not set", api_key_env)))?;
        Ok(Self::new(endpoint, api_key))
    }

    fn payload(series: &[MetricToSend]) -> serde_json::Value {
        json!({ "series": series })
    }
}

#[async_trait]
impl MetricSink for HttpSink {
    async fn send(&self, series: &[MetricToSend]) -> Result<()> {
        if series.is_empty() {
            debug!("no metrics to send, skipping request");
            return Ok(());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .json(&Self::payload(series))
            .send()
            .await?;

        response.error_for_status()?;
        info!("sent {} metrics to {}", series.len(), self.endpoint);
        Ok(())
    }
}
