//! Prometheus HTTP API query source
//!
//! Issues instant queries of the form `<metric>[<N>s]` against
//! `/api/v1/query` and decodes the typed result. There is no retry: a failed
//! request is returned to the caller as-is.

mod error;
mod response;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use promdump_core::{QuerySource, QueryValue};
use std::time::Duration;
use tracing::{debug, warn};

pub use error::{ClientError, Result};

const QUERY_PATH: &str = "/api/v1/query";

/// Build the range selector evaluated for one window.
pub fn range_selector(metric: &str, lookback_secs: f64) -> String {
    format!("{}[{}s]", metric, lookback_secs as i64)
}

/// Client for a single Prometheus server
#[derive(Clone)]
pub struct PrometheusClient {
    client: reqwest::Client,
    endpoint: String,
}

impl PrometheusClient {
    /// Create a client for `base_url` (e.g. `http://localhost:9090`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClientError::InvalidUrl {
                url: base_url.to_string(),
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base, QUERY_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Evaluate `query` at `time`.
    pub async fn instant_query(&self, query: &str, time: DateTime<Utc>) -> Result<QueryValue> {
        let time = time.to_rfc3339_opts(SecondsFormat::Millis, true);
        debug!(query, time = %time, endpoint = %self.endpoint, "Sending instant query");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("time", time.as_str())])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        let decoded = response::decode(status, &body)?;

        for warning in &decoded.warnings {
            warn!(query, warning = %warning, "Prometheus returned a warning");
        }

        Ok(decoded.value)
    }
}

#[async_trait]
impl QuerySource for PrometheusClient {
    async fn query(
        &self,
        expression: &str,
        instant: DateTime<Utc>,
        lookback_secs: f64,
    ) -> anyhow::Result<QueryValue> {
        let selector = range_selector(expression, lookback_secs);
        Ok(self.instant_query(&selector, instant).await?)
    }
}
