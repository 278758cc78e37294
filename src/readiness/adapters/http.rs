//! HTTP liveness probe against `GET /health`.

use crate::readiness::{
    domain::HealthReport,
    ports::{HealthCheckError, HealthProbe, HealthProbeResult},
};
use async_trait::async_trait;
use serde_json::Value;

/// Liveness probe backed by `reqwest`.
///
/// No request timeout is configured beyond the client's defaults; a stalled
/// request simply delays the next tick.
#[derive(Debug, Clone)]
pub struct HttpHealthProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpHealthProbe {
    /// Creates a probe for the service at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/health", base_url.trim_end_matches('/')),
        }
    }

    /// Returns the probed URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self) -> HealthProbeResult<HealthReport> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(HealthCheckError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HealthCheckError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(HealthCheckError::transport)?;
        let details: Value = serde_json::from_slice(&body)
            .map_err(|err| HealthCheckError::MalformedBody(err.to_string()))?;
        Ok(HealthReport::from_body(details))
    }
}
