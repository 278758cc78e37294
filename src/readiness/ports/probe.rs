//! Liveness probe port.

use crate::readiness::domain::HealthReport;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for liveness probe operations.
pub type HealthProbeResult<T> = Result<T, HealthCheckError>;

/// Issues one liveness request against the compute service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Performs a single liveness check.
    async fn check(&self) -> HealthProbeResult<HealthReport>;
}

/// Transient liveness failures; the monitor treats all of them as not ready.
#[derive(Debug, Clone, Error)]
pub enum HealthCheckError {
    /// The request could not be sent or the connection failed.
    #[error("liveness request failed: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),

    /// The service answered with a non-success status.
    #[error("liveness endpoint returned HTTP {0}")]
    Status(u16),

    /// The response body was not valid JSON.
    #[error("malformed liveness response: {0}")]
    MalformedBody(String),
}

impl HealthCheckError {
    /// Wraps a transport-layer failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
