//! Error types for the compute service client.

use std::sync::Arc;
use thiserror::Error;

/// Result type for compute service calls.
pub type ComputeClientResult<T> = Result<T, ComputeClientError>;

/// Failures of a compute service call.
#[derive(Debug, Clone, Error)]
pub enum ComputeClientError {
    /// The request could not be sent or the connection broke.
    #[error("request to compute service failed: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),

    /// The endpoint answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        /// Endpoint path.
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
    },

    /// The response body did not match the expected shape.
    #[error("malformed response from {endpoint}: {reason}")]
    MalformedBody {
        /// Endpoint path.
        endpoint: &'static str,
        /// Decoder message.
        reason: String,
    },
}

impl ComputeClientError {
    /// Wraps a transport-layer failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
