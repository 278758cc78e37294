//! Request paths to the compute service's question-answering endpoints.

use crate::qa::domain::{QaAnswer, QaQuery};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::sync::Arc;
use thiserror::Error;

/// Result type for question-answering transport operations.
pub type QaTransportResult<T> = Result<T, QaTransportError>;

/// Raw body reads of an event stream.
pub type ByteStream = BoxStream<'static, QaTransportResult<Bytes>>;

/// Outcome of opening the streaming endpoint.
pub enum StreamOpening {
    /// The service answered with an event stream.
    EventStream(ByteStream),
    /// The service answered, but not with an event stream.
    NotEventStream {
        /// Declared content type, if any.
        content_type: Option<String>,
    },
}

impl std::fmt::Debug for StreamOpening {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EventStream(_) => f.write_str("EventStream(..)"),
            Self::NotEventStream { content_type } => f
                .debug_struct("NotEventStream")
                .field("content_type", content_type)
                .finish(),
        }
    }
}

/// Reaches the streaming and non-streaming question endpoints.
#[async_trait]
pub trait QaTransport: Send + Sync {
    /// Opens `GET /qa/stream` for `query`.
    async fn open_stream(&self, query: &QaQuery) -> QaTransportResult<StreamOpening>;

    /// Issues `POST /qa` for `query` and returns the decoded body.
    async fn ask(&self, query: &QaQuery) -> QaTransportResult<QaAnswer>;
}

/// Failures of either request path.
#[derive(Debug, Clone, Error)]
pub enum QaTransportError {
    /// The request could not be sent or the connection broke.
    #[error("question request failed: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),

    /// The service answered with a non-success status.
    #[error("question endpoint returned HTTP {0}")]
    Status(u16),

    /// The body was not the expected JSON.
    #[error("malformed answer body: {0}")]
    MalformedBody(String),
}

impl QaTransportError {
    /// Wraps a transport-layer failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
