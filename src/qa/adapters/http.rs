//! `reqwest` transport for the question endpoints.

use crate::qa::{
    domain::{QaAnswer, QaQuery},
    ports::{QaTransport, QaTransportError, QaTransportResult, StreamOpening},
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;

const EVENT_STREAM: &str = "text/event-stream";

/// Question transport speaking HTTP to the local compute service.
#[derive(Debug, Clone)]
pub struct HttpQaTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQaTransport {
    /// Creates a transport for the service at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl QaTransport for HttpQaTransport {
    async fn open_stream(&self, query: &QaQuery) -> QaTransportResult<StreamOpening> {
        let response = self
            .client
            .get(self.endpoint("/qa/stream"))
            .query(&[
                ("base_path", query.base_path().as_str()),
                ("q", query.question()),
            ])
            .send()
            .await
            .map_err(QaTransportError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(QaTransportError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        if !content_type
            .as_deref()
            .is_some_and(|declared| declared.contains(EVENT_STREAM))
        {
            return Ok(StreamOpening::NotEventStream { content_type });
        }

        let body = response
            .bytes_stream()
            .map(|read| read.map_err(QaTransportError::transport))
            .boxed();
        Ok(StreamOpening::EventStream(body))
    }

    async fn ask(&self, query: &QaQuery) -> QaTransportResult<QaAnswer> {
        let response = self
            .client
            .post(self.endpoint("/qa"))
            .json(query)
            .send()
            .await
            .map_err(QaTransportError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(QaTransportError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(QaTransportError::transport)?;
        serde_json::from_slice(&body).map_err(|err| QaTransportError::MalformedBody(err.to_string()))
    }
}
