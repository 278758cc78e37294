//! HTTP client for the compute service's sibling endpoints.

use super::{
    ComputeClientError, ComputeClientResult, IndexSummary, ModelList, ModelSelection, PullResult,
    PullStream, RefineRequest, SearchRequest, SearchResults,
    dto::{IndexRequest, ModelRequest, ProceedReply, ProceedRequest},
    pull::pull_events,
};
use serde::{Serialize, de::DeserializeOwned};

/// Client for indexing, search and model management.
///
/// # Examples
///
/// ```no_run
/// use odin::compute::{ComputeClient, SearchRequest};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ComputeClient::new(reqwest::Client::new(), "http://127.0.0.1:8765");
/// let results = client
///     .search(&SearchRequest::new("/docs", "2023 budget").with_allowed_exts(["xlsx"]))
///     .await?;
/// let paths: Vec<&str> = results.items.iter().map(|item| item.path.as_str()).collect();
/// # drop(paths);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ComputeClient {
    client: reqwest::Client,
    base_url: String,
}

impl ComputeClient {
    /// Creates a client for the service at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Indexes the folder at `base_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeClientError`] when the request or decoding fails.
    pub async fn index(&self, base_path: &str) -> ComputeClientResult<IndexSummary> {
        self.post_json("/index", &IndexRequest { base_path }).await
    }

    /// Searches the indexed folder.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeClientError`] when the request or decoding fails.
    pub async fn search(&self, request: &SearchRequest) -> ComputeClientResult<SearchResults> {
        self.post_json("/search", request).await
    }

    /// Narrows a previous result set.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeClientError`] when the request or decoding fails.
    pub async fn refine(&self, request: &RefineRequest) -> ComputeClientResult<SearchResults> {
        self.post_json("/refine", request).await
    }

    /// Loads file contents for later questions; returns the loaded paths.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeClientError`] when the request or decoding fails.
    pub async fn proceed(&self, base_path: &str, paths: &[String]) -> ComputeClientResult<Vec<String>> {
        let reply: ProceedReply = self
            .post_json("/proceed", &ProceedRequest { base_path, paths })
            .await?;
        Ok(reply.loaded)
    }

    /// Lists installed models.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeClientError`] when the request or decoding fails.
    pub async fn models(&self) -> ComputeClientResult<ModelList> {
        self.get_json("/ollama/models").await
    }

    /// Selects the model used for `base_path`.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeClientError`] when the request or decoding fails.
    pub async fn select_model(&self, base_path: &str, model: &str) -> ComputeClientResult<ModelSelection> {
        self.post_json("/ollama/select", &ModelRequest { base_path, model })
            .await
    }

    /// Downloads a model and waits for completion.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeClientError`] when the request or decoding fails.
    pub async fn pull_model(&self, base_path: &str, model: &str) -> ComputeClientResult<PullResult> {
        self.post_json("/ollama/pull", &ModelRequest { base_path, model })
            .await
    }

    /// Downloads a model, streaming its progress.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeClientError`] when the request cannot be sent or the
    /// endpoint answers with a non-success status.
    pub async fn pull_model_stream(&self, model: &str) -> ComputeClientResult<PullStream> {
        const ENDPOINT: &str = "/ollama/pull/stream";
        let response = self
            .client
            .get(self.endpoint(ENDPOINT))
            .query(&[("model", model)])
            .send()
            .await
            .map_err(ComputeClientError::transport)?;
        let checked = ensure_success(ENDPOINT, response)?;
        Ok(pull_events(checked.bytes_stream()))
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &'static str) -> ComputeClientResult<T> {
        let response = self
            .client
            .get(self.endpoint(endpoint))
            .send()
            .await
            .map_err(ComputeClientError::transport)?;
        decode(endpoint, response).await
    }

    async fn post_json<B, T>(&self, endpoint: &'static str, body: &B) -> ComputeClientResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(endpoint, "calling compute service");
        let response = self
            .client
            .post(self.endpoint(endpoint))
            .json(body)
            .send()
            .await
            .map_err(ComputeClientError::transport)?;
        decode(endpoint, response).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn ensure_success(
    endpoint: &'static str,
    response: reqwest::Response,
) -> ComputeClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(ComputeClientError::Status {
        endpoint,
        status: status.as_u16(),
    })
}

async fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    response: reqwest::Response,
) -> ComputeClientResult<T> {
    let body = ensure_success(endpoint, response)?
        .bytes()
        .await
        .map_err(ComputeClientError::transport)?;
    serde_json::from_slice(&body).map_err(|err| ComputeClientError::MalformedBody {
        endpoint,
        reason: err.to_string(),
    })
}
