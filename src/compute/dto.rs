//! Request and response bodies of the sibling endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct IndexRequest<'a> {
    pub base_path: &'a str,
}

/// Summary returned after indexing a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Number of indexed files.
    pub count: u64,
    /// Extensions found in the folder.
    pub extensions: Vec<String>,
    /// Extensions whose content can be read for answering.
    pub ai_readable_exts: Vec<String>,
    /// Folder that was indexed.
    pub base_path: String,
    /// Cache directory used by the service.
    pub cache_dir: String,
    /// Path of the generated file listing.
    pub csv_path: String,
    /// Filesystem-safe name of the folder.
    pub safe_path: String,
}

/// Body of `POST /search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    base_path: String,
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_exts: Option<Vec<String>>,
}

impl SearchRequest {
    /// Creates a search over `base_path`.
    #[must_use]
    pub fn new(base_path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            query: query.into(),
            allowed_exts: None,
        }
    }

    /// Restricts results to the given extensions.
    #[must_use]
    pub fn with_allowed_exts<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_exts = Some(extensions.into_iter().map(Into::into).collect());
        self
    }
}

/// Body of `POST /refine`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefineRequest {
    /// Indexed folder.
    pub base_path: String,
    /// Keywords narrowing the current result set.
    pub keywords: Vec<String>,
    /// Paths of the current result set.
    pub current_items: Vec<String>,
}

/// One file of a search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Absolute path.
    pub path: String,
    /// File name.
    pub name: String,
    /// Extension without the dot.
    #[serde(default)]
    pub extension: Option<String>,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// Creation time as reported by the service.
    #[serde(default)]
    pub created_time: Option<String>,
    /// Modification time as reported by the service.
    #[serde(default)]
    pub modified_time: Option<String>,
}

/// Result of a search or refinement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Keywords extracted from the query.
    pub keywords: Vec<String>,
    /// Keywords after synonym expansion.
    pub expanded_keywords: Vec<String>,
    /// Extensions inferred from the query.
    pub extensions: Vec<String>,
    /// Years inferred from the query.
    pub years: Vec<i32>,
    /// Matching files.
    pub items: Vec<FileInfo>,
}

/// Body of `POST /proceed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ProceedRequest<'a> {
    pub base_path: &'a str,
    pub paths: &'a [String],
}

/// Reply of `POST /proceed`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ProceedReply {
    pub loaded: Vec<String>,
}

/// Body of `POST /ollama/select` and `POST /ollama/pull`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ModelRequest<'a> {
    pub base_path: &'a str,
    pub model: &'a str,
}

/// Installed local models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelList {
    /// Model names.
    pub models: Vec<String>,
    /// Why listing failed, when it did.
    #[serde(default)]
    pub error: Option<String>,
}

/// Reply of `POST /ollama/select`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
    /// Whether the model was selected.
    pub ok: bool,
    /// Selected model.
    pub model: String,
}

/// Reply of `POST /ollama/pull`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullResult {
    /// Whether the download succeeded.
    pub ok: bool,
    /// Why it failed, when it did.
    #[serde(default)]
    pub error: Option<String>,
}
