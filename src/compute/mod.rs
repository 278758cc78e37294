//! Typed client for the compute service's indexing, search and model
//! endpoints.
//!
//! These calls carry no streaming or timing protocol of their own except the
//! model pull progress, which reuses the question stream's frame decoder.

mod client;
mod dto;
mod error;
mod pull;

pub use client::ComputeClient;
pub use dto::{
    FileInfo, IndexSummary, ModelList, ModelSelection, PullResult, RefineRequest, SearchRequest,
    SearchResults,
};
pub use error::{ComputeClientError, ComputeClientResult};
pub use pull::{PullEvent, PullStream};
