//! Messages crossing the UI boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel name the readiness push is published on.
pub const READINESS_CHANNEL: &str = "backend-health";

/// Pushed once when the compute service becomes ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessEvent {
    /// Always `true`; no event is published for other states.
    pub ready: bool,
    /// Liveness response body that triggered the transition.
    pub details: Value,
}

impl ReadinessEvent {
    /// Creates the ready event carrying `details`.
    #[must_use]
    pub const fn ready(details: Value) -> Self {
        Self {
            ready: true,
            details,
        }
    }
}

/// Reply to an on-demand readiness query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReply {
    /// Current cached readiness.
    pub ready: bool,
}
