//! Lifecycle status of the supervised compute service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Observable lifecycle of the compute service process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "code")]
pub enum BackendStatus {
    /// The launch specification is resolved and the process is being spawned.
    Starting,
    /// The process was spawned and has not exited.
    Running,
    /// The process exited; the code is absent when a signal ended it.
    Exited(Option<i32>),
}

impl BackendStatus {
    /// Returns the canonical state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Exited(_) => "exited",
        }
    }

    /// Returns whether the process is gone.
    #[must_use]
    pub const fn has_exited(self) -> bool {
        matches!(self, Self::Exited(_))
    }
}

impl fmt::Display for BackendStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(Some(code)) => write!(formatter, "exited({code})"),
            Self::Exited(None) => formatter.write_str("exited(signal)"),
            other => formatter.write_str(other.as_str()),
        }
    }
}
