//! Error types for launch resolution and process spawning.

use std::sync::Arc;
use thiserror::Error;

/// Errors returned while building a launch specification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SupervisorDomainError {
    /// The resolved command is empty.
    #[error("compute service command must not be empty")]
    EmptyCommand,

    /// The strategy table has no entry for the platform and mode.
    #[error("no launch strategy for {mode} mode on this platform")]
    NoLaunchStrategy {
        /// Requested run mode.
        mode: String,
    },

    /// Packaged mode needs a resources directory to locate the executable.
    #[error("packaged run mode requires a resources directory")]
    MissingResourcesDir,
}

/// Error returned while parsing a run mode.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown run mode: {0}")]
pub struct ParseRunModeError(pub String);

/// The compute service executable could not be spawned.
///
/// Fatal to readiness, never to the host: callers log it and keep running
/// with readiness permanently `false`.
#[derive(Debug, Clone, Error)]
#[error("failed to launch compute service '{command}': {source}")]
pub struct LaunchFailure {
    command: String,
    #[source]
    source: Arc<std::io::Error>,
}

impl LaunchFailure {
    /// Creates a launch failure for `command`.
    #[must_use]
    pub fn new(command: impl Into<String>, source: std::io::Error) -> Self {
        Self {
            command: command.into(),
            source: Arc::new(source),
        }
    }

    /// Returns the command that was attempted.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the I/O error kind reported by the operating system.
    #[must_use]
    pub fn kind(&self) -> std::io::ErrorKind {
        self.source.kind()
    }
}
