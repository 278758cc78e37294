//! Run mode and platform keys for launch resolution.

use super::ParseRunModeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the application was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Running from a source checkout with a local virtual environment.
    Development,
    /// Running from an installed bundle with a frozen backend executable.
    Packaged,
}

impl RunMode {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Packaged => "packaged",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RunMode {
    type Error = ParseRunModeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "development" | "dev" => Ok(Self::Development),
            "packaged" | "production" => Ok(Self::Packaged),
            _ => Err(ParseRunModeError(value.to_owned())),
        }
    }
}

/// Operating-system family that decides executable naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Windows hosts.
    Windows,
    /// Linux, macOS and other unix-like hosts.
    Unix,
}

impl Platform {
    /// Returns the platform the binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }
}
