//! Domain model for compute service launch resolution and lifecycle.
//!
//! Resolution is pure: a strategy table keyed by platform and run mode maps
//! launch roots onto a [`LaunchSpec`]. Spawning lives in the service layer.

mod error;
mod launch;
mod mode;
mod status;

pub use error::{LaunchFailure, ParseRunModeError, SupervisorDomainError};
pub use launch::{LaunchRoots, LaunchSpec, backend_environment, resolve_launch};
pub use mode::{Platform, RunMode};
pub use status::BackendStatus;
