//! Compute service process supervision.
//!
//! The supervisor resolves the executable for the current platform and run
//! mode, spawns the compute service with captured output, and guarantees a
//! single termination signal on shutdown. The module follows the crate's
//! hexagonal layout:
//!
//! - Launch resolution and lifecycle types in [`domain`]
//! - The tokio-backed supervisor in [`services`]

pub mod domain;
pub mod services;
