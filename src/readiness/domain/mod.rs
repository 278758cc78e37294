//! Domain model for readiness detection.
//!
//! Readiness is a one-way transition: once the shared state reports ready it
//! stays ready for the rest of the run.

mod event;
mod health;
mod state;

pub use event::{READINESS_CHANNEL, ReadinessEvent, ReadinessReply};
pub use health::{HealthCheckResult, HealthReport};
pub use state::{ReadinessHandle, ReadinessState};
