//! Port contracts for readiness detection.

mod probe;

#[cfg(test)]
pub(crate) use probe::MockHealthProbe;
pub use probe::{HealthCheckError, HealthProbe, HealthProbeResult};
