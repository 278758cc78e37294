//! Readiness detection for the compute service.
//!
//! The [`services::ReadinessMonitor`] polls a liveness endpoint until the
//! service reports ready once, then stops. The
//! [`services::NotificationRelay`] republishes that single transition to UI
//! subscribers and answers pull queries from the shared state. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
