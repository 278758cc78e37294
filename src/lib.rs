//! Odin: control layer for a slow-starting local compute service.
//!
//! This crate launches the compute service as a child process, detects when
//! it becomes ready, republishes readiness to UI observers, and consumes its
//! streamed answers with a watchdog and a non-streaming fallback.
//!
//! # Architecture
//!
//! Odin follows hexagonal architecture principles:
//!
//! - **Domain**: Pure types and state machines with no infrastructure
//!   dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (HTTP, in-memory)
//!
//! # Modules
//!
//! - [`supervisor`]: Child-process launch and termination
//! - [`readiness`]: Liveness polling and readiness relay
//! - [`qa`]: Streamed question answering with fallback
//! - [`compute`]: Typed client for the indexing, search and model endpoints
//! - [`runtime`]: Composition root for a host session
//! - [`config`]: Environment-driven configuration
//! - [`telemetry`]: Logging bootstrap

pub mod compute;
pub mod config;
pub mod qa;
pub mod readiness;
pub mod runtime;
pub mod supervisor;
pub mod telemetry;
