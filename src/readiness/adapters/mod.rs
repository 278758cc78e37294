//! Adapter implementations for the liveness probe port.

pub mod memory;

mod http;

pub use http::HttpHealthProbe;
