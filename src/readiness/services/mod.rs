//! Readiness orchestration services.

mod monitor;
mod relay;

pub use monitor::ReadinessMonitor;
pub use relay::NotificationRelay;
