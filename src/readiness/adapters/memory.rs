//! Scripted in-memory liveness probe.

use crate::readiness::{
    domain::HealthReport,
    ports::{HealthCheckError, HealthProbe, HealthProbeResult},
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

/// Liveness probe that replays a scripted sequence of responses.
///
/// Once the script is exhausted the last response repeats; an empty script
/// answers `{ok: false}`. Every call is counted so tests can assert that
/// polling stopped.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHealthProbe {
    state: Arc<RwLock<ScriptState>>,
}

#[derive(Debug, Default)]
struct ScriptState {
    script: VecDeque<HealthProbeResult<HealthReport>>,
    last: Option<HealthProbeResult<HealthReport>>,
    calls: usize,
}

impl ScriptedHealthProbe {
    /// Creates a probe with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response with the given `ok` flag.
    pub fn push_ok(&self, ok: bool) {
        self.push(Ok(HealthReport::from_body(json!({ "ok": ok }))));
    }

    /// Queues a connection failure.
    pub fn push_unreachable(&self) {
        self.push(Err(HealthCheckError::transport(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ))));
    }

    /// Queues an arbitrary response.
    pub fn push(&self, response: HealthProbeResult<HealthReport>) {
        self.lock_write().script.push_back(response);
    }

    /// Returns how many checks were performed.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, ScriptState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl HealthProbe for ScriptedHealthProbe {
    async fn check(&self) -> HealthProbeResult<HealthReport> {
        let mut state = self.lock_write();
        state.calls += 1;
        if let Some(next) = state.script.pop_front() {
            state.last = Some(next.clone());
            return next;
        }
        state
            .last
            .clone()
            .unwrap_or_else(|| Ok(HealthReport::from_body(json!({ "ok": false }))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_then_repeats_last() {
        let probe = ScriptedHealthProbe::new();
        probe.push_unreachable();
        probe.push_ok(true);

        assert!(probe.check().await.is_err());
        assert!(probe.check().await.is_ok_and(|report| report.ok()));
        assert!(probe.check().await.is_ok_and(|report| report.ok()));
        assert_eq!(probe.calls(), 3);
    }

    #[tokio::test]
    async fn empty_script_is_not_ready() {
        let probe = ScriptedHealthProbe::new();

        let report = probe.check().await.expect("default response is a report");

        assert!(!report.ok());
    }
}
