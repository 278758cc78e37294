//! Shared readiness state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

/// Snapshot of the process-wide readiness state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReadinessState {
    ready: bool,
    ready_at: Option<DateTime<Utc>>,
    details: Option<Value>,
}

impl ReadinessState {
    /// Returns whether the compute service became ready.
    #[must_use]
    pub const fn ready(&self) -> bool {
        self.ready
    }

    /// Returns when readiness was first observed.
    #[must_use]
    pub const fn ready_at(&self) -> Option<DateTime<Utc>> {
        self.ready_at
    }

    /// Returns the liveness details recorded at the transition.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }
}

/// Cloneable handle onto the readiness state.
///
/// Only the readiness monitor mutates it; every other holder reads.
#[derive(Debug, Clone, Default)]
pub struct ReadinessHandle {
    state: Arc<RwLock<ReadinessState>>,
}

impl ReadinessHandle {
    /// Creates a handle initialised to not ready.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the compute service is ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.snapshot().ready()
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ReadinessState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records the transition to ready.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub(crate) fn mark_ready(&self, details: Value, at: DateTime<Utc>) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.ready {
            return false;
        }
        *state = ReadinessState {
            ready: true,
            ready_at: Some(at),
            details: Some(details),
        };
        true
    }

    /// Returns the state to not ready at the start of a monitoring run.
    pub(crate) fn reset(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = ReadinessState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handle_starts_not_ready() {
        let handle = ReadinessHandle::new();

        assert!(!handle.is_ready());
        assert_eq!(handle.snapshot().details(), None);
    }

    #[test]
    fn only_the_first_mark_transitions() {
        let handle = ReadinessHandle::new();
        let first = Utc::now();

        assert!(handle.mark_ready(json!({"ok": true}), first));
        assert!(!handle.mark_ready(json!({"ok": true, "later": 1}), Utc::now()));

        let snapshot = handle.snapshot();
        assert!(snapshot.ready());
        assert_eq!(snapshot.ready_at(), Some(first));
        assert_eq!(snapshot.details(), Some(&json!({"ok": true})));
    }

    #[test]
    fn clones_share_state() {
        let handle = ReadinessHandle::new();
        let reader = handle.clone();

        handle.mark_ready(json!({}), Utc::now());

        assert!(reader.is_ready());
    }
}
