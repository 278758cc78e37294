//! Liveness check values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parsed body of a liveness response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    ok: bool,
    details: Value,
}

impl HealthReport {
    /// Builds a report from a decoded response body.
    ///
    /// A body without a boolean `ok` field counts as not ready.
    #[must_use]
    pub fn from_body(details: Value) -> Self {
        let ok = details
            .get("ok")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self { ok, details }
    }

    /// Returns whether the service reported ready.
    #[must_use]
    pub const fn ok(&self) -> bool {
        self.ok
    }

    /// Returns the raw response body.
    #[must_use]
    pub const fn details(&self) -> &Value {
        &self.details
    }

    /// Consumes the report and returns the raw body.
    #[must_use]
    pub fn into_details(self) -> Value {
        self.details
    }
}

/// Outcome of a single liveness check.
///
/// Transient: only the monitor's current tick looks at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    ok: bool,
    details: Value,
    checked_at: DateTime<Utc>,
    message: Option<String>,
}

impl HealthCheckResult {
    /// Creates a result from a successfully decoded report.
    #[must_use]
    pub fn from_report(report: HealthReport, checked_at: DateTime<Utc>) -> Self {
        Self {
            ok: report.ok(),
            details: report.into_details(),
            checked_at,
            message: None,
        }
    }

    /// Creates a not-ready result explaining why the check failed.
    #[must_use]
    pub fn unreachable(checked_at: DateTime<Utc>, message: impl Into<String>) -> Self {
        let normalized = message.into().trim().to_owned();
        Self {
            ok: false,
            details: Value::Null,
            checked_at,
            message: (!normalized.is_empty()).then_some(normalized),
        }
    }

    /// Returns whether the service reported ready.
    #[must_use]
    pub const fn ok(&self) -> bool {
        self.ok
    }

    /// Returns the opaque response details.
    #[must_use]
    pub const fn details(&self) -> &Value {
        &self.details
    }

    /// Returns when the check completed.
    #[must_use]
    pub const fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    /// Returns the failure explanation, if the check failed.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
