//! Environment-driven configuration for the Odin control layer.
//!
//! Values are read through a lookup closure so tests can supply a fixed map
//! instead of mutating the process environment.

use crate::supervisor::domain::RunMode;
use camino::Utf8PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Port used when `BACKEND_PORT` is not set.
pub const DEFAULT_BACKEND_PORT: u16 = 8765;

/// Locale applied to the compute service when none is configured.
pub const DEFAULT_BACKEND_LOCALE: &str = "ko_KR.UTF-8";

/// Interval between liveness checks.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_millis(1000);

/// Deadline for a single streamed answer.
pub const DEFAULT_STREAM_WATCHDOG: Duration = Duration::from_secs(15);

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `BACKEND_PORT` is not a valid TCP port.
    #[error("invalid BACKEND_PORT value '{0}'")]
    InvalidPort(String),

    /// `ODIN_RUN_MODE` names an unknown mode.
    #[error("invalid ODIN_RUN_MODE value '{0}' (expected 'development' or 'packaged')")]
    InvalidRunMode(String),

    /// A millisecond duration variable is not a positive integer.
    #[error("invalid duration for {name}: '{value}'")]
    InvalidDuration {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
    },

    /// Packaged mode was requested without a resources directory.
    #[error("packaged run mode requires ODIN_RESOURCES_DIR")]
    MissingResourcesDir,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OdinConfig {
    port: u16,
    run_mode: RunMode,
    project_root: Utf8PathBuf,
    resources_dir: Option<Utf8PathBuf>,
    backend_locale: String,
    health_interval: Duration,
    stream_watchdog: Duration,
}

impl OdinConfig {
    /// Builds a development configuration rooted at `project_root`.
    #[must_use]
    pub fn development(project_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            port: DEFAULT_BACKEND_PORT,
            run_mode: RunMode::Development,
            project_root: project_root.into(),
            resources_dir: None,
            backend_locale: DEFAULT_BACKEND_LOCALE.to_owned(),
            health_interval: DEFAULT_HEALTH_INTERVAL,
            stream_watchdog: DEFAULT_STREAM_WATCHDOG,
        }
    }

    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir()
            .ok()
            .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
            .unwrap_or_else(|| Utf8PathBuf::from("."));
        Self::from_lookup(|key| std::env::var(key).ok(), cwd)
    }

    /// Reads configuration through `lookup`, using `cwd` as the default
    /// project root.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable holds an invalid value.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cwd: Utf8PathBuf,
    ) -> Result<Self, ConfigError> {
        let port = match non_empty(lookup("BACKEND_PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or(ConfigError::InvalidPort(raw))?,
            None => DEFAULT_BACKEND_PORT,
        };

        let resources_dir = non_empty(lookup("ODIN_RESOURCES_DIR")).map(Utf8PathBuf::from);
        let run_mode = match non_empty(lookup("ODIN_RUN_MODE")) {
            Some(raw) => RunMode::try_from(raw.as_str())
                .map_err(|_| ConfigError::InvalidRunMode(raw.clone()))?,
            None if non_empty(lookup("RENDERER_URL")).is_some() => RunMode::Development,
            None if resources_dir.is_some() => RunMode::Packaged,
            None => RunMode::Development,
        };
        if run_mode == RunMode::Packaged && resources_dir.is_none() {
            return Err(ConfigError::MissingResourcesDir);
        }

        let project_root = non_empty(lookup("ODIN_PROJECT_ROOT"))
            .map(Utf8PathBuf::from)
            .unwrap_or(cwd);
        let backend_locale = non_empty(lookup("ODIN_BACKEND_LOCALE"))
            .unwrap_or_else(|| DEFAULT_BACKEND_LOCALE.to_owned());

        Ok(Self {
            port,
            run_mode,
            project_root,
            resources_dir,
            backend_locale,
            health_interval: duration_var(
                &lookup,
                "ODIN_HEALTH_INTERVAL_MS",
                DEFAULT_HEALTH_INTERVAL,
            )?,
            stream_watchdog: duration_var(
                &lookup,
                "ODIN_STREAM_WATCHDOG_MS",
                DEFAULT_STREAM_WATCHDOG,
            )?,
        })
    }

    /// Overrides the service port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Switches to packaged mode with the given resources directory.
    #[must_use]
    pub fn with_packaged_resources(mut self, resources_dir: impl Into<Utf8PathBuf>) -> Self {
        self.run_mode = RunMode::Packaged;
        self.resources_dir = Some(resources_dir.into());
        self
    }

    /// Overrides the liveness poll interval.
    #[must_use]
    pub const fn with_health_interval(mut self, interval: Duration) -> Self {
        self.health_interval = interval;
        self
    }

    /// Overrides the streaming watchdog deadline.
    #[must_use]
    pub const fn with_stream_watchdog(mut self, deadline: Duration) -> Self {
        self.stream_watchdog = deadline;
        self
    }

    /// Returns the port the compute service binds.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the selected run mode.
    #[must_use]
    pub const fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    /// Returns the development project root.
    #[must_use]
    pub fn project_root(&self) -> &Utf8PathBuf {
        &self.project_root
    }

    /// Returns the packaged resources directory, if any.
    #[must_use]
    pub fn resources_dir(&self) -> Option<&Utf8PathBuf> {
        self.resources_dir.as_ref()
    }

    /// Returns the locale exported to the compute service.
    #[must_use]
    pub fn backend_locale(&self) -> &str {
        &self.backend_locale
    }

    /// Returns the liveness poll interval.
    #[must_use]
    pub const fn health_interval(&self) -> Duration {
        self.health_interval
    }

    /// Returns the streaming watchdog deadline.
    #[must_use]
    pub const fn stream_watchdog(&self) -> Duration {
        self.stream_watchdog
    }

    /// Returns the base URL of the compute service.
    #[must_use]
    pub fn service_base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

fn duration_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let Some(raw) = non_empty(lookup(name)) else {
        return Ok(default);
    };
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis)
        .ok_or(ConfigError::InvalidDuration { name, value: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<OdinConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        OdinConfig::from_lookup(|key| map.get(key).cloned(), Utf8PathBuf::from("/work"))
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = from_pairs(&[]).expect("empty environment is valid");

        assert_eq!(config.port(), DEFAULT_BACKEND_PORT);
        assert_eq!(config.run_mode(), RunMode::Development);
        assert_eq!(config.project_root().as_str(), "/work");
        assert_eq!(config.backend_locale(), DEFAULT_BACKEND_LOCALE);
        assert_eq!(config.health_interval(), Duration::from_millis(1000));
        assert_eq!(config.stream_watchdog(), Duration::from_secs(15));
        assert_eq!(config.service_base_url(), "http://127.0.0.1:8765");
    }

    #[test]
    fn resources_dir_selects_packaged_mode() {
        let config = from_pairs(&[("ODIN_RESOURCES_DIR", "/opt/odin/resources")])
            .expect("valid environment");

        assert_eq!(config.run_mode(), RunMode::Packaged);
    }

    #[test]
    fn renderer_url_forces_development_mode() {
        let config = from_pairs(&[
            ("ODIN_RESOURCES_DIR", "/opt/odin/resources"),
            ("RENDERER_URL", "http://localhost:5173"),
        ])
        .expect("valid environment");

        assert_eq!(config.run_mode(), RunMode::Development);
    }

    #[rstest]
    #[case("0")]
    #[case("70000")]
    #[case("port")]
    fn invalid_port_is_rejected(#[case] raw: &str) {
        let result = from_pairs(&[("BACKEND_PORT", raw)]);

        assert_eq!(result, Err(ConfigError::InvalidPort(raw.to_owned())));
    }

    #[test]
    fn packaged_mode_without_resources_is_rejected() {
        let result = from_pairs(&[("ODIN_RUN_MODE", "packaged")]);

        assert_eq!(result, Err(ConfigError::MissingResourcesDir));
    }

    #[test]
    fn durations_are_read_in_milliseconds() {
        let config = from_pairs(&[
            ("ODIN_HEALTH_INTERVAL_MS", "250"),
            ("ODIN_STREAM_WATCHDOG_MS", "500"),
        ])
        .expect("valid environment");

        assert_eq!(config.health_interval(), Duration::from_millis(250));
        assert_eq!(config.stream_watchdog(), Duration::from_millis(500));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let result = from_pairs(&[("ODIN_STREAM_WATCHDOG_MS", "0")]);

        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration {
                name: "ODIN_STREAM_WATCHDOG_MS",
                ..
            })
        ));
    }
}
