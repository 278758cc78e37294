//! Launch specification and the platform/mode strategy table.

use super::{Platform, RunMode, SupervisorDomainError};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolved command line, working directory and environment for a spawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    command: Utf8PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    working_directory: Option<Utf8PathBuf>,
}

impl LaunchSpec {
    /// Creates a launch specification for `command`.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorDomainError::EmptyCommand`] when `command` is
    /// empty after trimming.
    pub fn new(command: impl Into<Utf8PathBuf>) -> Result<Self, SupervisorDomainError> {
        let command = command.into();
        if command.as_str().trim().is_empty() {
            return Err(SupervisorDomainError::EmptyCommand);
        }

        Ok(Self {
            command,
            args: Vec::new(),
            env: BTreeMap::new(),
            working_directory: None,
        })
    }

    /// Replaces command-line arguments.
    #[must_use]
    pub fn with_args(mut self, values: impl IntoIterator<Item = String>) -> Self {
        self.args = values.into_iter().collect();
        self
    }

    /// Adds environment overrides on top of the inherited environment.
    #[must_use]
    pub fn with_env(mut self, values: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(values);
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_working_directory(mut self, value: impl Into<Utf8PathBuf>) -> Self {
        self.working_directory = Some(value.into());
        self
    }

    /// Returns the executable path.
    #[must_use]
    pub fn command(&self) -> &Utf8Path {
        &self.command
    }

    /// Returns command-line arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns environment overrides.
    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Returns the working directory, if set.
    #[must_use]
    pub fn working_directory(&self) -> Option<&Utf8Path> {
        self.working_directory.as_deref()
    }

    /// Renders the command line for diagnostics.
    #[must_use]
    pub fn display_command(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Directories the strategy table resolves against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRoots {
    /// Source checkout root used in development mode.
    pub project_root: Utf8PathBuf,
    /// Bundle resources directory used in packaged mode.
    pub resources_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Copy)]
enum BaseDir {
    ProjectRoot,
    PackagedDist,
}

#[derive(Debug)]
struct LaunchStrategy {
    platform: Platform,
    mode: RunMode,
    base: BaseDir,
    executable: &'static [&'static str],
    script: Option<&'static [&'static str]>,
}

const PACKAGED_DIST_DIR: &str = "python-dist";

const LAUNCH_STRATEGIES: &[LaunchStrategy] = &[
    LaunchStrategy {
        platform: Platform::Unix,
        mode: RunMode::Development,
        base: BaseDir::ProjectRoot,
        executable: &[".venv_odin", "bin", "python"],
        script: Some(&["backend", "server.py"]),
    },
    LaunchStrategy {
        platform: Platform::Windows,
        mode: RunMode::Development,
        base: BaseDir::ProjectRoot,
        executable: &[".venv_odin", "Scripts", "python.exe"],
        script: Some(&["backend", "server.py"]),
    },
    LaunchStrategy {
        platform: Platform::Unix,
        mode: RunMode::Packaged,
        base: BaseDir::PackagedDist,
        executable: &["odin-backend"],
        script: None,
    },
    LaunchStrategy {
        platform: Platform::Windows,
        mode: RunMode::Packaged,
        base: BaseDir::PackagedDist,
        executable: &["odin-backend.exe"],
        script: None,
    },
];

/// Resolves the launch specification for `(platform, mode)`.
///
/// Resolution only joins paths; it never touches the filesystem, so a
/// missing executable surfaces later as a launch failure.
///
/// # Errors
///
/// Returns [`SupervisorDomainError::MissingResourcesDir`] when packaged mode
/// is requested without a resources directory, or
/// [`SupervisorDomainError::NoLaunchStrategy`] when the table has no entry.
pub fn resolve_launch(
    platform: Platform,
    mode: RunMode,
    roots: &LaunchRoots,
) -> Result<LaunchSpec, SupervisorDomainError> {
    let strategy = LAUNCH_STRATEGIES
        .iter()
        .find(|candidate| candidate.platform == platform && candidate.mode == mode)
        .ok_or_else(|| SupervisorDomainError::NoLaunchStrategy {
            mode: mode.as_str().to_owned(),
        })?;

    let base = match strategy.base {
        BaseDir::ProjectRoot => roots.project_root.clone(),
        BaseDir::PackagedDist => roots
            .resources_dir
            .as_ref()
            .ok_or(SupervisorDomainError::MissingResourcesDir)?
            .join(PACKAGED_DIST_DIR),
    };

    let args = strategy
        .script
        .map(|segments| join_segments(&base, segments).into_string())
        .into_iter();

    Ok(LaunchSpec::new(join_segments(&base, strategy.executable))?
        .with_args(args)
        .with_working_directory(base))
}

/// Environment overrides for correct text encoding and locale handling.
#[must_use]
pub fn backend_environment(port: u16, locale: &str) -> BTreeMap<String, String> {
    [
        ("PORT", port.to_string()),
        ("PYTHONIOENCODING", "utf-8".to_owned()),
        ("PYTHONUTF8", "1".to_owned()),
        ("PYTHONLEGACYWINDOWSSTDIO", "0".to_owned()),
        ("LANG", locale.to_owned()),
        ("LC_ALL", locale.to_owned()),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value))
    .collect()
}

fn join_segments(base: &Utf8Path, segments: &[&str]) -> Utf8PathBuf {
    segments
        .iter()
        .fold(base.to_path_buf(), |path, segment| path.join(segment))
}
