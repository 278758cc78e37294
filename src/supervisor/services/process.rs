//! Tokio-backed supervisor for the compute service process.

use super::output::{OutputStream, capture_lines};
use crate::config::OdinConfig;
use crate::supervisor::domain::{
    BackendStatus, LaunchFailure, LaunchRoots, LaunchSpec, Platform, RunMode,
    SupervisorDomainError, backend_environment, resolve_launch,
};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// How long `stop` waits for the process to exit after signalling it.
const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// Errors returned by [`ProcessSupervisor`].
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Launch resolution failed.
    #[error(transparent)]
    Domain(#[from] SupervisorDomainError),
    /// The executable could not be spawned.
    #[error(transparent)]
    Launch(#[from] LaunchFailure),
    /// The compute service is created once per run.
    #[error("compute service was already started in this run")]
    AlreadyStarted,
}

/// Result type for supervisor operations.
pub type SupervisorResult<T> = Result<T, SupervisorError>;

struct SupervisedChild {
    pid: Option<u32>,
    terminate: Option<oneshot::Sender<()>>,
    watcher: JoinHandle<()>,
    capture: Vec<JoinHandle<()>>,
}

/// Owns the compute service process for the lifetime of the host.
///
/// The process handle never leaves the supervisor. Termination is requested
/// through a one-shot channel so the exit watcher, which owns the child,
/// sends exactly one signal.
pub struct ProcessSupervisor {
    platform: Platform,
    roots: LaunchRoots,
    port: u16,
    locale: String,
    stop_grace: Duration,
    started: AtomicBool,
    child: Mutex<Option<SupervisedChild>>,
    status: watch::Sender<Option<BackendStatus>>,
}

impl ProcessSupervisor {
    /// Creates a supervisor using the host platform and configured roots.
    #[must_use]
    pub fn new(config: &OdinConfig) -> Self {
        let roots = LaunchRoots {
            project_root: config.project_root().clone(),
            resources_dir: config.resources_dir().cloned(),
        };
        let (status, _) = watch::channel(None);
        Self {
            platform: Platform::current(),
            roots,
            port: config.port(),
            locale: config.backend_locale().to_owned(),
            stop_grace: DEFAULT_STOP_GRACE,
            started: AtomicBool::new(false),
            child: Mutex::new(None),
            status,
        }
    }

    /// Overrides how long [`Self::stop`] waits for exit.
    #[must_use]
    pub const fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Resolves the launch specification for `mode` and spawns it.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Domain`] when resolution fails,
    /// [`SupervisorError::Launch`] when spawning fails, or
    /// [`SupervisorError::AlreadyStarted`] on a second start.
    pub fn start(&self, mode: RunMode) -> SupervisorResult<()> {
        let spec = resolve_launch(self.platform, mode, &self.roots)?
            .with_env(backend_environment(self.port, &self.locale));
        self.launch(&spec)
    }

    /// Spawns an explicit launch specification.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Launch`] when spawning fails or
    /// [`SupervisorError::AlreadyStarted`] when a process was already started.
    pub fn launch(&self, spec: &LaunchSpec) -> SupervisorResult<()> {
        let mut slot = self.lock_child();
        if slot.is_some() || self.started.load(Ordering::Acquire) {
            return Err(SupervisorError::AlreadyStarted);
        }

        self.status.send_replace(Some(BackendStatus::Starting));
        tracing::info!(
            command = %spec.display_command(),
            cwd = ?spec.working_directory(),
            "starting compute service"
        );

        let mut command = Command::new(spec.command());
        command
            .args(spec.args())
            .envs(spec.env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(directory) = spec.working_directory() {
            command.current_dir(directory);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                let failure = LaunchFailure::new(spec.display_command(), err);
                tracing::error!(error = %failure, "compute service unavailable; readiness stays false");
                self.status.send_replace(None);
                return Err(failure.into());
            }
        };

        let pid = child.id();
        let capture = [
            child
                .stdout
                .take()
                .map(|pipe| capture_lines(pipe, OutputStream::Stdout)),
            child
                .stderr
                .take()
                .map(|pipe| capture_lines(pipe, OutputStream::Stderr)),
        ]
        .into_iter()
        .flatten()
        .collect();

        let (terminate_tx, terminate_rx) = oneshot::channel();
        let watcher = tokio::spawn(watch_exit(child, terminate_rx, self.status.clone()));

        self.started.store(true, Ordering::Release);
        self.status.send_replace(Some(BackendStatus::Running));
        tracing::info!(?pid, "compute service spawned");

        *slot = Some(SupervisedChild {
            pid,
            terminate: Some(terminate_tx),
            watcher,
            capture,
        });
        Ok(())
    }

    /// Sends one termination signal and releases capture resources.
    ///
    /// Calling `stop` again, or before `start`, does nothing.
    pub async fn stop(&self) {
        let Some(mut child) = self.lock_child().take() else {
            return;
        };

        if let Some(terminate) = child.terminate.take()
            && terminate.send(()).is_err()
        {
            tracing::debug!(pid = ?child.pid, "compute service already exited");
        }

        if tokio::time::timeout(self.stop_grace, &mut child.watcher)
            .await
            .is_err()
        {
            tracing::warn!(
                pid = ?child.pid,
                grace = ?self.stop_grace,
                "compute service did not exit within the grace period"
            );
        }

        for task in child.capture {
            task.abort();
        }
    }

    /// Returns the current lifecycle status; `None` before a successful spawn.
    #[must_use]
    pub fn status(&self) -> Option<BackendStatus> {
        *self.status.borrow()
    }

    /// Returns the OS process identifier while the process is supervised.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.lock_child().as_ref().and_then(|child| child.pid)
    }

    /// Subscribes to lifecycle status changes.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<Option<BackendStatus>> {
        self.status.subscribe()
    }

    /// Waits until the process exits and returns its exit code.
    ///
    /// Never resolves if the process was not started.
    pub async fn wait_for_exit(&self) -> Option<i32> {
        let mut receiver = self.status.subscribe();
        let status = receiver
            .wait_for(|status| status.is_some_and(BackendStatus::has_exited))
            .await
            .ok()
            .and_then(|status| *status);
        match status {
            Some(BackendStatus::Exited(code)) => code,
            _ => None,
        }
    }

    fn lock_child(&self) -> MutexGuard<'_, Option<SupervisedChild>> {
        self.child.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        let slot = self
            .child
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut child) = slot
            && let Some(terminate) = child.terminate.take()
        {
            tracing::info!(pid = ?child.pid, "terminating compute service on shutdown");
            if terminate.send(()).is_err() {
                tracing::debug!(pid = ?child.pid, "compute service already exited");
            }
        }
    }
}

async fn watch_exit(
    mut child: Child,
    mut terminate: oneshot::Receiver<()>,
    status: watch::Sender<Option<BackendStatus>>,
) {
    let pid = child.id();
    let exited = tokio::select! {
        result = child.wait() => Some(result),
        _ = &mut terminate => None,
    };
    let result = match exited {
        Some(result) => result,
        None => {
            send_termination(&mut child);
            child.wait().await
        }
    };

    let code = match result {
        Ok(exit) => {
            let code = exit.code();
            tracing::info!(?pid, ?code, "compute service exited");
            code
        }
        Err(err) => {
            tracing::warn!(?pid, error = %err, "failed to observe compute service exit");
            None
        }
    };
    status.send_replace(Some(BackendStatus::Exited(code)));
}

#[cfg(unix)]
fn send_termination(child: &mut Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(raw_pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(err) = kill(Pid::from_raw(raw_pid), Signal::SIGTERM) {
        tracing::warn!(pid = raw_pid, error = %err, "failed to signal compute service");
    }
}

#[cfg(not(unix))]
fn send_termination(child: &mut Child) {
    if let Err(err) = child.start_kill() {
        tracing::warn!(error = %err, "failed to terminate compute service");
    }
}
