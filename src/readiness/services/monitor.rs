//! Polls the liveness probe until the compute service reports ready.

use crate::readiness::{
    domain::{HealthCheckResult, ReadinessEvent, ReadinessHandle},
    ports::HealthProbe,
};
use mockable::Clock;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

struct PollTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PollTask {
    fn halt(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

struct PollContext<P, C> {
    probe: Arc<P>,
    clock: Arc<C>,
    state: ReadinessHandle,
    events: mpsc::UnboundedSender<ReadinessEvent>,
    interval: Duration,
}

impl<P, C> PollContext<P, C>
where
    P: HealthProbe,
    C: Clock + Send + Sync,
{
    async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempt: u64 = 0;

        loop {
            tokio::select! {
                () = cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }
            attempt += 1;

            let result = tokio::select! {
                () = cancel.cancelled() => return,
                checked = check(&*self.probe, &*self.clock) => checked,
            };
            if !result.ok() {
                tracing::trace!(attempt, reason = ?result.message(), "compute service not ready yet");
                continue;
            }

            let checked_at = result.checked_at();
            let details = result.details().clone();
            if self.state.mark_ready(details.clone(), checked_at) {
                tracing::info!(attempt, "compute service is ready");
                if self.events.send(ReadinessEvent::ready(details)).is_err() {
                    tracing::debug!("no readiness subscriber attached");
                }
            }
            return;
        }
    }
}

async fn check<P, C>(probe: &P, clock: &C) -> HealthCheckResult
where
    P: HealthProbe + ?Sized,
    C: Clock + ?Sized,
{
    match probe.check().await {
        Ok(report) => HealthCheckResult::from_report(report, clock.utc()),
        Err(err) => HealthCheckResult::unreachable(clock.utc(), err.to_string()),
    }
}

/// Detects the one-way transition of the compute service to ready.
///
/// [`Self::start`] performs an immediate check and then one check per
/// interval. The first successful check marks the shared state ready, emits a
/// single [`ReadinessEvent`] and ends polling for the rest of the run.
pub struct ReadinessMonitor<P, C>
where
    P: HealthProbe + 'static,
    C: Clock + Send + Sync + 'static,
{
    probe: Arc<P>,
    clock: Arc<C>,
    state: ReadinessHandle,
    events: mpsc::UnboundedSender<ReadinessEvent>,
    interval: Duration,
    poller: Mutex<Option<PollTask>>,
}

impl<P, C> ReadinessMonitor<P, C>
where
    P: HealthProbe + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a monitor publishing its readiness event on `events`.
    #[must_use]
    pub fn new(
        probe: Arc<P>,
        clock: Arc<C>,
        interval: Duration,
        events: mpsc::UnboundedSender<ReadinessEvent>,
    ) -> Self {
        Self {
            probe,
            clock,
            state: ReadinessHandle::new(),
            events,
            interval,
            poller: Mutex::new(None),
        }
    }

    /// Returns a read handle onto the shared readiness state.
    #[must_use]
    pub fn state(&self) -> ReadinessHandle {
        self.state.clone()
    }

    /// Resets readiness and (re)starts polling.
    ///
    /// Any previous poll timer is cancelled first. Must be called from within
    /// a Tokio runtime.
    pub fn start(&self) {
        let mut poller = self.lock_poller();
        if let Some(previous) = poller.take() {
            previous.halt();
        }
        self.state.reset();

        let context = PollContext {
            probe: Arc::clone(&self.probe),
            clock: Arc::clone(&self.clock),
            state: self.state.clone(),
            events: self.events.clone(),
            interval: self.interval,
        };
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(context.run(cancel.clone()));
        tracing::debug!(interval = ?self.interval, "readiness polling started");
        *poller = Some(PollTask { cancel, handle });
    }

    /// Performs one live check without touching the timer or the state.
    pub async fn check_once(&self) -> HealthCheckResult {
        check(&*self.probe, &*self.clock).await
    }

    /// Returns whether the poll timer is still active.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.lock_poller()
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Cancels the poll timer; readiness is left as it is.
    pub fn stop(&self) {
        if let Some(task) = self.lock_poller().take() {
            task.halt();
            tracing::debug!("readiness polling stopped");
        }
    }

    fn lock_poller(&self) -> MutexGuard<'_, Option<PollTask>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P, C> Drop for ReadinessMonitor<P, C>
where
    P: HealthProbe + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if let Some(task) = self
            .poller
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.halt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readiness::domain::HealthReport;
    use crate::readiness::ports::{HealthCheckError, MockHealthProbe};
    use mockable::DefaultClock;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_millis(1000);

    type TestMonitor = ReadinessMonitor<MockHealthProbe, DefaultClock>;

    /// Builds a probe answering not-ready `failures` times, then ready.
    fn ready_after(failures: usize) -> (MockHealthProbe, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut probe = MockHealthProbe::new();
        probe.expect_check().returning(move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            Ok(HealthReport::from_body(
                json!({ "ok": call >= failures, "call": call }),
            ))
        });
        (probe, calls)
    }

    fn monitor_for(
        probe: MockHealthProbe,
    ) -> (TestMonitor, mpsc::UnboundedReceiver<ReadinessEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let monitor =
            ReadinessMonitor::new(Arc::new(probe), Arc::new(DefaultClock), INTERVAL, events);
        (monitor, receiver)
    }

    #[tokio::test(start_paused = true)]
    async fn notifies_once_after_fourth_check() {
        let (probe, calls) = ready_after(3);
        let (monitor, mut events) = monitor_for(probe);

        monitor.start();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!monitor.state().is_ready());
        assert!(events.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        let event = events.try_recv().expect("readiness event should be published");
        assert!(event.ready);
        assert_eq!(event.details["call"], 3);
        assert!(monitor.state().is_ready());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn polling_stops_after_ready() {
        let (probe, calls) = ready_after(0);
        let (monitor, mut events) = monitor_for(probe);

        monitor.start();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!monitor.is_polling());
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn probe_errors_keep_polling() {
        let mut probe = MockHealthProbe::new();
        probe
            .expect_check()
            .returning(|| Err(HealthCheckError::Status(503)));
        let (monitor, mut events) = monitor_for(probe);

        monitor.start();
        tokio::time::sleep(Duration::from_millis(5500)).await;

        assert!(monitor.is_polling());
        assert!(!monitor.state().is_ready());
        assert!(events.try_recv().is_err());
        monitor.stop();
        assert!(!monitor.is_polling());
    }

    #[tokio::test]
    async fn check_once_leaves_state_untouched() {
        let mut probe = MockHealthProbe::new();
        probe
            .expect_check()
            .times(1)
            .returning(|| Ok(HealthReport::from_body(json!({"ok": true}))));
        let (monitor, mut events) = monitor_for(probe);

        let result = monitor.check_once().await;

        assert!(result.ok());
        assert!(!monitor.state().is_ready());
        assert!(!monitor.is_polling());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn check_once_reports_failure_reason() {
        let mut probe = MockHealthProbe::new();
        probe
            .expect_check()
            .times(1)
            .returning(|| Err(HealthCheckError::MalformedBody("expected value".to_owned())));
        let (monitor, _events) = monitor_for(probe);

        let result = monitor.check_once().await;

        assert!(!result.ok());
        assert!(
            result
                .message()
                .is_some_and(|message| message.contains("malformed"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn restart_cancels_previous_timer() {
        let (probe, calls) = ready_after(usize::MAX);
        let (monitor, _events) = monitor_for(probe);

        monitor.start();
        monitor.start();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        monitor.stop();
    }
}
