//! Delivers readiness to the UI by push and by pull.

use crate::readiness::domain::{READINESS_CHANNEL, ReadinessEvent, ReadinessHandle, ReadinessReply};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<ReadinessEvent>>>>;

/// Forwards the readiness event to every UI subscriber and answers
/// on-demand queries from the shared state.
///
/// The pull path never performs a live check, so a UI that attaches after the
/// push still learns the current readiness.
pub struct NotificationRelay {
    state: ReadinessHandle,
    subscribers: Subscribers,
    forwarder: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationRelay {
    /// Creates a relay reading from `state`.
    #[must_use]
    pub fn new(state: ReadinessHandle) -> Self {
        Self {
            state,
            subscribers: Arc::new(Mutex::new(Vec::new())),
            forwarder: Mutex::new(None),
        }
    }

    /// Registers a UI surface for the readiness push.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ReadinessEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        lock(&self.subscribers).push(sender);
        receiver
    }

    /// Starts forwarding events from the monitor to subscribers.
    ///
    /// Replaces any previous forwarder. Must be called from within a Tokio
    /// runtime.
    pub fn attach(&self, mut events: mpsc::UnboundedReceiver<ReadinessEvent>) {
        let subscribers = Arc::clone(&self.subscribers);
        let handle = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let mut targets = lock(&subscribers);
                targets.retain(|target| target.send(event.clone()).is_ok());
                tracing::debug!(
                    channel = READINESS_CHANNEL,
                    delivered = targets.len(),
                    "readiness pushed"
                );
            }
        });
        if let Some(previous) = lock(&self.forwarder).replace(handle) {
            previous.abort();
        }
    }

    /// Answers a UI readiness query from the cached state.
    #[must_use]
    pub fn get_readiness(&self) -> ReadinessReply {
        ReadinessReply {
            ready: self.state.is_ready(),
        }
    }

    /// Stops forwarding and drops every subscriber.
    pub fn shutdown(&self) {
        if let Some(handle) = lock(&self.forwarder).take() {
            handle.abort();
        }
        lock(&self.subscribers).clear();
    }
}

impl Drop for NotificationRelay {
    fn drop(&mut self) {
        if let Some(handle) = self
            .forwarder
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
