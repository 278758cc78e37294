//! Composition root wiring the supervisor, readiness monitor and relay.

use crate::compute::ComputeClient;
use crate::config::OdinConfig;
use crate::qa::{adapters::HttpQaTransport, services::StreamingConsumer};
use crate::readiness::{
    adapters::HttpHealthProbe,
    domain::{HealthCheckResult, ReadinessEvent, ReadinessReply},
    ports::HealthProbe,
    services::{NotificationRelay, ReadinessMonitor},
};
use crate::supervisor::services::ProcessSupervisor;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Running control layer for one host session.
///
/// A launch failure leaves the runtime usable: readiness stays `false` and
/// no polling takes place.
pub struct BackendRuntime<P = HttpHealthProbe, C = DefaultClock>
where
    P: HealthProbe + 'static,
    C: Clock + Send + Sync + 'static,
{
    config: OdinConfig,
    client: reqwest::Client,
    supervisor: ProcessSupervisor,
    monitor: ReadinessMonitor<P, C>,
    relay: NotificationRelay,
    launched: bool,
    shut_down: AtomicBool,
}

impl<C> BackendRuntime<HttpHealthProbe, C>
where
    C: Clock + Send + Sync + 'static,
{
    /// Launches the compute service and starts watching it over HTTP.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(config: OdinConfig, clock: Arc<C>) -> Self {
        let client = reqwest::Client::new();
        let probe = Arc::new(HttpHealthProbe::new(
            client.clone(),
            &config.service_base_url(),
        ));
        Self::assemble(config, client, probe, clock)
    }
}

impl<P, C> BackendRuntime<P, C>
where
    P: HealthProbe + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Launches the compute service and watches it through `probe`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start_with_probe(config: OdinConfig, probe: Arc<P>, clock: Arc<C>) -> Self {
        Self::assemble(config, reqwest::Client::new(), probe, clock)
    }

    fn assemble(config: OdinConfig, client: reqwest::Client, probe: Arc<P>, clock: Arc<C>) -> Self {
        let supervisor = ProcessSupervisor::new(&config);
        let launched = match supervisor.start(config.run_mode()) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(%err, "compute service unavailable; continuing without it");
                false
            }
        };

        let (events, published) = mpsc::unbounded_channel();
        let monitor = ReadinessMonitor::new(probe, clock, config.health_interval(), events);
        let relay = NotificationRelay::new(monitor.state());
        relay.attach(published);
        if launched {
            monitor.start();
        }
        tracing::info!(
            port = config.port(),
            mode = %config.run_mode(),
            launched,
            "control layer started"
        );

        Self {
            config,
            client,
            supervisor,
            monitor,
            relay,
            launched,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Returns the configuration the runtime was started with.
    #[must_use]
    pub const fn config(&self) -> &OdinConfig {
        &self.config
    }

    /// Returns whether the compute service process was spawned.
    #[must_use]
    pub const fn launched(&self) -> bool {
        self.launched
    }

    /// Returns the process supervisor.
    #[must_use]
    pub const fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    /// Registers a UI surface for the readiness push.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ReadinessEvent> {
        self.relay.subscribe()
    }

    /// Answers a UI readiness query.
    #[must_use]
    pub fn get_readiness(&self) -> ReadinessReply {
        self.relay.get_readiness()
    }

    /// Performs one live liveness check.
    pub async fn check_once(&self) -> HealthCheckResult {
        self.monitor.check_once().await
    }

    /// Returns whether readiness polling is still active.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.monitor.is_polling()
    }

    /// Builds a streaming consumer targeting the compute service.
    #[must_use]
    pub fn consumer(&self) -> StreamingConsumer<HttpQaTransport> {
        let transport = HttpQaTransport::new(self.client.clone(), &self.config.service_base_url());
        StreamingConsumer::new(Arc::new(transport)).with_watchdog(self.config.stream_watchdog())
    }

    /// Builds a client for the sibling endpoints.
    #[must_use]
    pub fn compute_client(&self) -> ComputeClient {
        ComputeClient::new(self.client.clone(), &self.config.service_base_url())
    }

    /// Cancels polling, releases subscribers and stops the compute service.
    ///
    /// Later calls do nothing.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.monitor.stop();
        self.relay.shutdown();
        self.supervisor.stop().await;
        tracing::info!("control layer stopped");
    }
}
