//! Hosts the Odin control layer outside a desktop shell.
//!
//! Usage:
//!
//! ```text
//! odin_host [serve]
//! odin_host ask <base-path> <question>
//! ```
//!
//! `serve` launches the compute service, logs the readiness push and runs
//! until interrupted. `ask` additionally waits for readiness, streams one
//! answer and logs the final text. Configuration comes from the environment
//! (`BACKEND_PORT`, `ODIN_RUN_MODE`, `ODIN_PROJECT_ROOT`, ...); logging is
//! controlled by `ODIN_LOG`.

use camino::Utf8PathBuf;
use mockable::{Clock, DefaultClock};
use odin::config::{ConfigError, OdinConfig};
use odin::qa::{
    adapters::SharedConversation,
    domain::{ConversationError, QaQuery},
};
use odin::readiness::{
    domain::{READINESS_CHANNEL, ReadinessEvent},
    ports::HealthProbe,
};
use odin::runtime::BackendRuntime;
use odin::telemetry;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Builder;
use tokio::sync::mpsc::UnboundedReceiver;

/// How long `ask` waits for the compute service to become ready.
const READY_TIMEOUT: Duration = Duration::from_secs(180);

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum HostError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("compute service did not become ready")]
    NotReady,
    #[error("question rejected: {0}")]
    Conversation(#[from] ConversationError),
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Serve,
    Ask { base_path: Utf8PathBuf, question: String },
}

fn main() -> Result<(), BoxError> {
    let installed = telemetry::init_tracing();
    tracing::debug!(installed, "logging initialised");
    let command = parse_args(collect_args()?.into_iter())?;
    let config = OdinConfig::from_env().map_err(HostError::from)?;
    let runtime = build_runtime()?;
    runtime.block_on(run(command, config)).map_err(Into::into)
}

fn collect_args() -> Result<Vec<String>, HostError> {
    env::args_os()
        .skip(1)
        .map(|arg_os| {
            arg_os
                .into_string()
                .map_err(|_| HostError::InvalidArgs("argument is not valid UTF-8".into()))
        })
        .collect()
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command, HostError> {
    let command = match args.next().as_deref() {
        None | Some("serve") => Command::Serve,
        Some("ask") => {
            let base_path = args
                .next()
                .ok_or_else(|| HostError::InvalidArgs("missing base path argument".into()))?;
            let question = args.collect::<Vec<_>>().join(" ");
            if question.trim().is_empty() {
                return Err(HostError::InvalidArgs("missing question argument".into()));
            }
            return Ok(Command::Ask {
                base_path: Utf8PathBuf::from(base_path),
                question,
            });
        }
        Some(other) => {
            return Err(HostError::InvalidArgs(format!(
                "unknown command '{other}'; expected serve or ask"
            )));
        }
    };
    if let Some(extra) = args.next() {
        return Err(HostError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok(command)
}

fn build_runtime() -> Result<tokio::runtime::Runtime, HostError> {
    Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(HostError::RuntimeInit)
}

async fn run(command: Command, config: OdinConfig) -> Result<(), HostError> {
    let host = BackendRuntime::start(config, Arc::new(DefaultClock));
    let mut readiness = host.subscribe();
    let result = match command {
        Command::Serve => {
            serve(&host, &mut readiness).await;
            Ok(())
        }
        Command::Ask {
            base_path,
            question,
        } => ask(&host, &mut readiness, QaQuery::new(base_path, question)).await,
    };
    host.shutdown().await;
    result
}

async fn serve(host: &BackendRuntime, readiness: &mut UnboundedReceiver<ReadinessEvent>) {
    let announce = async {
        announce_readiness(host, readiness).await;
        std::future::pending::<()>().await;
    };
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                tracing::warn!(%err, "could not listen for interrupts");
            }
            tracing::info!("shutdown requested");
        }
        () = announce => {}
    }
}

/// Logs readiness once; returns `false` if the relay closed before it came.
///
/// The push may have gone out before `readiness` was subscribed, so the cached
/// state is consulted first.
async fn announce_readiness<P, C>(
    host: &BackendRuntime<P, C>,
    readiness: &mut UnboundedReceiver<ReadinessEvent>,
) -> bool
where
    P: HealthProbe + 'static,
    C: Clock + Send + Sync + 'static,
{
    if host.get_readiness().ready {
        tracing::info!(channel = READINESS_CHANNEL, "compute service ready");
        return true;
    }
    match readiness.recv().await {
        Some(event) => {
            log_ready(&event);
            true
        }
        None => false,
    }
}

async fn ask(
    host: &BackendRuntime,
    readiness: &mut UnboundedReceiver<ReadinessEvent>,
    query: QaQuery,
) -> Result<(), HostError> {
    wait_until_ready(host, readiness).await?;
    let conversation = SharedConversation::default();
    let outcome = host.consumer().ask(&conversation, &query).await?;
    let snapshot = conversation.snapshot();
    let answer = snapshot
        .messages()
        .last()
        .map(|message| message.text().to_owned())
        .unwrap_or_default();
    tracing::info!(?outcome, %answer, "answer received");
    Ok(())
}

async fn wait_until_ready(
    host: &BackendRuntime,
    readiness: &mut UnboundedReceiver<ReadinessEvent>,
) -> Result<(), HostError> {
    if !host.launched() {
        return Err(HostError::NotReady);
    }
    if host.get_readiness().ready {
        return Ok(());
    }
    match tokio::time::timeout(READY_TIMEOUT, readiness.recv()).await {
        Ok(Some(event)) => {
            log_ready(&event);
            Ok(())
        }
        _ if host.get_readiness().ready => Ok(()),
        _ => Err(HostError::NotReady),
    }
}

fn log_ready(event: &ReadinessEvent) {
    tracing::info!(
        channel = READINESS_CHANNEL,
        details = %event.details,
        "compute service ready"
    );
}
