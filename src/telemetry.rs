//! Structured logging bootstrap.

use tracing_subscriber::EnvFilter;

/// Variable holding the log filter for Odin processes.
pub const LOG_ENV: &str = "ODIN_LOG";

/// Filter used when neither `ODIN_LOG` nor `RUST_LOG` is set or valid.
pub const DEFAULT_DIRECTIVE: &str = "info";

const FALLBACK_LOG_ENV: &str = "RUST_LOG";

/// Installs a `fmt` subscriber writing to stderr.
///
/// Returns `false` when a global subscriber is already installed, in which
/// case nothing changes.
#[must_use = "reports whether this call installed the subscriber"]
pub fn init_tracing() -> bool {
    let directive = select_directive(|name| std::env::var(name).ok());
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(&directive))
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

fn select_directive(lookup: impl Fn(&str) -> Option<String>) -> String {
    [LOG_ENV, FALLBACK_LOG_ENV]
        .into_iter()
        .filter_map(lookup)
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_owned())
}

fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}
