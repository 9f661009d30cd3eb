//! Logging setup for glucosed.
//!
//! The log filter lives in the daemon config, but loading that config
//! already logs. A short-lived bootstrap subscriber covers that window.

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter used before the config file has been read
pub const BOOTSTRAP_LOG_LEVEL: &str = "info";

/// `RUST_LOG` if set, otherwise `fallback`
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Run `f` with a temporary subscriber installed on this thread
pub fn with_bootstrap_logging<T, W>(
    filter: EnvFilter,
    make_writer: W,
    f: impl FnOnce() -> T,
) -> T
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(make_writer)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// Install the global subscriber
pub fn init(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(log_level))
        .init();
}
