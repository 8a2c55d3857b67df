//! Logging setup for the demo binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the application. Verbosity is controlled with `RUST_LOG`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub fn default_filter() -> &'static str {
    "info"
}

/// Install a stdout subscriber filtered by `RUST_LOG`.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging() -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
}
