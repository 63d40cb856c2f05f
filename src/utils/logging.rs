// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Sets up the logging framework using tracing_subscriber.
/// Reads log level filters from the `RUST_LOG` environment variable,
/// falling back to `default_level` when it is unset or invalid.
pub fn setup_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // try_init so a second call (tests, embedding) does not panic
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();

    tracing::debug!("Logging setup complete.");
}
