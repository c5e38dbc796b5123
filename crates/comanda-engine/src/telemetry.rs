//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

use crate::config::{EngineConfig, LogFormat};

/// Initialize tracing/logging for the process.
///
/// `RUST_LOG` takes precedence over the configured filter. Safe to call
/// multiple times (subsequent calls are no-ops).
pub fn init(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let _ = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
}
