//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after the configuration is loaded.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Builds the log filter. `RUST_LOG` takes precedence; `level` is the
/// fallback when it is unset or invalid. `level` accepts anything an
/// [`EnvFilter`] directive does (`"debug"`, `"quire=trace,info"`, ...).
pub fn filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow!("invalid log level '{}': {}", level, e))
}

/// Initialise the global tracing subscriber, logging to stderr.
pub fn init(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level)?)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to set subscriber: {}", e))
}
