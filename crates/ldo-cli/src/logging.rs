//! Log subscriber setup.

use crate::error::{CliError, Result};
use tracing_subscriber::EnvFilter;

/// Filter directive in effect: `--debug` wins, then `RUST_LOG`, then the
/// configured level.
pub fn filter_directive(configured: &str, debug: bool, rust_log: Option<&str>) -> String {
    if debug {
        return "debug".to_string();
    }
    match rust_log.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => value.to_string(),
        None => configured.to_string(),
    }
}

/// Install the global subscriber, writing to stderr.
pub fn init(configured: &str, debug: bool) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(configured, debug, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| CliError::Config(format!("Invalid log filter '{}': {}", directive, e)))?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| CliError::Config(format!("Failed to install logger: {}", e)))
}
