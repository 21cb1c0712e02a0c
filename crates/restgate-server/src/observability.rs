//! Tracing setup, installed once after the configuration is loaded.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;

/// Installs the global subscriber. `RUST_LOG`, when set, overrides
/// `logging.level`.
///
/// # Errors
///
/// Fails if the directives do not parse or a subscriber is already installed.
pub fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(rust_log.as_deref(), &logging.level)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()?;
    Ok(())
}

fn log_filter(env_directives: Option<&str>, level: &str) -> anyhow::Result<EnvFilter> {
    let directives = env_directives
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(level);
    Ok(EnvFilter::try_new(directives)?)
}
