//! Tracing initialization

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::Result;

/// Initialize tracing with JSON output
///
/// The filter comes from the configured log level; an unparsable level falls
/// back to `info`. Call once at startup — a second call fails inside
/// `tracing_subscriber` because a global subscriber is already set.
pub fn init_tracing(config: &Config) -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Tracing initialized at level: {}", config.log_level);

    Ok(())
}
