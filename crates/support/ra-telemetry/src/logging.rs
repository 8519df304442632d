//! Logging initialization utilities.

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Initialize logging with the specified level.
///
/// `RUST_LOG` overrides the level when set. Logs are written to stderr.
/// Fails instead of panicking when a global subscriber is already installed,
/// which happens when the host application owns logging.
pub fn init_logging(level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
