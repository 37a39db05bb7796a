//! Tracing setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies. Output
//! goes to stderr, or to the configured file through a non-blocking writer.

use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the background writer.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
  let env_filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(&config.level))
    .map_err(|e| eyre!("Invalid log level '{}': {}", config.level, e))?;

  let (writer, guard) = match &config.file {
    Some(path) => {
      let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| eyre!("Failed to open log file {}: {}", path.display(), e))?;
      tracing_appender::non_blocking(file)
    }
    None => tracing_appender::non_blocking(std::io::stderr()),
  };

  tracing_subscriber::registry()
    .with(env_filter)
    .with(
      fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_ansi(config.file.is_none()),
    )
    .try_init()
    .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;

  Ok(guard)
}
