//! File logging. The terminal belongs to the UI, so logs go to a file.

use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;

pub const LOG_FILE: &str = "rollbook.log";

/// Install the global subscriber. Keep the guard alive until exit or
/// buffered lines are lost.
pub fn init(config: &Config) -> Result<WorkerGuard> {
  let dir = config.log_dir()?;
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .with(filter(config))
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  tracing::info!(dir = %dir.display(), "logging initialized");
  Ok(guard)
}

/// Log to stderr, for subcommands run where no log directory exists.
pub fn init_stderr(config: &Config) -> Result<()> {
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(filter(config))
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))
}

/// RUST_LOG wins over the configured level
fn filter(config: &Config) -> EnvFilter {
  EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(&config.logging.level))
    .unwrap_or_else(|_| EnvFilter::new("info"))
}

