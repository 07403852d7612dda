mod app;
mod cli;
mod config;
mod controller;
mod event;
mod install;
mod logging;
mod notify;
mod offline;
mod record;
mod store;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "rollbook")]
#[command(about = "A terminal student register that keeps working offline")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/rollbook/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Path of the record database, overriding the config
  #[arg(short, long)]
  database: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<cli::Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(path) = args.database {
    config.database.path = Some(path);
  }

  // Without a data directory there is no log file; subcommands log to
  // stderr instead, the UI runs without logging
  let _log_guard = match logging::init(&config) {
    Ok(guard) => Some(guard),
    Err(e) if args.command.is_some() => {
      logging::init_stderr(&config)?;
      warn!(error = %e, "file logging unavailable");
      None
    }
    Err(_) => None,
  };

  if let Some(command) = args.command {
    return cli::run(&config, command).await;
  }

  // A store that fails to open still gets a UI, with a toast saying why
  let controller = app::open_controller(config.database_path(), config.toast_ttl()).await;

  let worker = if config.offline.enabled {
    match cli::start_worker(&config) {
      Ok(worker) => Some(worker),
      Err(e) => {
        error!(error = %e, "offline worker not started");
        None
      }
    }
  } else {
    info!("offline cache disabled");
    None
  };

  let mut app = app::App::new(&config, controller, worker);
  app.run().await?;

  Ok(())
}
