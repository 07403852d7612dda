//! Non-interactive subcommands for scripting against the same database and
//! offline cache the terminal UI uses.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use std::io::Write;

use crate::config::Config;
use crate::controller::{FormState, RecordFilter, ValidForm};
use crate::offline::{
  self, AssetRequest, HttpNetwork, OfflineSettings, OfflineWorker, SqliteCacheStorage, WorkerHandle,
};
use crate::record::{Record, RecordId};
use crate::store::{RecordStore, SqliteRecordStore};

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Read and change student records
  #[command(subcommand)]
  Records(RecordsCommand),
  /// Drive the offline cache directly
  #[command(subcommand)]
  Cache(CacheCommand),
}

#[derive(Subcommand, Debug)]
pub enum RecordsCommand {
  /// Print records, optionally filtered
  List {
    /// Case-insensitive name substring
    #[arg(long)]
    name: Option<String>,
    /// Minimum age, inclusive
    #[arg(long)]
    min_age: Option<String>,
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
  },
  Add { name: String, age: String },
  Delete { id: RecordId },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
  /// Fetch the manifest into the current generation
  Install,
  /// Delete every other generation
  Activate,
  /// Show stored generations and their entries
  List,
  /// Answer a request the way the offline worker would
  Fetch { url: String },
}

pub async fn run(config: &Config, command: Command) -> Result<()> {
  let mut out = std::io::stdout();
  match command {
    Command::Records(command) => {
      let store = SqliteRecordStore::open(config.database_path()?).await?;
      run_records(&store, command, &mut out).await
    }
    Command::Cache(command) => {
      let worker = start_worker(config)?;
      run_cache(&worker, command, &mut out).await
    }
  }
}

async fn run_records<S: RecordStore, W: Write>(
  store: &S,
  command: RecordsCommand,
  out: &mut W,
) -> Result<()> {
  match command {
    RecordsCommand::List {
      name,
      min_age,
      json,
    } => {
      let filter = RecordFilter::new(name.unwrap_or_default(), min_age.unwrap_or_default());
      let records = filter.apply(store.list().await?);
      if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?;
        return Ok(());
      }
      if records.is_empty() {
        writeln!(out, "No data available")?;
        return Ok(());
      }
      writeln!(out, "{:>4}  {:<30}  {:>3}", "ID", "Name", "Age")?;
      for record in &records {
        writeln!(out, "{}", format_row(record))?;
      }
    }
    RecordsCommand::Add { name, age } => match FormState::new(name, age).validate()? {
      ValidForm::Create(record) => {
        let id = store.add(record).await?;
        writeln!(out, "Record added ({})", id)?;
      }
      ValidForm::Update(_) => return Err(eyre!("unexpected record id")),
    },
    RecordsCommand::Delete { id } => {
      store.delete(id).await?;
      writeln!(out, "Record deleted ({})", id)?;
    }
  }

  Ok(())
}

/// One listing row; the id is the one `records delete` takes
fn format_row(record: &Record) -> String {
  format!("{:>4}  {:<30}  {:>3}", record.id, record.name, record.age)
}

async fn run_cache<W: Write>(
  worker: &WorkerHandle,
  command: CacheCommand,
  out: &mut W,
) -> Result<()> {
  match command {
    CacheCommand::Install => {
      let cached = worker.install().await?;
      writeln!(out, "Installed {} ({} entries)", worker.generation(), cached)?;
    }
    CacheCommand::Activate => {
      let purged = worker.activate().await?;
      if purged.is_empty() {
        writeln!(out, "No old generations")?;
      }
      for name in purged {
        writeln!(out, "Deleted {}", name)?;
      }
    }
    CacheCommand::List => {
      for generation in worker.generations().await? {
        let marker = if generation.current { "*" } else { " " };
        writeln!(
          out,
          "{} {} ({} entries)",
          marker,
          generation.name,
          generation.entries.len()
        )?;
        for url in generation.entries {
          writeln!(out, "    {}", url)?;
        }
      }
    }
    CacheCommand::Fetch { url } => {
      let request = AssetRequest::parse(&url)?;
      let served = worker.fetch(request).await?;
      writeln!(
        out,
        "{} {:?} ({} bytes)",
        served.response.status,
        served.source,
        served.response.body.len()
      )?;
      if let (Some(generation), Some(cached_at)) = (&served.generation, served.cached_at) {
        writeln!(out, "cached in {} at {}", generation, cached_at.to_rfc3339())?;
      }
    }
  }

  Ok(())
}

/// Build the offline worker from config and move it into its own task.
pub fn start_worker(config: &Config) -> Result<WorkerHandle> {
  let settings = OfflineSettings::from_config(&config.offline)
    .map_err(|e| eyre!("Invalid offline origin {}: {}", config.offline.origin, e))?;
  let caches = SqliteCacheStorage::open(&config.cache_path()?)?;
  let worker = OfflineWorker::new(HttpNetwork::new(), caches, settings);
  Ok(offline::spawn(worker))
}
