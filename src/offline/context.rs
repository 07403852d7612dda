//! Background execution context for the offline worker.
//!
//! The worker lives in its own task and shares no state with the caller.
//! Requests go in over an unbounded channel and each carries a oneshot for
//! its reply, so the worker handles them strictly one at a time.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::network::Network;
use super::request::{AssetRequest, Served};
use super::storage::{CacheError, CacheStorage};
use super::worker::{
  ActivateError, FetchError, GenerationSummary, InstallError, OfflineWorker,
};

#[derive(Debug, Error)]
pub enum WorkerError {
  #[error("offline worker has stopped")]
  Stopped,
  #[error("install failed: {0}")]
  Install(#[from] InstallError),
  #[error("activation failed: {0}")]
  Activate(#[from] ActivateError),
  #[error(transparent)]
  Fetch(#[from] FetchError),
  #[error(transparent)]
  Cache(#[from] CacheError),
}

enum Command {
  Install(oneshot::Sender<Result<usize, InstallError>>),
  Activate(oneshot::Sender<Result<Vec<String>, ActivateError>>),
  Fetch(AssetRequest, oneshot::Sender<Result<Served, FetchError>>),
  Generations(oneshot::Sender<Result<Vec<GenerationSummary>, CacheError>>),
}

/// Outcome of installing and activating the current generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
  pub generation: String,
  /// Number of manifest entries stored
  pub cached: usize,
  /// Generations deleted on activation
  pub purged: Vec<String>,
}

/// Cheap, cloneable handle to a running worker.
#[derive(Clone)]
pub struct WorkerHandle {
  tx: mpsc::UnboundedSender<Command>,
  generation: String,
}

/// Move the worker into its own task and return a handle to it.
pub fn spawn<N: Network, C: CacheStorage>(mut worker: OfflineWorker<N, C>) -> WorkerHandle {
  let (tx, mut rx) = mpsc::unbounded_channel();
  let generation = worker.cache_name().to_string();

  tokio::spawn(async move {
    match worker.restore_state().await {
      Ok(state) => debug!(?state, "offline worker started"),
      Err(e) => warn!(error = %e, "could not read existing cache generations"),
    }

    while let Some(command) = rx.recv().await {
      match command {
        Command::Install(reply) => {
          let _ = reply.send(worker.install().await);
        }
        Command::Activate(reply) => {
          let _ = reply.send(worker.activate().await);
        }
        Command::Fetch(request, reply) => {
          let _ = reply.send(worker.fetch(&request).await);
        }
        Command::Generations(reply) => {
          let _ = reply.send(worker.generations().await);
        }
      }
    }

    debug!("offline worker stopped");
  });

  WorkerHandle { tx, generation }
}

impl WorkerHandle {
  /// Name of the generation this worker maintains
  pub fn generation(&self) -> &str {
    &self.generation
  }

  async fn request<T>(
    &self,
    command: impl FnOnce(oneshot::Sender<T>) -> Command,
  ) -> Result<T, WorkerError> {
    let (reply, response) = oneshot::channel();
    self
      .tx
      .send(command(reply))
      .map_err(|_| WorkerError::Stopped)?;
    response.await.map_err(|_| WorkerError::Stopped)
  }

  pub async fn install(&self) -> Result<usize, WorkerError> {
    Ok(self.request(Command::Install).await??)
  }

  pub async fn activate(&self) -> Result<Vec<String>, WorkerError> {
    Ok(self.request(Command::Activate).await??)
  }

  pub async fn fetch(&self, request: AssetRequest) -> Result<Served, WorkerError> {
    Ok(
      self
        .request(|reply| Command::Fetch(request, reply))
        .await??,
    )
  }

  pub async fn generations(&self) -> Result<Vec<GenerationSummary>, WorkerError> {
    Ok(self.request(Command::Generations).await??)
  }

  /// Install then activate, the way a host does when the app first loads.
  pub async fn register(&self) -> Result<Registration, WorkerError> {
    let cached = self.install().await?;
    let purged = self.activate().await?;
    info!(generation = %self.generation, cached, purged = purged.len(), "offline worker registered");

    Ok(Registration {
      generation: self.generation.clone(),
      cached,
      purged,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::offline::request::ResponseSource;
  use crate::offline::storage::SqliteCacheStorage;
  use crate::offline::worker::tests::{settings, shell};
  use std::sync::Arc;

  #[tokio::test]
  async fn test_register_installs_and_activates() {
    let storage = SqliteCacheStorage::open_in_memory().unwrap();
    storage.open("v1").unwrap();

    let handle = spawn(OfflineWorker::new(shell(), storage, settings("v2")));
    let registration = handle.register().await.unwrap();

    assert_eq!(
      registration,
      Registration {
        generation: "v2".to_string(),
        cached: 2,
        purged: vec!["v1".to_string()],
      }
    );

    let generations = handle.generations().await.unwrap();
    assert_eq!(generations.len(), 1);
    assert_eq!(generations[0].name, "v2");
  }

  #[tokio::test]
  async fn test_fetch_through_handle() {
    let network = shell();
    let handle = spawn(OfflineWorker::new(
      Arc::clone(&network),
      SqliteCacheStorage::open_in_memory().unwrap(),
      settings("v1"),
    ));
    handle.register().await.unwrap();

    let served = handle
      .fetch(AssetRequest::parse("http://localhost:8080/assets/css/style.css").unwrap())
      .await
      .unwrap();
    assert_eq!(served.source, ResponseSource::Cache);
  }

  #[tokio::test]
  async fn test_failed_install_surfaces_through_handle() {
    let network = shell();
    network.go_offline();
    let handle = spawn(OfflineWorker::new(
      network,
      SqliteCacheStorage::open_in_memory().unwrap(),
      settings("v1"),
    ));

    assert!(matches!(
      handle.register().await,
      Err(WorkerError::Install(InstallError::Fetch { .. }))
    ));
  }
}
