//! Offline worker: generation lifecycle and the per-request fetch policy.

use futures::future::try_join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::network::{Network, NetworkError};
use super::request::{classify, AssetRequest, AssetResponse, RequestClass, Served};
use super::storage::{CacheError, CacheStorage, CachedResponse};
use crate::config::OfflineConfig;

/// Fixed inputs of the worker.
#[derive(Debug, Clone)]
pub struct OfflineSettings {
  /// Name of the current generation
  pub cache_name: String,
  /// Base that relative manifest entries resolve against
  pub origin: Url,
  pub manifest: Vec<String>,
  pub api_marker: String,
  /// Also store static assets fetched after install
  pub cache_static_on_fetch: bool,
}

impl OfflineSettings {
  pub fn from_config(config: &OfflineConfig) -> Result<Self, url::ParseError> {
    Ok(Self {
      cache_name: config.cache_name.clone(),
      origin: Url::parse(&config.origin)?,
      manifest: config.manifest.clone(),
      api_marker: config.api_marker.clone(),
      cache_static_on_fetch: config.cache_static_on_fetch,
    })
  }

  /// Resolve a path or URL against the origin.
  pub fn resolve(&self, entry: &str) -> Result<AssetRequest, url::ParseError> {
    Ok(AssetRequest::get(self.origin.join(entry)?))
  }
}

/// Lifecycle of the current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
  Absent,
  Populating,
  /// Installed but older generations may still exist
  Installed,
  Active,
}

#[derive(Debug, Error)]
pub enum InstallError {
  #[error("manifest entry {entry:?} is not a valid URL: {reason}")]
  BadManifest { entry: String, reason: String },
  #[error("failed to fetch {url}: {source}")]
  Fetch {
    url: String,
    #[source]
    source: NetworkError,
  },
  #[error("{url} answered with status {status}")]
  BadStatus { url: String, status: u16 },
  #[error(transparent)]
  Cache(#[from] CacheError),
}

#[derive(Debug, Error)]
pub enum ActivateError {
  #[error("generation {0} is not installed")]
  NotInstalled(String),
  #[error(transparent)]
  Cache(#[from] CacheError),
}

#[derive(Debug, Error)]
pub enum FetchError {
  /// Network failed and there was nothing cached to fall back to
  #[error("offline and nothing cached for {url}")]
  Offline {
    url: String,
    #[source]
    source: NetworkError,
  },
  #[error(transparent)]
  Network(#[from] NetworkError),
}

/// Contents of one generation, for listing.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
  pub name: String,
  pub current: bool,
  pub entries: Vec<String>,
}

pub struct OfflineWorker<N: Network, C: CacheStorage> {
  network: N,
  caches: Arc<C>,
  settings: OfflineSettings,
  state: GenerationState,
}

impl<N: Network, C: CacheStorage> OfflineWorker<N, C> {
  pub fn new(network: N, caches: C, settings: OfflineSettings) -> Self {
    Self {
      network,
      caches: Arc::new(caches),
      settings,
      state: GenerationState::Absent,
    }
  }

  #[cfg(test)]
  pub fn state(&self) -> GenerationState {
    self.state
  }

  pub fn cache_name(&self) -> &str {
    &self.settings.cache_name
  }

  /// Run a storage call on the blocking pool; the backends do blocking I/O.
  async fn with_caches<T, F>(&self, op: F) -> Result<T, CacheError>
  where
    T: Send + 'static,
    F: FnOnce(&C) -> Result<T, CacheError> + Send + 'static,
  {
    let caches = Arc::clone(&self.caches);
    tokio::task::spawn_blocking(move || op(caches.as_ref()))
      .await
      .map_err(|e| CacheError(format!("cache task failed: {}", e)))?
  }

  /// Pick up a generation left in storage by an earlier run.
  pub async fn restore_state(&mut self) -> Result<GenerationState, CacheError> {
    let keys = self.with_caches(|c| c.keys()).await?;
    if keys.iter().any(|k| *k == self.settings.cache_name) {
      self.state = if keys.len() == 1 {
        GenerationState::Active
      } else {
        GenerationState::Installed
      };
    }
    Ok(self.state)
  }

  /// Create the current generation and fill it with the manifest.
  ///
  /// Every entry must be fetched with a 2xx status or nothing is stored. A
  /// generation created by a failed install is removed again.
  pub async fn install(&mut self) -> Result<usize, InstallError> {
    let name = self.settings.cache_name.clone();
    let previous = self.state;

    let requests = self
      .settings
      .manifest
      .iter()
      .map(|entry| {
        self
          .settings
          .resolve(entry)
          .map_err(|e| InstallError::BadManifest {
            entry: entry.clone(),
            reason: e.to_string(),
          })
      })
      .collect::<Result<Vec<_>, _>>()?;

    self.state = GenerationState::Populating;
    let opened = {
      let name = name.clone();
      self.with_caches(move |c| c.open(&name)).await
    };
    let created = match opened {
      Ok(created) => created,
      Err(e) => {
        self.state = previous;
        return Err(e.into());
      }
    };
    info!(generation = %name, "opened cache");

    let result = self.populate(&name, &requests).await;

    match result {
      Ok(count) => {
        self.state = if previous == GenerationState::Active {
          GenerationState::Active
        } else {
          GenerationState::Installed
        };
        info!(generation = %name, count, "cache generation installed");
        Ok(count)
      }
      Err(e) => {
        warn!(generation = %name, error = %e, "cache install failed");
        if created {
          let partial = name.clone();
          if let Err(cleanup) = self.with_caches(move |c| c.delete(&partial)).await {
            warn!(generation = %name, error = %cleanup, "failed to remove partial generation");
          }
          self.state = GenerationState::Absent;
        } else {
          self.state = previous;
        }
        Err(e)
      }
    }
  }

  async fn populate(&self, name: &str, requests: &[AssetRequest]) -> Result<usize, InstallError> {
    let network = &self.network;

    let fetched = try_join_all(requests.iter().map(|request| async move {
      let response = network
        .fetch(request)
        .await
        .map_err(|source| InstallError::Fetch {
          url: request.url.to_string(),
          source,
        })?;

      if !response.is_success() {
        return Err(InstallError::BadStatus {
          url: request.url.to_string(),
          status: response.status,
        });
      }

      Ok((request.clone(), response))
    }))
    .await?;

    let count = fetched.len();
    let name = name.to_string();
    self
      .with_caches(move |c| c.put_all(&name, &fetched))
      .await?;
    Ok(count)
  }

  /// Make the current generation the only one. Returns the purged names.
  pub async fn activate(&mut self) -> Result<Vec<String>, ActivateError> {
    let name = self.settings.cache_name.clone();

    if !matches!(
      self.state,
      GenerationState::Installed | GenerationState::Active
    ) {
      return Err(ActivateError::NotInstalled(name));
    }

    let purged = {
      let name = name.clone();
      self
        .with_caches(move |c| {
          let mut purged = Vec::new();
          for key in c.keys()? {
            if key != name && c.delete(&key)? {
              purged.push(key);
            }
          }
          Ok(purged)
        })
        .await?
    };
    for key in &purged {
      info!(generation = %key, "deleted old cache generation");
    }

    self.state = GenerationState::Active;
    Ok(purged)
  }

  /// Answer an intercepted request.
  pub async fn fetch(&self, request: &AssetRequest) -> Result<Served, FetchError> {
    match classify(request, &self.settings.api_marker) {
      RequestClass::Api => self.network_first(request).await,
      RequestClass::Static => self.cache_first(request).await,
    }
  }

  async fn network_first(&self, request: &AssetRequest) -> Result<Served, FetchError> {
    match self.network.fetch(request).await {
      Ok(response) => {
        if request.is_cacheable() {
          self.store(request, &response).await;
        } else {
          debug!(method = %request.method, url = %request.url, "not caching non-GET response");
        }
        Ok(Served::from_network(response))
      }
      Err(source) => {
        debug!(url = %request.url, error = %source, "network failed, trying cache");
        match self.lookup(request).await {
          Some(cached) => Ok(Served::from_cache(cached)),
          None => Err(FetchError::Offline {
            url: request.url.to_string(),
            source,
          }),
        }
      }
    }
  }

  async fn cache_first(&self, request: &AssetRequest) -> Result<Served, FetchError> {
    if let Some(cached) = self.lookup(request).await {
      return Ok(Served::from_cache(cached));
    }

    let response = self.network.fetch(request).await?;
    if self.settings.cache_static_on_fetch && request.is_cacheable() && response.is_success() {
      self.store(request, &response).await;
    }
    Ok(Served::from_network(response))
  }

  /// Cache lookup across generations; storage errors count as a miss.
  async fn lookup(&self, request: &AssetRequest) -> Option<CachedResponse> {
    let owned = request.clone();
    match self.with_caches(move |c| c.match_any(&owned)).await {
      Ok(found) => found,
      Err(e) => {
        warn!(url = %request.url, error = %e, "cache lookup failed");
        None
      }
    }
  }

  async fn store(&self, request: &AssetRequest, response: &AssetResponse) {
    let name = self.settings.cache_name.clone();
    let entry = (request.clone(), response.clone());
    let stored = self
      .with_caches(move |c| c.put(&name, &entry.0, &entry.1))
      .await;
    if let Err(e) = stored {
      warn!(url = %request.url, error = %e, "failed to cache response");
    }
  }

  pub async fn generations(&self) -> Result<Vec<GenerationSummary>, CacheError> {
    let current = self.settings.cache_name.clone();
    self
      .with_caches(move |c| {
        c.keys()?
          .into_iter()
          .map(|name| {
            let entries = c.entries(&name)?;
            Ok(GenerationSummary {
              current: name == current,
              name,
              entries,
            })
          })
          .collect()
      })
      .await
  }
}
