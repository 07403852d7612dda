//! Request and response types seen by the offline worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use super::storage::CachedResponse;

/// An outgoing request intercepted by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
  /// Upper-case HTTP method
  pub method: String,
  pub url: Url,
}

impl AssetRequest {
  pub fn new(method: &str, url: Url) -> Self {
    Self {
      method: method.to_uppercase(),
      url,
    }
  }

  pub fn get(url: Url) -> Self {
    Self::new("GET", url)
  }

  pub fn parse(url: &str) -> Result<Self, url::ParseError> {
    Ok(Self::get(Url::parse(url)?))
  }

  /// Only GET responses may be stored
  pub fn is_cacheable(&self) -> bool {
    self.method == "GET"
  }

  /// Stable, fixed-length key for this request (SHA256 of method and URL).
  pub fn cache_key(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.method.as_bytes());
    hasher.update(b" ");
    hasher.update(self.url.as_str().as_bytes());
    hex::encode(hasher.finalize())
  }
}

/// A response body with the little metadata the cache keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl AssetResponse {
  pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
    Self {
      status,
      content_type: content_type.map(String::from),
      body: body.into(),
    }
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// How a request is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
  /// Dynamic data: network first, cache as fallback
  Api,
  /// Application shell: cache first, network on miss
  Static,
}

/// Classify by a literal substring of the URL.
pub fn classify(request: &AssetRequest, api_marker: &str) -> RequestClass {
  if request.url.as_str().contains(api_marker) {
    RequestClass::Api
  } else {
    RequestClass::Static
  }
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
  Network,
  Cache,
}

/// A response handed back to the requester.
#[derive(Debug, Clone)]
pub struct Served {
  pub response: AssetResponse,
  pub source: ResponseSource,
  /// When the response was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
  /// Generation that answered (if from cache)
  pub generation: Option<String>,
}

impl Served {
  pub fn from_network(response: AssetResponse) -> Self {
    Self {
      response,
      source: ResponseSource::Network,
      cached_at: None,
      generation: None,
    }
  }

  pub fn from_cache(cached: CachedResponse) -> Self {
    Self {
      response: cached.response,
      source: ResponseSource::Cache,
      cached_at: Some(cached.cached_at),
      generation: Some(cached.generation),
    }
  }
}
