use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

use super::request::{AssetRequest, AssetResponse};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
  #[error("request to {url} failed: {reason}")]
  Transport { url: String, reason: String },
  #[error("unsupported method {0}")]
  Method(String),
}

/// Anything that can answer a request over the network.
///
/// Any response that arrives counts as success, whatever its status;
/// only transport failures are errors.
#[async_trait]
pub trait Network: Send + Sync + 'static {
  async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError>;
}

/// HTTP network access through reqwest.
#[derive(Clone, Default)]
pub struct HttpNetwork {
  client: reqwest::Client,
}

impl HttpNetwork {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Network for HttpNetwork {
  async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError> {
    let transport = |e: reqwest::Error| NetworkError::Transport {
      url: request.url.to_string(),
      reason: e.to_string(),
    };

    let method = reqwest::Method::from_bytes(request.method.as_bytes())
      .map_err(|_| NetworkError::Method(request.method.clone()))?;

    let response = self
      .client
      .request(method, request.url.clone())
      .send()
      .await
      .map_err(transport)?;

    let status = response.status().as_u16();
    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);
    let body = response.bytes().await.map_err(transport)?.to_vec();

    Ok(AssetResponse::new(status, content_type.as_deref(), body))
  }
}
