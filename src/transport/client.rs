//! API client: turns endpoint descriptors into wire requests and validates responses.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::endpoint::{set_header, Endpoint, HttpMethod};
use super::error::TransportError;
use super::reqwest_backend::ReqwestBackend;

/// Client-level settings shared by every request.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: Url,
  /// Default headers; per-endpoint headers win on collision
  pub headers: BTreeMap<String, String>,
  pub timeout: Duration,
}

impl ApiConfig {
  pub fn new(base_url: Url) -> Self {
    Self {
      base_url,
      headers: BTreeMap::new(),
      timeout: Duration::from_secs(30),
    }
  }

  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    set_header(&mut self.headers, name.into(), value.into());
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }
}

/// Fully resolved outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
  pub method: HttpMethod,
  pub url: Url,
  pub headers: BTreeMap<String, String>,
  pub body: Option<Vec<u8>>,
  pub timeout: Duration,
}

/// Raw inbound response, before status validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

/// The concrete HTTP stack.
///
/// Fails with [`TransportError::NetworkFailed`] when no response was received,
/// and with [`TransportError::InvalidResponse`] when a status arrived but the
/// body could not be read. Status codes are never turned into errors here.
#[async_trait]
pub trait HttpBackend: Send + Sync {
  async fn execute(&self, request: WireRequest) -> Result<WireResponse, TransportError>;
}

/// Sends one endpoint and returns the validated payload bytes.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn send(&self, endpoint: &Endpoint) -> Result<Vec<u8>, TransportError>;
}

/// Transport implementation over a pluggable [`HttpBackend`].
///
/// Makes exactly one attempt per call.
#[derive(Clone)]
pub struct ApiClient {
  config: Arc<ApiConfig>,
  backend: Arc<dyn HttpBackend>,
}

impl ApiClient {
  pub fn new(config: ApiConfig, backend: Arc<dyn HttpBackend>) -> Self {
    Self {
      config: Arc::new(config),
      backend,
    }
  }

  /// Client backed by reqwest.
  pub fn with_reqwest(config: ApiConfig) -> Result<Self, TransportError> {
    let backend = ReqwestBackend::new()?;
    Ok(Self::new(config, Arc::new(backend)))
  }

  pub fn config(&self) -> &ApiConfig {
    &self.config
  }

  /// Combine the base address with the endpoint's path and query.
  pub fn resolve_url(&self, endpoint: &Endpoint) -> Result<Url, TransportError> {
    let mut url = self.config.base_url.clone();
    if url.cannot_be_a_base() {
      return Err(TransportError::InvalidUrl(url.to_string()));
    }

    let base_path = url.path().trim_end_matches('/').to_string();
    let path = endpoint.path.trim_start_matches('/');
    if path.is_empty() {
      url.set_path(&base_path);
    } else {
      url.set_path(&format!("{}/{}", base_path, path));
    }

    if !endpoint.query.is_empty() {
      url
        .query_pairs_mut()
        .extend_pairs(endpoint.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    Ok(url)
  }

  /// Build the outbound request for an endpoint.
  pub fn build_request(&self, endpoint: &Endpoint) -> Result<WireRequest, TransportError> {
    let url = self.resolve_url(endpoint)?;

    let mut headers = BTreeMap::new();
    for (name, value) in self.config.headers.iter().chain(&endpoint.headers) {
      set_header(&mut headers, name.clone(), value.clone());
    }

    Ok(WireRequest {
      method: endpoint.method,
      url,
      headers,
      body: endpoint.body.clone(),
      timeout: self.config.timeout,
    })
  }
}

#[async_trait]
impl Transport for ApiClient {
  async fn send(&self, endpoint: &Endpoint) -> Result<Vec<u8>, TransportError> {
    let request = self.build_request(endpoint)?;
    debug!(method = %request.method, url = %request.url, "sending request");

    let response = self.backend.execute(request).await?;

    debug!(status = response.status, bytes = response.body.len(), "response received");

    if !(200..=299).contains(&response.status) {
      return Err(TransportError::from_status(response.status));
    }

    Ok(response.body)
  }
}
