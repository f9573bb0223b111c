//! Fetch policies: how storage and transport are combined for a read.
//!
//! - [`CacheFirst`]: serve any stored value; otherwise fetch and write through.
//!   No freshness check is made, so it suits low-volatility reference data.
//! - [`NetworkFirst`]: fetch and write through; serve the stored value only when
//!   the network is unavailable (offline mode).
//! - [`NetworkOnly`]: never touches storage.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::DomainError;
use crate::storage::{KeyValueStorage, StorageError, StorageExt};
use crate::transport::{Endpoint, Transport, TransportError};

/// Indicates where fetched data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
  /// Fresh data from network
  Network,
  /// Previously stored data, served without a network call
  Cache,
  /// Network unavailable, serving stored data
  Offline,
}

/// A fetched value plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
  pub data: T,
  pub source: FetchSource,
}

impl<T> Fetched<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: FetchSource::Network,
    }
  }

  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: FetchSource::Cache,
    }
  }

  pub fn offline(data: T) -> Self {
    Self {
      data,
      source: FetchSource::Offline,
    }
  }
}

/// Strategy for a cacheable read of `endpoint` stored under `key`.
#[async_trait]
pub trait FetchPolicy: Send + Sync {
  async fn fetch<T>(&self, key: &str, endpoint: Endpoint) -> Result<Fetched<T>, DomainError>
  where
    T: Serialize + DeserializeOwned + Send + Sync + 'static;
}

/// Send the endpoint and decode the JSON payload.
///
/// A payload that fails to decode is a hard failure.
pub async fn fetch_json<T: DeserializeOwned>(
  transport: &dyn Transport,
  endpoint: &Endpoint,
) -> Result<T, DomainError> {
  let bytes = transport.send(endpoint).await?;
  let data = serde_json::from_slice(&bytes).map_err(TransportError::DecodingFailed)?;
  Ok(data)
}

/// Best-effort write; failures are logged and dropped.
fn write_through<T: Serialize>(storage: &dyn KeyValueStorage, key: &str, data: &T) {
  if let Err(e) = storage.save(key, data) {
    warn!(key, error = %e, "write-through to storage failed");
  }
}

#[derive(Clone)]
pub struct CacheFirst {
  transport: Arc<dyn Transport>,
  storage: Arc<dyn KeyValueStorage>,
}

impl CacheFirst {
  pub fn new(transport: Arc<dyn Transport>, storage: Arc<dyn KeyValueStorage>) -> Self {
    Self { transport, storage }
  }

  pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
    &self.storage
  }
}

#[async_trait]
impl FetchPolicy for CacheFirst {
  async fn fetch<T>(&self, key: &str, endpoint: Endpoint) -> Result<Fetched<T>, DomainError>
  where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
  {
    match self.storage.retrieve::<T>(key) {
      Ok(data) => {
        debug!(key, "cache hit");
        return Ok(Fetched::from_cache(data));
      }
      Err(StorageError::NotFound(_)) => debug!(key, "cache miss"),
      // Unreadable entries fall through to the network like a miss
      Err(e) => warn!(key, error = %e, "stored value unusable"),
    }

    let data: T = fetch_json(self.transport.as_ref(), &endpoint).await?;
    write_through(self.storage.as_ref(), key, &data);

    Ok(Fetched::from_network(data))
  }
}

#[derive(Clone)]
pub struct NetworkFirst {
  transport: Arc<dyn Transport>,
  storage: Arc<dyn KeyValueStorage>,
}

impl NetworkFirst {
  pub fn new(transport: Arc<dyn Transport>, storage: Arc<dyn KeyValueStorage>) -> Self {
    Self { transport, storage }
  }
}

#[async_trait]
impl FetchPolicy for NetworkFirst {
  async fn fetch<T>(&self, key: &str, endpoint: Endpoint) -> Result<Fetched<T>, DomainError>
  where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
  {
    match fetch_json::<T>(self.transport.as_ref(), &endpoint).await {
      Ok(data) => {
        write_through(self.storage.as_ref(), key, &data);
        Ok(Fetched::from_network(data))
      }
      // A payload arrived but was wrong; stale data would hide that
      Err(e @ DomainError::Transport(TransportError::DecodingFailed(_))) => Err(e),
      Err(e @ DomainError::Transport(_)) => match self.storage.retrieve::<T>(key) {
        Ok(data) => {
          warn!(key, error = %e, "network unavailable, serving stored value");
          Ok(Fetched::offline(data))
        }
        Err(_) => Err(e),
      },
      Err(e) => Err(e),
    }
  }
}

#[derive(Clone)]
pub struct NetworkOnly {
  transport: Arc<dyn Transport>,
}

impl NetworkOnly {
  pub fn new(transport: Arc<dyn Transport>) -> Self {
    Self { transport }
  }
}

#[async_trait]
impl FetchPolicy for NetworkOnly {
  async fn fetch<T>(&self, _key: &str, endpoint: Endpoint) -> Result<Fetched<T>, DomainError>
  where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
  {
    let data = fetch_json(self.transport.as_ref(), &endpoint).await?;
    Ok(Fetched::from_network(data))
  }
}
