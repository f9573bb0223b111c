//! Key-value persistence behind a single contract with interchangeable backends.
//!
//! Backends store raw bytes. Typed access goes through [`StorageExt`], which
//! encodes values as JSON and keeps "absent" (`NotFound`) distinct from
//! "present but undecodable" (`DecodingFailed`).

mod file;
mod memory;
mod sqlite;

pub use file::FileStorage;
pub use memory::{MemoryStorage, NoopStorage};
pub use sqlite::SqliteStorage;

use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::error::BoxError;

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("Value not found for key: {0}")]
  NotFound(String),

  #[error("Invalid storage path: {}", .0.display())]
  InvalidPath(PathBuf),

  /// The backend could not be read
  #[error("Storage unavailable: {0}")]
  Unavailable(#[source] BoxError),

  #[error("Failed to encode: {0}")]
  EncodingFailed(#[source] serde_json::Error),

  #[error("Failed to decode: {0}")]
  DecodingFailed(#[source] serde_json::Error),

  #[error("Failed to save: {0}")]
  SaveFailed(#[source] BoxError),
}

/// Byte-level storage contract implemented by every backend.
///
/// `save` overwrites unconditionally. `remove` on a missing key succeeds.
pub trait KeyValueStorage: Send + Sync {
  fn save_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

  /// Fails with [`StorageError::NotFound`] when nothing is stored under `key`.
  fn retrieve_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

  fn remove(&self, key: &str) -> Result<(), StorageError>;

  fn exists(&self, key: &str) -> bool;
}

/// Typed JSON access on top of any [`KeyValueStorage`].
pub trait StorageExt: KeyValueStorage {
  fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
    let data = serde_json::to_vec(value).map_err(StorageError::EncodingFailed)?;
    self.save_bytes(key, data)
  }

  fn retrieve<T: DeserializeOwned>(&self, key: &str) -> Result<T, StorageError> {
    let data = self.retrieve_bytes(key)?;
    serde_json::from_slice(&data).map_err(StorageError::DecodingFailed)
  }
}

impl<S: KeyValueStorage + ?Sized> StorageExt for S {}
