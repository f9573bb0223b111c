use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{KeyValueStorage, StorageError};

/// Process-local storage; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl KeyValueStorage for MemoryStorage {
  fn save_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
    self.lock().insert(key.to_string(), value);
    Ok(())
  }

  fn retrieve_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
    self
      .lock()
      .get(key)
      .cloned()
      .ok_or_else(|| StorageError::NotFound(key.to_string()))
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    self.lock().remove(key);
    Ok(())
  }

  fn exists(&self, key: &str) -> bool {
    self.lock().contains_key(key)
  }
}

/// Storage that doesn't keep anything.
/// Used when caching is disabled - every read misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStorage;

impl KeyValueStorage for NoopStorage {
  fn save_bytes(&self, _key: &str, _value: Vec<u8>) -> Result<(), StorageError> {
    Ok(())
  }

  fn retrieve_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
    Err(StorageError::NotFound(key.to_string()))
  }

  fn remove(&self, _key: &str) -> Result<(), StorageError> {
    Ok(())
  }

  fn exists(&self, _key: &str) -> bool {
    false
  }
}
