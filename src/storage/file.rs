use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{KeyValueStorage, StorageError};

/// Durable storage keeping one file per key under a base directory.
///
/// File names are the hex SHA-256 of the key, so any string is a valid key.
#[derive(Debug, Clone)]
pub struct FileStorage {
  base_dir: PathBuf,
}

impl FileStorage {
  /// Open storage rooted at `base_dir`, creating the directory if needed.
  pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
    let base_dir = base_dir.into();

    if base_dir.exists() && !base_dir.is_dir() {
      return Err(StorageError::InvalidPath(base_dir));
    }
    std::fs::create_dir_all(&base_dir).map_err(|e| StorageError::Unavailable(Box::new(e)))?;

    Ok(Self { base_dir })
  }

  /// Open storage at the default location in the user's data directory.
  pub fn open_default() -> Result<Self, StorageError> {
    Self::open(Self::default_path()?)
  }

  pub fn default_path() -> Result<PathBuf, StorageError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StorageError::InvalidPath(PathBuf::from("~/.local/share")))?;

    Ok(data_dir.join("loadstate").join("storage"))
  }

  pub fn base_dir(&self) -> &Path {
    &self.base_dir
  }

  fn path_for(&self, key: &str) -> PathBuf {
    let digest = Sha256::digest(key.as_bytes());
    self.base_dir.join(format!("{}.json", hex::encode(digest)))
  }
}

impl KeyValueStorage for FileStorage {
  fn save_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
    let path = self.path_for(key);
    debug!(key, path = %path.display(), "writing stored value");
    std::fs::write(&path, value).map_err(|e| StorageError::SaveFailed(Box::new(e)))
  }

  fn retrieve_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
    match std::fs::read(self.path_for(key)) {
      Ok(data) => Ok(data),
      Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
      Err(e) => Err(StorageError::Unavailable(Box::new(e))),
    }
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    match std::fs::remove_file(self.path_for(key)) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(StorageError::Unavailable(Box::new(e))),
    }
  }

  fn exists(&self, key: &str) -> bool {
    self.path_for(key).is_file()
  }
}
