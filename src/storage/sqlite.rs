//! SQLite-backed key-value storage.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{KeyValueStorage, StorageError};

/// Schema for the key-value table.
const KV_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    saved_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Durable storage in a single SQLite database file.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open or create the database at `path`.
  pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| StorageError::Unavailable(Box::new(e)))?;
    }

    let conn = Connection::open(path).map_err(|e| StorageError::Unavailable(Box::new(e)))?;
    Self::with_connection(conn)
  }

  /// Open the database at the default location.
  pub fn open_default() -> Result<Self, StorageError> {
    Self::open(Self::default_path()?)
  }

  /// Database that lives only as long as this value.
  pub fn in_memory() -> Result<Self, StorageError> {
    let conn = Connection::open_in_memory().map_err(|e| StorageError::Unavailable(Box::new(e)))?;
    Self::with_connection(conn)
  }

  pub fn default_path() -> Result<PathBuf, StorageError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StorageError::InvalidPath(PathBuf::from("~/.local/share")))?;

    Ok(data_dir.join("loadstate").join("cache.db"))
  }

  fn with_connection(conn: Connection) -> Result<Self, StorageError> {
    conn
      .execute_batch(KV_SCHEMA)
      .map_err(|e| StorageError::Unavailable(Box::new(e)))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
    self
      .conn
      .lock()
      .map_err(|e| StorageError::Unavailable(format!("Lock poisoned: {}", e).into()))
  }

  /// When the value under `key` was last written.
  pub fn saved_at(&self, key: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
    let conn = self.lock()?;

    let saved_at: Option<String> = conn
      .query_row(
        "SELECT saved_at FROM kv_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| StorageError::Unavailable(Box::new(e)))?;

    saved_at.as_deref().map(parse_datetime).transpose()
  }
}

impl KeyValueStorage for SqliteStorage {
  fn save_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
    let conn = self.lock()?;

    conn
      .execute(
        "INSERT OR REPLACE INTO kv_store (key, data, saved_at) VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| StorageError::SaveFailed(Box::new(e)))?;

    Ok(())
  }

  fn retrieve_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
    let conn = self.lock()?;

    let data: Option<Vec<u8>> = conn
      .query_row(
        "SELECT data FROM kv_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| StorageError::Unavailable(Box::new(e)))?;

    data.ok_or_else(|| StorageError::NotFound(key.to_string()))
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    let conn = self.lock()?;

    conn
      .execute("DELETE FROM kv_store WHERE key = ?", params![key])
      .map_err(|e| StorageError::Unavailable(Box::new(e)))?;

    Ok(())
  }

  fn exists(&self, key: &str) -> bool {
    let Ok(conn) = self.lock() else {
      return false;
    };

    conn
      .query_row(
        "SELECT 1 FROM kv_store WHERE key = ?",
        params![key],
        |_| Ok(()),
      )
      .optional()
      .map(|row| row.is_some())
      .unwrap_or(false)
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StorageError> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| StorageError::Unavailable(format!("Failed to parse datetime '{}': {}", s, e).into()))
}
