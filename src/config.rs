use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage, NoopStorage, SqliteStorage};
use crate::transport::ApiConfig;

/// Environment variable holding the bearer token.
pub const API_TOKEN_VAR: &str = "LOADSTATE_API_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiSection,
  #[serde(default)]
  pub storage: StorageSection,
  #[serde(default)]
  pub pagination: PaginationSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSection {
  pub base_url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Sent with every request unless an endpoint overrides them
  #[serde(default)]
  pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSection {
  #[serde(default)]
  pub backend: StorageBackend,
  /// Overrides the backend's default location
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
  /// Process-local, lost on exit
  Memory,
  /// One JSON file per key
  File,
  /// Single database file
  #[default]
  Sqlite,
  /// Never stores anything
  None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationSection {
  #[serde(default = "default_page_size")]
  pub page_size: usize,
}

impl Default for PaginationSection {
  fn default() -> Self {
    Self {
      page_size: default_page_size(),
    }
  }
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_page_size() -> usize {
  20
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./loadstate.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/loadstate/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/loadstate/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("loadstate.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("loadstate").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.pagination.page_size == 0 {
      return Err(eyre!("pagination.page_size must be at least 1"));
    }
    Ok(config)
  }

  /// Get the API token from the environment, if set.
  pub fn get_api_token() -> Option<String> {
    std::env::var(API_TOKEN_VAR).ok().filter(|t| !t.trim().is_empty())
  }

  /// Client settings, with the bearer token injected when one is available.
  pub fn api_config(&self, token: Option<&str>) -> Result<ApiConfig> {
    let base_url = Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid api.base_url {}: {}", self.api.base_url, e))?;

    let mut config =
      ApiConfig::new(base_url).with_timeout(Duration::from_secs(self.api.timeout_secs));
    for (name, value) in &self.api.headers {
      config = config.with_header(name, value);
    }
    if let Some(token) = token {
      config = config.with_header("Authorization", format!("Bearer {}", token));
    }

    Ok(config)
  }

  /// Open the configured storage backend.
  pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStorage>> {
    let path = self.storage.path.as_deref();

    let storage: Arc<dyn KeyValueStorage> = match self.storage.backend {
      StorageBackend::Memory => Arc::new(MemoryStorage::new()),
      StorageBackend::None => Arc::new(NoopStorage),
      StorageBackend::File => Arc::new(match path {
        Some(p) => FileStorage::open(p)?,
        None => FileStorage::open_default()?,
      }),
      StorageBackend::Sqlite => Arc::new(match path {
        Some(p) => SqliteStorage::open(p)?,
        None => SqliteStorage::open_default()?,
      }),
    };

    Ok(storage)
  }

  /// Directory for log files.
  pub fn log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("loadstate").join("logs"))
  }
}
