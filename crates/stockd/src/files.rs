use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use stockcore_index::{CatalogEntry, CatalogError, CatalogSource};
use stockcore_query::{HistoryStore, StoreError};

const APP_DIR: &str = "stockfind";
const HISTORY_FILE: &str = "history.json";

/// Catalog source reading a JSON array of entries from disk.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for JsonFileCatalog {
    fn load_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| CatalogError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|err| {
            CatalogError::Malformed(format!("{}: {}", self.path.display(), err))
        })
    }
}

/// History store keeping every key's list in one JSON object file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<local data dir>/stockfind/history.json`.
    pub fn in_data_dir() -> Result<Self, StoreError> {
        let base = dirs::data_local_dir()
            .ok_or_else(|| StoreError::Unavailable("no local data directory".to_string()))?;
        Ok(Self::open(base.join(APP_DIR).join(HISTORY_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self, key: &str) -> Result<BTreeMap<String, Vec<String>>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    key: key.to_string(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|err| StoreError::Corrupt {
            key: key.to_string(),
            reason: err.to_string(),
        })
    }
}

impl HistoryStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.read_all(key)?.remove(key).unwrap_or_default())
    }

    fn set(&mut self, key: &str, values: &[String]) -> Result<(), StoreError> {
        let mut lists = match self.read_all(key) {
            Ok(lists) => lists,
            Err(StoreError::Corrupt { reason, .. }) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %reason,
                    "replacing corrupt history file"
                );
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        lists.insert(key.to_string(), values.to_vec());

        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(&lists).map_err(|err| StoreError::Corrupt {
            key: key.to_string(),
            reason: err.to_string(),
        })?;
        std::fs::write(&self.path, content).map_err(io_err)
    }
}
