use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_KEY: &str = "catalog-search-history";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub debounce_ms: u64,
    pub history_key: String,
    pub history_limit: usize,
    pub min_history_term_len: usize,
    pub min_query_len: usize,
    pub suggestion_limit: usize,
    pub fuzzy_threshold: f32,
    pub fuzzy_min_query_len: usize,
    pub item_size: f32,
    pub overscan: usize,
    pub blank_row_batch: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            history_key: DEFAULT_HISTORY_KEY.to_string(),
            history_limit: 10,
            min_history_term_len: 3,
            min_query_len: 1,
            suggestion_limit: 8,
            fuzzy_threshold: 0.8,
            fuzzy_min_query_len: 3,
            item_size: 280.0,
            overscan: 5,
            blank_row_batch: 10,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings from {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl Settings {
    /// Reads settings from a JSON file. A missing file yields the defaults;
    /// keys absent from the file keep their default values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings: Settings =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.item_size <= 0.0 || !self.item_size.is_finite() {
            return Err(ConfigError::Invalid {
                field: "item_size",
                reason: format!("must be a positive number, got {}", self.item_size),
            });
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "history_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.fuzzy_threshold <= 0.0 || self.fuzzy_threshold >= 1.0 {
            return Err(ConfigError::Invalid {
                field: "fuzzy_threshold",
                reason: format!("must be in (0, 1), got {}", self.fuzzy_threshold),
            });
        }
        if self.history_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "history_key",
                reason: "must not be blank".to_string(),
            });
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.debounce(), Duration::from_millis(200));
        assert_eq!(settings.history_limit, 10);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "debounce_ms": 150, "overscan": 2 }"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.debounce_ms, 150);
        assert_eq!(settings.overscan, 2);
        assert_eq!(settings.suggestion_limit, 8);
    }

    #[test]
    fn rejects_zero_item_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "item_size": 0 }"#).unwrap();

        match Settings::load(&path) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "item_size"),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
