use std::collections::HashMap;

use stockcore_index::normalize;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("history store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to access history key `{key}`")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("stored history for `{key}` is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Small key-value storage for bounded, ordered string lists.
pub trait HistoryStore: Send {
    fn get(&self, key: &str) -> Result<Vec<String>, StoreError>;
    fn set(&mut self, key: &str, values: &[String]) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(key: &str, values: &[&str]) -> Self {
        let mut store = Self::default();
        store
            .lists
            .insert(key.to_string(), values.iter().map(|v| v.to_string()).collect());
        store
    }
}

impl HistoryStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.lists.get(key).cloned().unwrap_or_default())
    }

    fn set(&mut self, key: &str, values: &[String]) -> Result<(), StoreError> {
        self.lists.insert(key.to_string(), values.to_vec());
        Ok(())
    }
}

/// Most-recent-first list of accepted search terms, bounded and free of
/// duplicates (compared in normalized form), mirrored into a store.
pub struct SearchHistory {
    entries: Vec<String>,
    key: String,
    limit: usize,
    min_term_len: usize,
    store: Box<dyn HistoryStore>,
}

impl SearchHistory {
    pub fn load(
        store: Box<dyn HistoryStore>,
        key: &str,
        limit: usize,
        min_term_len: usize,
    ) -> Self {
        let stored = match store.get(key) {
            Ok(values) => values,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to load search history");
                Vec::new()
            }
        };

        let mut history = Self {
            entries: Vec::with_capacity(limit),
            key: key.to_string(),
            limit: limit.max(1),
            min_term_len,
            store,
        };
        for value in stored {
            let term = value.trim();
            if !term.is_empty()
                && !history.contains(term)
                && history.entries.len() < history.limit
            {
                history.entries.push(term.to_string());
            }
        }
        history
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn contains(&self, term: &str) -> bool {
        let needle = normalize(term);
        self.entries.iter().any(|entry| normalize(entry) == needle)
    }

    /// Pushes `term` to the front if it is long enough and not already
    /// present. Returns whether the list changed.
    pub fn record(&mut self, term: &str) -> bool {
        let term = term.trim();
        if normalize(term).chars().count() < self.min_term_len || self.contains(term) {
            return false;
        }

        self.entries.insert(0, term.to_string());
        self.entries.truncate(self.limit);
        self.persist();
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    pub fn store(&self) -> &dyn HistoryStore {
        self.store.as_ref()
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.set(&self.key, &self.entries) {
            tracing::warn!(key = %self.key, error = %err, "failed to persist search history");
        }
    }
}

impl std::fmt::Debug for SearchHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchHistory")
            .field("entries", &self.entries)
            .field("key", &self.key)
            .field("limit", &self.limit)
            .finish()
    }
}
