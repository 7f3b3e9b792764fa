use std::sync::Arc;
use std::time::Instant;

use crate::brands::brands_in;
use crate::normalize::{normalize, tokenize};
use crate::{CatalogEntry, CatalogSnapshot, SnapshotId};

#[derive(Debug, Clone)]
pub struct IndexedEntry {
    pub entry: CatalogEntry,
    pub normalized_name: String,
    pub name_tokens: Vec<String>,
    pub normalized_category: String,
    pub category_tokens: Vec<String>,
    pub brand_matches: Vec<&'static str>,
}

impl IndexedEntry {
    pub fn is_malformed(&self) -> bool {
        self.normalized_name.is_empty()
    }
}

/// Derived search fields for every entry of one snapshot, same order and count.
#[derive(Debug)]
pub struct CatalogIndex {
    snapshot: SnapshotId,
    entries: Vec<IndexedEntry>,
    malformed: usize,
}

impl CatalogIndex {
    pub fn snapshot(&self) -> SnapshotId {
        self.snapshot
    }

    pub fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&IndexedEntry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn malformed(&self) -> usize {
        self.malformed
    }

    pub fn position_of(&self, id: crate::EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.entry.id == id)
    }
}

pub fn index_entry(entry: &CatalogEntry) -> IndexedEntry {
    let normalized_name = normalize(&entry.name);
    let name_tokens = tokenize(&normalized_name);
    let normalized_category = entry.category.as_deref().map(normalize).unwrap_or_default();
    let category_tokens = tokenize(&normalized_category);
    let brand_matches = brands_in(&normalized_name);

    IndexedEntry {
        entry: entry.clone(),
        normalized_name,
        name_tokens,
        normalized_category,
        category_tokens,
        brand_matches,
    }
}

pub fn build_index(snapshot: &CatalogSnapshot) -> CatalogIndex {
    let t0 = Instant::now();
    let entries: Vec<IndexedEntry> = snapshot.entries().iter().map(index_entry).collect();
    let malformed = entries.iter().filter(|e| e.is_malformed()).count();

    if malformed > 0 {
        tracing::warn!(
            snapshot = %snapshot.id(),
            malformed,
            "catalog entries without a usable name were indexed with no tokens"
        );
    }
    tracing::info!(
        snapshot = %snapshot.id(),
        entries = entries.len(),
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "catalog index built"
    );

    CatalogIndex {
        snapshot: snapshot.id(),
        entries,
        malformed,
    }
}

/// Builds at most one index per snapshot id and hands out the shared result.
#[derive(Debug, Default)]
pub struct CatalogIndexer {
    current: Option<Arc<CatalogIndex>>,
    builds: u64,
}

impl CatalogIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&mut self, snapshot: &CatalogSnapshot) -> Arc<CatalogIndex> {
        if let Some(current) = &self.current {
            if current.snapshot() == snapshot.id() {
                return Arc::clone(current);
            }
        }

        let index = Arc::new(build_index(snapshot));
        self.builds += 1;
        self.current = Some(Arc::clone(&index));
        index
    }

    pub fn current(&self) -> Option<&Arc<CatalogIndex>> {
        self.current.as_ref()
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }

    pub fn builds(&self) -> u64 {
        self.builds
    }
}
