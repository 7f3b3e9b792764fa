use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

pub mod brands;
mod indexer;
mod normalize;

pub use brands::{brands_in, BrandAlias, BRAND_ALIASES};
pub use indexer::{build_index, index_entry, CatalogIndex, CatalogIndexer, IndexedEntry};
pub use normalize::{normalize, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One product template as supplied by the catalog source. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: EntryId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "imageRef")]
    pub image_ref: Option<String>,
}

impl CatalogEntry {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: EntryId(id),
            name: name.into(),
            category: None,
            image_ref: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotId(u64);

impl SnapshotId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SnapshotId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snapshot-{}", self.0)
    }
}

/// A full catalog load. Two snapshots with different ids are never merged,
/// even when their entries are equal.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    id: SnapshotId,
    entries: Vec<CatalogEntry>,
}

impl CatalogSnapshot {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            id: SnapshotId::next(),
            entries,
        }
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog source unavailable: {0}")]
    Unavailable(String),
    #[error("catalog data is malformed: {0}")]
    Malformed(String),
    #[error("failed to read catalog from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait CatalogSource {
    fn load_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogError>;
}

#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub entries: Vec<CatalogEntry>,
    pub next_cursor: Option<String>,
}

pub trait PagedCatalogSource {
    fn load_page(&self, cursor: Option<&str>) -> Result<CatalogPage, CatalogError>;
}

/// Drains a paged source in order into one list.
pub fn load_all_pages(source: &dyn PagedCatalogSource) -> Result<Vec<CatalogEntry>, CatalogError> {
    let mut entries = Vec::new();
    let mut seen_cursors = HashSet::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = source.load_page(cursor.as_deref())?;
        entries.extend(page.entries);

        match page.next_cursor {
            Some(next) => {
                if !seen_cursors.insert(next.clone()) {
                    return Err(CatalogError::Malformed(format!(
                        "page cursor `{}` repeated",
                        next
                    )));
                }
                cursor = Some(next);
            }
            None => break,
        }
    }

    tracing::debug!(
        entries = entries.len(),
        pages = seen_cursors.len() + 1,
        "paged catalog drained"
    );
    Ok(entries)
}

/// Adapts a paged source to the full-snapshot interface.
pub struct Paged<S>(pub S);

impl<S: PagedCatalogSource> CatalogSource for Paged<S> {
    fn load_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        load_all_pages(&self.0)
    }
}
