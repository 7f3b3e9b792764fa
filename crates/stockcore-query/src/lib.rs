use serde::{Deserialize, Serialize};
use stockcore_index::{CatalogIndex, IndexedEntry};

mod controller;
pub mod filter;
mod history;
pub mod rank;
pub mod suggest;

pub use controller::{QueryController, QueryState};
pub use filter::CategoryFilter;
pub use history::{HistoryStore, MemoryStore, SearchHistory, StoreError};
pub use rank::{rank, PreparedQuery, RankOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Name,
    Token,
    Brand,
    Category,
    Fuzzy,
}

/// One entry of a ranked (or browsed) result list. `position` indexes the
/// catalog the hit was computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub position: usize,
    pub score: f32,
    pub matched: Vec<MatchField>,
}

impl RankedHit {
    pub(crate) fn browse(position: usize) -> Self {
        Self {
            position,
            score: 0.0,
            matched: Vec::new(),
        }
    }

    pub fn resolve<'a>(&'a self, index: &'a CatalogIndex) -> Option<ScoredResult<'a>> {
        index.get(self.position).map(|entry| ScoredResult {
            entry,
            score: self.score,
            matched_fields: &self.matched,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredResult<'a> {
    pub entry: &'a IndexedEntry,
    pub score: f32,
    pub matched_fields: &'a [MatchField],
}
