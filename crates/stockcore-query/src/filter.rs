use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use stockcore_index::{normalize, CatalogIndex, IndexedEntry};

use crate::RankedHit;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
    #[default]
    All,
    /// Holds the normalized category name.
    Only(String),
}

impl CategoryFilter {
    /// Blank input and the literal `all` select every category.
    pub fn parse(label: &str) -> Self {
        let normalized = normalize(label);
        if normalized.is_empty() || normalized == "all" {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(normalized)
        }
    }

    pub fn matches(&self, entry: &IndexedEntry) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => entry.normalized_category == *category,
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, CategoryFilter::All)
    }
}

/// Keeps the hits whose entry passes `filter`, preserving their order.
pub fn apply(index: &CatalogIndex, hits: &[RankedHit], filter: &CategoryFilter) -> Vec<RankedHit> {
    if filter.is_neutral() {
        return hits.to_vec();
    }

    hits.iter()
        .filter(|hit| {
            index
                .get(hit.position)
                .map(|entry| filter.matches(entry))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Distinct non-blank categories in first-seen catalog order, as spelled by
/// the first entry that used them.
pub fn categories(index: &CatalogIndex) -> Vec<String> {
    let mut seen = HashSet::new();
    index
        .entries()
        .iter()
        .filter(|entry| !entry.normalized_category.is_empty())
        .filter(|entry| seen.insert(entry.normalized_category.clone()))
        .filter_map(|entry| entry.entry.category.as_ref().map(|c| c.trim().to_string()))
        .collect()
}
