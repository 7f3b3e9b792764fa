use std::collections::HashSet;

use stockcore_index::{normalize, CatalogIndex, BRAND_ALIASES};

/// Completions for a partially typed term, merged from the brand dictionary,
/// catalog name fragments, category names and history. Ordered by where the
/// term occurs in the candidate, then by length. An empty term yields the
/// most recent history.
pub fn suggest(
    term: &str,
    index: Option<&CatalogIndex>,
    history: &[String],
    limit: usize,
) -> Vec<String> {
    let needle = normalize(term);
    if needle.is_empty() {
        return history.iter().take(limit).cloned().collect();
    }

    let mut seen = HashSet::new();
    let mut candidates: Vec<(usize, usize, String)> = Vec::new();
    // `key` is the normalized form used for matching and dedup.
    let mut offer = |key: &str, candidate: &str| {
        let Some(position) = key.find(&needle) else {
            return;
        };
        if seen.insert(key.to_string()) {
            candidates.push((position, candidate.chars().count(), candidate.to_string()));
        }
    };

    // Alias forms and name tokens are stored normalized.
    for alias in BRAND_ALIASES {
        alias.forms().for_each(|form| offer(form, form));
    }

    if let Some(index) = index {
        for entry in index.entries() {
            for token in &entry.name_tokens {
                offer(token, token);
            }
            if let Some(category) = entry.entry.category.as_deref() {
                offer(&normalize(category), category.trim());
            }
        }
    }

    for entry in history {
        offer(&normalize(entry), entry);
    }

    candidates.sort_by_key(|(position, len, _)| (*position, *len));
    candidates
        .into_iter()
        .take(limit)
        .map(|(_, _, candidate)| candidate)
        .collect()
}
