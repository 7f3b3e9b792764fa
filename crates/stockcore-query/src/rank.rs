use std::collections::HashSet;

use stockcore_config::Settings;
use stockcore_index::{brands_in, normalize, CatalogIndex, IndexedEntry};

use crate::{MatchField, RankedHit};

// Each tier owns a band of scores; a band's ceiling (including the
// secondary bonus) stays below the floor of the tier above it.
const EXACT_SCORE: f32 = 7000.0;
const PREFIX_BASE: f32 = 6000.0;
const SUBSTRING_BASE: f32 = 5000.0;
const NAME_RATIO_SPAN: f32 = 500.0;
const TOKEN_BASE: f32 = 4000.0;
const TOKEN_CAP: f32 = 500.0;
const TOKEN_EQUALS: f32 = 150.0;
const TOKEN_STARTS_WITH: f32 = 100.0;
const TOKEN_CONTAINS: f32 = 50.0;
const BRAND_SCORE: f32 = 3000.0;
const CATEGORY_BASE: f32 = 2000.0;
const CATEGORY_EQUALS: f32 = 300.0;
const CATEGORY_STARTS_WITH: f32 = 200.0;
const CATEGORY_CONTAINS: f32 = 100.0;
const FUZZY_SPAN: f32 = 1000.0;

const SECONDARY_TOKEN_PER_WORD: f32 = 10.0;
const SECONDARY_BRAND: f32 = 40.0;
const SECONDARY_CATEGORY: f32 = 30.0;
const SECONDARY_CAP: f32 = 400.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RankOptions {
    pub min_query_len: usize,
    pub fuzzy_threshold: f32,
    pub fuzzy_min_query_len: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for RankOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            min_query_len: settings.min_query_len.max(1),
            fuzzy_threshold: settings.fuzzy_threshold,
            fuzzy_min_query_len: settings.fuzzy_min_query_len,
        }
    }
}

/// A query normalized once and reused against every entry.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub normalized: String,
    pub words: Vec<String>,
    pub brands: Vec<&'static str>,
    char_len: usize,
    distinct_chars: HashSet<char>,
}

impl PreparedQuery {
    pub fn new(raw: &str) -> Self {
        let normalized = normalize(raw);
        let words = normalized
            .split(' ')
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        let brands = brands_in(&normalized);
        let char_len = normalized.chars().count();
        let distinct_chars = normalized.chars().filter(|c| *c != ' ').collect();

        Self {
            normalized,
            words,
            brands,
            char_len,
            distinct_chars,
        }
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }
}

pub fn bypasses_ranking(query: &PreparedQuery, options: &RankOptions) -> bool {
    query.char_len < options.min_query_len.max(1)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NameMatch {
    Exact,
    Prefix(f32),
    Substring(f32),
}

fn name_match(query: &PreparedQuery, entry: &IndexedEntry) -> Option<NameMatch> {
    let name = entry.normalized_name.as_str();
    if name.is_empty() {
        return None;
    }

    let ratio = || query.char_len as f32 / name.chars().count() as f32;
    if name == query.normalized {
        Some(NameMatch::Exact)
    } else if name.starts_with(&query.normalized) {
        Some(NameMatch::Prefix(ratio()))
    } else if name.contains(&query.normalized) {
        Some(NameMatch::Substring(ratio()))
    } else {
        None
    }
}

/// Summed best per-word token score and the number of words that matched.
fn token_match(query: &PreparedQuery, entry: &IndexedEntry) -> (f32, usize) {
    let mut total = 0.0;
    let mut matched_words = 0;

    for word in &query.words {
        let allow_contains = word.chars().count() >= 2;
        let best = entry
            .name_tokens
            .iter()
            .map(|token| {
                if token == word {
                    TOKEN_EQUALS
                } else if token.starts_with(word.as_str()) {
                    TOKEN_STARTS_WITH
                } else if allow_contains && token.contains(word.as_str()) {
                    TOKEN_CONTAINS
                } else {
                    0.0
                }
            })
            .fold(0.0, f32::max);

        if best > 0.0 {
            total += best;
            matched_words += 1;
        }
    }

    (total.min(TOKEN_CAP), matched_words)
}

fn brand_match(query: &PreparedQuery, entry: &IndexedEntry) -> bool {
    query
        .brands
        .iter()
        .any(|brand| entry.brand_matches.contains(brand))
}

fn category_match(query: &PreparedQuery, entry: &IndexedEntry) -> f32 {
    let category = entry.normalized_category.as_str();
    if category.is_empty() {
        0.0
    } else if category == query.normalized {
        CATEGORY_EQUALS
    } else if category.starts_with(&query.normalized) {
        CATEGORY_STARTS_WITH
    } else if category.contains(&query.normalized) {
        CATEGORY_CONTAINS
    } else {
        0.0
    }
}

/// Dice coefficient of two distinct-character sets, spaces ignored.
fn char_dice(query: &HashSet<char>, text: &str) -> f32 {
    let chars: HashSet<char> = text.chars().filter(|c| *c != ' ').collect();
    let total = query.len() + chars.len();
    if total == 0 {
        return 0.0;
    }
    let shared = query.intersection(&chars).count();
    (2 * shared) as f32 / total as f32
}

/// Best similarity between the query and either the whole name or one of
/// its words. Both sides count, so a short query is not "covered" by a
/// long name that merely contains its letters.
fn char_overlap(query: &PreparedQuery, entry: &IndexedEntry) -> f32 {
    if query.distinct_chars.is_empty() {
        return 0.0;
    }
    entry
        .name_tokens
        .iter()
        .map(|token| char_dice(&query.distinct_chars, token))
        .fold(
            char_dice(&query.distinct_chars, &entry.normalized_name),
            f32::max,
        )
}

/// Tiered score of one entry. `None` means the entry does not match.
pub fn score_entry(
    query: &PreparedQuery,
    entry: &IndexedEntry,
    options: &RankOptions,
) -> Option<(f32, Vec<MatchField>)> {
    if query.normalized.is_empty() {
        return None;
    }

    let name = name_match(query, entry);
    let (token_score, token_words) = token_match(query, entry);
    let brand = brand_match(query, entry);
    let category = category_match(query, entry);

    let mut matched = Vec::new();
    let primary = if let Some(name) = name {
        matched.push(MatchField::Name);
        match name {
            NameMatch::Exact => EXACT_SCORE,
            NameMatch::Prefix(ratio) => PREFIX_BASE + NAME_RATIO_SPAN * ratio,
            NameMatch::Substring(ratio) => SUBSTRING_BASE + NAME_RATIO_SPAN * ratio,
        }
    } else if token_score > 0.0 {
        TOKEN_BASE + token_score
    } else if brand {
        BRAND_SCORE
    } else if category > 0.0 {
        CATEGORY_BASE + category
    } else {
        if query.char_len < options.fuzzy_min_query_len {
            return None;
        }
        let overlap = char_overlap(query, entry);
        if overlap <= options.fuzzy_threshold {
            return None;
        }
        return Some((FUZZY_SPAN * overlap, vec![MatchField::Fuzzy]));
    };

    let mut secondary = 0.0;
    if token_score > 0.0 {
        matched.push(MatchField::Token);
        if name.is_some() {
            secondary += SECONDARY_TOKEN_PER_WORD * token_words as f32;
        }
    }
    if brand {
        matched.push(MatchField::Brand);
        if name.is_some() || token_score > 0.0 {
            secondary += SECONDARY_BRAND;
        }
    }
    if category > 0.0 {
        matched.push(MatchField::Category);
        if name.is_some() || token_score > 0.0 || brand {
            secondary += SECONDARY_CATEGORY;
        }
    }

    Some((primary + secondary.min(SECONDARY_CAP), matched))
}

/// Scores the whole index. Short queries skip scoring and return every
/// entry in catalog order with a zero score.
pub fn rank(index: &CatalogIndex, raw_query: &str, options: &RankOptions) -> Vec<RankedHit> {
    let query = PreparedQuery::new(raw_query);
    if bypasses_ranking(&query, options) {
        return (0..index.len()).map(RankedHit::browse).collect();
    }

    let mut hits: Vec<RankedHit> = index
        .entries()
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            score_entry(&query, entry, options)
                .filter(|(score, _)| *score > 0.0)
                .map(|(score, matched)| RankedHit {
                    position,
                    score,
                    matched,
                })
        })
        .collect();

    // sort_by is stable: equal scores keep catalog order.
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockcore_index::{build_index, index_entry, CatalogEntry, CatalogSnapshot};

    fn shop_index() -> CatalogIndex {
        build_index(&CatalogSnapshot::new(vec![
            CatalogEntry::new(1, "Kabras Sugar 2kg").with_category("foods"),
            CatalogEntry::new(2, "Omo Detergent 1kg").with_category("homecare"),
        ]))
    }

    fn score(query: &str, name: &str) -> f32 {
        let entry = index_entry(&CatalogEntry::new(1, name));
        score_entry(&PreparedQuery::new(query), &entry, &RankOptions::default())
            .map(|(score, _)| score)
            .unwrap_or(0.0)
    }

    #[test]
    fn exact_beats_prefix_beats_substring() {
        let exact = score("sugar", "Sugar");
        let prefix = score("sugar", "Sugar Brown Loose");
        let substring = score("sugar", "Kabras Sugar");
        assert!(exact > prefix, "{} vs {}", exact, prefix);
        assert!(prefix > substring, "{} vs {}", prefix, substring);
    }

    #[test]
    fn exact_beats_substring_with_every_bonus() {
        let exact = score("omo", "omo");
        let loaded = score("omo", "Omo Omo Detergent Omo Washing Powder");
        assert!(exact > loaded);
    }

    #[test]
    fn longer_share_of_name_scores_higher_within_tier() {
        assert!(score("kabras sug", "Kabras Sugar") > score("kab", "Kabras Sugar"));
    }

    #[test]
    fn token_tier_beats_category_tier() {
        let entry_token =
            index_entry(&CatalogEntry::new(1, "Rice Pishori").with_category("grains"));
        let entry_category =
            index_entry(&CatalogEntry::new(2, "Basmati 5kg").with_category("rice grains"));
        let query = PreparedQuery::new("pishori rice");
        let options = RankOptions::default();
        let (token, fields) = score_entry(&query, &entry_token, &options).unwrap();
        assert!(fields.contains(&MatchField::Token));
        assert!(!fields.contains(&MatchField::Name));
        let category = score_entry(&PreparedQuery::new("rice"), &entry_category, &options)
            .unwrap()
            .0;
        assert!(token > category);
    }

    #[test]
    fn kabras_returns_only_the_sugar() {
        let index = shop_index();
        let hits = rank(&index, "kabras", &RankOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(index.get(hits[0].position).unwrap().entry.id.0, 1);
        assert!(hits[0].score >= PREFIX_BASE);
        assert!(hits[0].matched.contains(&MatchField::Name));
    }

    #[test]
    fn sugar_matches_by_token() {
        let index = shop_index();
        let hits = rank(&index, "sugar", &RankOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].position, 0);
        assert!(hits[0].matched.contains(&MatchField::Token));
    }

    #[test]
    fn omo_matches_by_brand_alias() {
        let index = shop_index();
        let hits = rank(&index, "omo", &RankOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(index.get(hits[0].position).unwrap().entry.id.0, 2);
        assert!(hits[0].matched.contains(&MatchField::Brand));
    }

    #[test]
    fn brand_variant_bridges_to_canonical_name() {
        let index = build_index(&CatalogSnapshot::new(vec![
            CatalogEntry::new(1, "Royco Beef Cubes"),
            CatalogEntry::new(2, "Salt 1kg"),
        ]));
        let hits = rank(&index, "mchuzi mix", &RankOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[0].matched, vec![MatchField::Brand]);
        assert_eq!(hits[0].score, BRAND_SCORE);
    }

    #[test]
    fn category_only_match() {
        let index = shop_index();
        let hits = rank(&index, "homecare", &RankOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched, vec![MatchField::Category]);
        assert_eq!(hits[0].score, CATEGORY_BASE + CATEGORY_EQUALS);
    }

    #[test]
    fn typo_falls_back_to_fuzzy() {
        let index = shop_index();
        let hits = rank(&index, "kabars", &RankOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].position, 0);
        assert_eq!(hits[0].matched, vec![MatchField::Fuzzy]);
        assert!(hits[0].score <= FUZZY_SPAN);
    }

    #[test]
    fn letters_scattered_over_a_long_name_are_not_a_typo() {
        let index = build_index(&CatalogSnapshot::new(vec![
            CatalogEntry::new(1, "Tomato Paste 400g"),
            CatalogEntry::new(2, "Mumias Sugar 1kg"),
            CatalogEntry::new(3, "Kimbo 1kg"),
        ]));
        assert!(rank(&index, "tea", &RankOptions::default()).is_empty());
        assert!(rank(&index, "kabras", &RankOptions::default()).is_empty());
        assert!(rank(&index, "omo", &RankOptions::default()).is_empty());
    }

    #[test]
    fn fuzzy_threshold_is_exclusive() {
        let entry = index_entry(&CatalogEntry::new(1, "Sugar"));
        let query = PreparedQuery::new("sugr");
        let overlap = char_overlap(&query, &entry);
        assert!(overlap > 0.8);

        let at_overlap = RankOptions {
            fuzzy_threshold: overlap,
            ..RankOptions::default()
        };
        assert!(score_entry(&query, &entry, &at_overlap).is_none());
        let (score, fields) = score_entry(&query, &entry, &RankOptions::default()).unwrap();
        assert_eq!(fields, vec![MatchField::Fuzzy]);
        assert_eq!(score, FUZZY_SPAN * overlap);
    }

    #[test]
    fn fuzzy_needs_three_chars() {
        let index = build_index(&CatalogSnapshot::new(vec![CatalogEntry::new(1, "ab")]));
        assert!(rank(&index, "ba", &RankOptions::default()).is_empty());
    }

    #[test]
    fn empty_query_returns_catalog_order() {
        let index = shop_index();
        let hits = rank(&index, "   ", &RankOptions::default());
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![0, 1]);
        assert!(hits.iter().all(|h| h.score == 0.0 && h.matched.is_empty()));
    }

    #[test]
    fn higher_min_length_bypasses_short_queries() {
        let index = shop_index();
        let options = RankOptions {
            min_query_len: 3,
            ..RankOptions::default()
        };
        let hits = rank(&index, "om", &options);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].position, 0);
    }

    #[test]
    fn equal_scores_keep_catalog_order() {
        let index = build_index(&CatalogSnapshot::new(vec![
            CatalogEntry::new(10, "Bread White"),
            CatalogEntry::new(11, "Maize Flour"),
            CatalogEntry::new(12, "Bread White"),
            CatalogEntry::new(13, "Bread Brown"),
        ]));
        let hits = rank(&index, "bread", &RankOptions::default());
        let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
        assert_eq!(positions, vec![0, 2, 3]);
        assert_eq!(hits[0].score, hits[1].score);
        assert_eq!(hits[1].score, hits[2].score);
    }

    #[test]
    fn malformed_entries_never_match() {
        let index = build_index(&CatalogSnapshot::new(vec![
            CatalogEntry::new(1, ""),
            CatalogEntry::new(2, "Tea Leaves"),
        ]));
        let hits = rank(&index, "tea", &RankOptions::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].position, 1);
    }

    #[test]
    fn ranked_output_is_positive_and_descending() {
        let index = build_index(&CatalogSnapshot::new(vec![
            CatalogEntry::new(1, "Tea Leaves").with_category("beverages"),
            CatalogEntry::new(2, "Ketepa Pride Tea"),
            CatalogEntry::new(3, "tea"),
            CatalogEntry::new(4, "Sugar"),
            CatalogEntry::new(5, "Milk").with_category("tea supplies"),
        ]));
        let hits = rank(&index, "tea", &RankOptions::default());
        assert!(hits.iter().all(|h| h.score > 0.0));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(hits[0].position, 2);
        assert!(!hits.iter().any(|h| h.position == 3));
    }
}
