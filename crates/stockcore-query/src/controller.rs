use std::sync::Arc;
use std::time::{Duration, Instant};

use stockcore_config::Settings;
use stockcore_index::{normalize, CatalogEntry, CatalogIndex, EntryId, SnapshotId};

use crate::filter::{self, CategoryFilter};
use crate::history::{HistoryStore, SearchHistory};
use crate::rank::{rank, RankOptions};
use crate::suggest::suggest;
use crate::{RankedHit, ScoredResult};

#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub raw_term: String,
    pub debounced_term: String,
    pub category_filter: CategoryFilter,
    pub history: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone)]
struct PendingTerm {
    term: String,
    due_at: Instant,
    token: u64,
}

#[derive(Debug)]
struct RankedCache {
    snapshot: SnapshotId,
    /// Normalized form of the term the hits were ranked for.
    query: String,
    hits: Vec<RankedHit>,
}

/// Owns the query state and drives rank → filter whenever an accepted
/// transition needs it.
#[derive(Debug)]
pub struct QueryController {
    options: RankOptions,
    debounce: Duration,
    suggestion_limit: usize,
    raw_term: String,
    debounced_term: String,
    category_filter: CategoryFilter,
    suggestions: Vec<String>,
    history: SearchHistory,
    pending: Option<PendingTerm>,
    edit_token: u64,
    index: Option<Arc<CatalogIndex>>,
    load_error: Option<String>,
    ranked: Option<RankedCache>,
    results: Vec<RankedHit>,
    rank_runs: u64,
}

impl QueryController {
    pub fn new(settings: &Settings, store: Box<dyn HistoryStore>) -> Self {
        let history = SearchHistory::load(
            store,
            &settings.history_key,
            settings.history_limit,
            settings.min_history_term_len,
        );
        let mut controller = Self {
            options: RankOptions::from(settings),
            debounce: settings.debounce(),
            suggestion_limit: settings.suggestion_limit,
            raw_term: String::new(),
            debounced_term: String::new(),
            category_filter: CategoryFilter::All,
            suggestions: Vec::new(),
            history,
            pending: None,
            edit_token: 0,
            index: None,
            load_error: None,
            ranked: None,
            results: Vec::new(),
            rank_runs: 0,
        };
        controller.refresh_suggestions();
        controller
    }

    pub fn set_index(&mut self, index: Arc<CatalogIndex>) {
        self.index = Some(index);
        self.load_error = None;
        self.recompute();
        self.refresh_suggestions();
    }

    /// Records a catalog load failure. Results are cleared so the surface
    /// renders the error, not a stale list.
    pub fn set_load_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        tracing::error!(error = %error, "catalog load failed");
        self.index = None;
        self.ranked = None;
        self.results.clear();
        self.load_error = Some(error);
        self.refresh_suggestions();
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn index(&self) -> Option<&Arc<CatalogIndex>> {
        self.index.as_ref()
    }

    /// Echoes the raw term at once and schedules its acceptance after the
    /// debounce delay. Any earlier pending term is superseded.
    pub fn set_term(&mut self, term: impl Into<String>, now: Instant) {
        self.raw_term = term.into();
        self.edit_token = self.edit_token.wrapping_add(1);
        self.pending = Some(PendingTerm {
            term: self.raw_term.clone(),
            due_at: now + self.debounce,
            token: self.edit_token,
        });
        self.refresh_suggestions();
    }

    /// Accepts the pending term once it is due. Returns whether results
    /// changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(pending) = self.pending.as_ref() else {
            return false;
        };
        if pending.token != self.edit_token {
            self.pending = None;
            return false;
        }
        if now < pending.due_at {
            return false;
        }

        match self.pending.take() {
            Some(pending) => self.accept(pending.term),
            None => false,
        }
    }

    /// Accepts the pending term immediately.
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) if pending.token == self.edit_token => self.accept(pending.term),
            _ => false,
        }
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due_at)
    }

    pub fn is_searching(&self) -> bool {
        self.pending.is_some()
    }

    /// Re-filters the current ranking; never re-ranks.
    pub fn set_category_filter(&mut self, filter: CategoryFilter) -> bool {
        if filter == self.category_filter {
            return false;
        }
        self.category_filter = filter;
        self.refilter();
        true
    }

    /// Resets term and category together with a single recompute.
    pub fn clear_filters(&mut self) {
        self.edit_token = self.edit_token.wrapping_add(1);
        self.pending = None;
        self.raw_term.clear();
        self.debounced_term.clear();
        self.category_filter = CategoryFilter::All;
        self.recompute();
        self.refresh_suggestions();
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.refresh_suggestions();
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    pub fn raw_term(&self) -> &str {
        &self.raw_term
    }

    pub fn debounced_term(&self) -> &str {
        &self.debounced_term
    }

    pub fn category_filter(&self) -> &CategoryFilter {
        &self.category_filter
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn state(&self) -> QueryState {
        QueryState {
            raw_term: self.raw_term.clone(),
            debounced_term: self.debounced_term.clone(),
            category_filter: self.category_filter.clone(),
            history: self.history.entries().to_vec(),
            suggestions: self.suggestions.clone(),
        }
    }

    pub fn results(&self) -> &[RankedHit] {
        &self.results
    }

    pub fn scored_results(&self) -> Vec<ScoredResult<'_>> {
        let Some(index) = self.index.as_deref() else {
            return Vec::new();
        };
        self.results
            .iter()
            .filter_map(|hit| hit.resolve(index))
            .collect()
    }

    pub fn entry(&self, id: EntryId) -> Option<&CatalogEntry> {
        let index = self.index.as_deref()?;
        index.position_of(id).and_then(|p| index.get(p)).map(|e| &e.entry)
    }

    pub fn rank_runs(&self) -> u64 {
        self.rank_runs
    }

    /// Terms that differ only in case or spacing rank identically, so they
    /// replace the accepted text without another rank pass.
    fn accept(&mut self, term: String) -> bool {
        if normalize(&term) == normalize(&self.debounced_term) {
            self.debounced_term = term;
            return false;
        }

        self.debounced_term = term;
        if self.history.record(&self.debounced_term) {
            self.refresh_suggestions();
        }
        self.recompute();
        tracing::debug!(
            term = %self.debounced_term,
            results = self.results.len(),
            "search term accepted"
        );
        true
    }

    fn recompute(&mut self) {
        let Some(index) = self.index.clone() else {
            self.results.clear();
            return;
        };

        let query = normalize(&self.debounced_term);
        let stale = match &self.ranked {
            Some(cache) => cache.snapshot != index.snapshot() || cache.query != query,
            None => true,
        };
        if stale {
            let hits = rank(&index, &self.debounced_term, &self.options);
            self.rank_runs += 1;
            self.ranked = Some(RankedCache {
                snapshot: index.snapshot(),
                query,
                hits,
            });
        }
        self.refilter();
    }

    fn refilter(&mut self) {
        self.results = match (self.index.as_deref(), &self.ranked) {
            (Some(index), Some(cache)) if cache.snapshot == index.snapshot() => {
                filter::apply(index, &cache.hits, &self.category_filter)
            }
            _ => Vec::new(),
        };
    }

    fn refresh_suggestions(&mut self) {
        self.suggestions = suggest(
            &self.raw_term,
            self.index.as_deref(),
            self.history.entries(),
            self.suggestion_limit,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryStore;
    use stockcore_index::{build_index, CatalogSnapshot};

    fn catalog() -> Arc<CatalogIndex> {
        Arc::new(build_index(&CatalogSnapshot::new(vec![
            CatalogEntry::new(1, "Kabras Sugar 2kg").with_category("foods"),
            CatalogEntry::new(2, "Omo Detergent 1kg").with_category("homecare"),
            CatalogEntry::new(3, "Mumias Sugar 1kg").with_category("foods"),
        ])))
    }

    fn controller() -> QueryController {
        let mut controller =
            QueryController::new(&Settings::default(), Box::new(MemoryStore::new()));
        controller.set_index(catalog());
        controller
    }

    fn ids(controller: &QueryController) -> Vec<u64> {
        controller
            .scored_results()
            .iter()
            .map(|r| r.entry.entry.id.0)
            .collect()
    }

    #[test]
    fn raw_term_echoes_before_debounce() {
        let mut controller = controller();
        let t0 = Instant::now();
        controller.set_term("omo", t0);

        assert_eq!(controller.raw_term(), "omo");
        assert_eq!(controller.debounced_term(), "");
        assert!(controller.is_searching());
        assert!(!controller.poll(t0 + Duration::from_millis(100)));
        assert_eq!(ids(&controller), vec![1, 2, 3]);

        assert!(controller.poll(t0 + Duration::from_millis(200)));
        assert_eq!(controller.debounced_term(), "omo");
        assert!(!controller.is_searching());
        assert_eq!(ids(&controller), vec![2]);
    }

    #[test]
    fn only_latest_term_is_accepted() {
        let mut controller = controller();
        let t0 = Instant::now();
        controller.set_term("k", t0);
        controller.set_term("ka", t0 + Duration::from_millis(50));
        controller.set_term("omo", t0 + Duration::from_millis(100));

        // Due time of the first keystroke has passed, but it was superseded.
        assert!(!controller.poll(t0 + Duration::from_millis(250)));
        assert_eq!(controller.debounced_term(), "");

        assert!(controller.poll(t0 + Duration::from_millis(300)));
        assert_eq!(controller.debounced_term(), "omo");
        assert_eq!(controller.rank_runs(), 2);
    }

    #[test]
    fn unchanged_debounced_term_does_not_rerank() {
        let mut controller = controller();
        let t0 = Instant::now();
        controller.set_term("sugar", t0);
        controller.flush();
        let runs = controller.rank_runs();

        controller.set_term("sugar", t0 + Duration::from_millis(10));
        assert!(!controller.flush());
        assert_eq!(controller.rank_runs(), runs);
    }

    #[test]
    fn case_and_spacing_changes_do_not_rerank() {
        let mut controller = controller();
        let t0 = Instant::now();
        controller.set_term("sugar", t0);
        controller.flush();
        let runs = controller.rank_runs();

        controller.set_term("  Sugar ", t0 + Duration::from_millis(10));
        assert!(!controller.flush());
        assert_eq!(controller.debounced_term(), "  Sugar ");
        assert_eq!(controller.rank_runs(), runs);
        assert_eq!(ids(&controller), vec![1, 3]);
        assert_eq!(controller.history().entries(), ["sugar"]);
    }

    #[test]
    fn category_filter_refilters_without_ranking() {
        let mut controller = controller();
        controller.set_term("sugar", Instant::now());
        controller.flush();
        let runs = controller.rank_runs();

        assert!(controller.set_category_filter(CategoryFilter::parse("homecare")));
        assert!(ids(&controller).is_empty());
        assert!(controller.set_category_filter(CategoryFilter::parse("foods")));
        assert_eq!(ids(&controller), vec![1, 3]);
        assert!(!controller.set_category_filter(CategoryFilter::parse("Foods")));
        assert_eq!(controller.rank_runs(), runs);
    }

    #[test]
    fn clear_filters_resets_everything_at_once() {
        let mut controller = controller();
        let t0 = Instant::now();
        controller.set_term("sugar", t0);
        controller.flush();
        controller.set_category_filter(CategoryFilter::parse("foods"));
        controller.set_term("sugar b", t0);

        controller.clear_filters();
        assert_eq!(controller.raw_term(), "");
        assert_eq!(controller.debounced_term(), "");
        assert!(controller.category_filter().is_neutral());
        assert!(!controller.is_searching());
        assert!(!controller.poll(t0 + Duration::from_secs(5)));
        assert_eq!(ids(&controller), vec![1, 2, 3]);
    }

    #[test]
    fn accepted_terms_feed_history() {
        let mut controller = controller();
        let t0 = Instant::now();
        for term in ["su", "sugar", "omo", "sugar"] {
            controller.set_term(term, t0);
            controller.flush();
        }
        assert_eq!(controller.history().entries(), ["omo", "sugar"]);
        assert_eq!(
            controller
                .history()
                .store()
                .get(&Settings::default().history_key)
                .unwrap(),
            vec!["omo", "sugar"]
        );
    }

    #[test]
    fn new_snapshot_discards_stale_ranking() {
        let mut controller = controller();
        controller.set_term("sugar", Instant::now());
        controller.flush();
        assert_eq!(ids(&controller), vec![1, 3]);

        controller.set_index(Arc::new(build_index(&CatalogSnapshot::new(vec![
            CatalogEntry::new(9, "Brown Sugar"),
        ]))));
        assert_eq!(ids(&controller), vec![9]);
    }

    #[test]
    fn load_error_is_distinct_from_no_results() {
        let mut controller = controller();
        controller.set_term("zzzz", Instant::now());
        controller.flush();
        assert!(controller.results().is_empty());
        assert!(controller.load_error().is_none());

        controller.set_load_error("source offline");
        assert!(controller.results().is_empty());
        assert_eq!(controller.load_error(), Some("source offline"));

        controller.set_index(catalog());
        assert!(controller.load_error().is_none());
    }

    #[test]
    fn suggestions_follow_raw_term() {
        let mut controller = controller();
        controller.set_term("omo", Instant::now());
        assert_eq!(controller.suggestions().first().map(String::as_str), Some("omo"));
        assert_eq!(controller.state().raw_term, "omo");
    }

    #[test]
    fn entry_lookup_by_id() {
        let controller = controller();
        assert_eq!(
            controller.entry(EntryId(2)).map(|e| e.name.as_str()),
            Some("Omo Detergent 1kg")
        );
        assert!(controller.entry(EntryId(42)).is_none());
    }
}
