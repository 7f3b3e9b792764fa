use std::time::Instant;

use serde::Serialize;
use stockcore_config::{ConfigError, Settings};
use stockcore_index::{
    CatalogEntry, CatalogError, CatalogIndexer, CatalogSnapshot, CatalogSource, EntryId,
};
use stockcore_query::{CategoryFilter, HistoryStore, MatchField, QueryController};
use stockcore_sheet::{ProductDraft, RowEdit, RowId, SelectOutcome, SelectionSync, Sheet, SheetRow};
use stockcore_view::{ScrollRequest, ScrollSurface, SurfaceError, Windower};

/// One rendered result card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleProduct {
    /// Index in the current result list.
    pub index: usize,
    pub offset: f32,
    pub column: usize,
    pub entry: CatalogEntry,
    pub score: f32,
    pub matched: Vec<MatchField>,
    pub selected: bool,
}

/// Everything a surface needs to paint one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub raw_term: String,
    pub visible: Vec<VisibleProduct>,
    pub total_extent: f32,
    pub result_count: usize,
    pub suggestions: Vec<String>,
    pub history: Vec<String>,
    pub is_searching: bool,
    pub error: Option<String>,
}

pub struct SearchSession {
    indexer: CatalogIndexer,
    snapshot: Option<CatalogSnapshot>,
    query: QueryController,
    windower: Windower,
    sheet: Sheet,
    selection: SelectionSync,
}

impl SearchSession {
    pub fn new(settings: &Settings, store: Box<dyn HistoryStore>) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            indexer: CatalogIndexer::new(),
            snapshot: None,
            query: QueryController::new(settings, store),
            windower: Windower::new(settings.item_size, settings.overscan),
            sheet: Sheet::with_blank_rows(settings.blank_row_batch),
            selection: SelectionSync::new(),
        })
    }

    /// Replaces the catalog. On failure the previous results are dropped and
    /// the error is carried in every following frame until a load succeeds.
    pub fn load_catalog(&mut self, source: &dyn CatalogSource) -> Result<usize, CatalogError> {
        match source.load_catalog() {
            Ok(entries) => {
                let snapshot = CatalogSnapshot::new(entries);
                let index = self.indexer.index(&snapshot);
                let count = snapshot.len();
                self.snapshot = Some(snapshot);
                self.query.set_index(index);
                self.windower.invalidate();
                Ok(count)
            }
            Err(err) => {
                self.snapshot = None;
                self.indexer.invalidate();
                self.query.set_load_error(err.to_string());
                self.windower.invalidate();
                Err(err)
            }
        }
    }

    /// Re-indexes the loaded snapshot. A no-op unless the index was dropped.
    pub fn reindex(&mut self) {
        if let Some(snapshot) = &self.snapshot {
            let index = self.indexer.index(snapshot);
            self.query.set_index(index);
            self.windower.invalidate();
        }
    }

    pub fn on_query_change(&mut self, term: impl Into<String>, now: Instant) {
        self.query.set_term(term, now);
    }

    /// Accepts a pending term without waiting for the debounce delay.
    pub fn flush(&mut self) -> bool {
        let changed = self.query.flush();
        if changed {
            self.windower.invalidate();
        }
        changed
    }

    pub fn on_category_change(&mut self, filter: CategoryFilter) {
        if self.query.set_category_filter(filter) {
            self.windower.invalidate();
        }
    }

    pub fn clear_filters(&mut self) {
        self.query.clear_filters();
        self.windower.invalidate();
    }

    pub fn on_scroll(&mut self, offset: f32) {
        self.windower.on_scroll(offset);
    }

    pub fn on_resize(&mut self, viewport: f32, columns: usize) {
        self.windower.on_resize(viewport, columns);
    }

    /// poll debounce → (rank → filter inside the controller) → window.
    pub fn on_frame(&mut self, now: Instant) -> Frame {
        if self.query.poll(now) {
            self.windower.invalidate();
        }
        let result_count = self.query.results().len();
        self.windower.on_frame(result_count);

        let index = self.query.index();
        let results = self.query.results();
        let visible = match (self.windower.frame(), index) {
            (Some(window), Some(index)) => window
                .visible_items
                .iter()
                .filter_map(|item| {
                    let hit = results.get(item.index)?;
                    let entry = &index.get(hit.position)?.entry;
                    Some(VisibleProduct {
                        index: item.index,
                        offset: item.offset,
                        column: item.column,
                        entry: entry.clone(),
                        score: hit.score,
                        matched: hit.matched.clone(),
                        selected: self.selection.is_selected(entry.id),
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        Frame {
            raw_term: self.query.raw_term().to_string(),
            visible,
            total_extent: self.windower.state().total_extent(result_count),
            result_count,
            suggestions: self.query.suggestions().to_vec(),
            history: self.query.history().entries().to_vec(),
            is_searching: self.query.is_searching(),
            error: self.query.load_error().map(str::to_string),
        }
    }

    pub fn select(&mut self, entry_id: EntryId) -> Option<SelectOutcome> {
        let entry = self.query.entry(entry_id)?;
        Some(self.selection.select(&mut self.sheet, entry))
    }

    pub fn deselect(&mut self, entry_id: EntryId) -> bool {
        self.selection.deselect(&mut self.sheet, entry_id)
    }

    /// `None` when the entry is not in the loaded catalog.
    pub fn toggle(&mut self, entry_id: EntryId) -> Option<bool> {
        let entry = self.query.entry(entry_id)?;
        Some(self.selection.toggle(&mut self.sheet, entry))
    }

    pub fn on_rows_externally_edited(&mut self, rows: Vec<SheetRow>) -> Vec<EntryId> {
        self.selection.on_rows_externally_edited(&mut self.sheet, rows)
    }

    pub fn edit_row(&mut self, row_id: RowId, edit: RowEdit) -> Vec<EntryId> {
        self.selection.edit_row(&mut self.sheet, row_id, edit)
    }

    pub fn valid_rows(&self) -> Vec<ProductDraft> {
        self.selection.valid_rows(&self.sheet)
    }

    pub fn commit(&mut self) -> Vec<ProductDraft> {
        self.selection.commit(&mut self.sheet)
    }

    pub fn clear_sheet(&mut self) {
        self.selection.clear(&mut self.sheet);
    }

    pub fn scroll_to_index(&self, index: usize) -> ScrollRequest {
        self.windower.scroll_to_index(index, self.query.results().len())
    }

    pub fn scroll_to_top(&self) -> ScrollRequest {
        self.windower.scroll_to_top()
    }

    pub fn scroll_into_view(&self, index: usize) -> Option<ScrollRequest> {
        self.windower.scroll_into_view(index, self.query.results().len())
    }

    pub fn request_scroll(
        &self,
        surface: &mut dyn ScrollSurface,
        request: ScrollRequest,
    ) -> Result<(), SurfaceError> {
        self.windower.request(surface, request)
    }

    pub fn query(&self) -> &QueryController {
        &self.query
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn selection(&self) -> &SelectionSync {
        &self.selection
    }

    pub fn clear_history(&mut self) {
        self.query.clear_history();
    }

    pub fn index_builds(&self) -> u64 {
        self.indexer.builds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use stockcore_query::MemoryStore;

    struct Fixed(Vec<CatalogEntry>);

    impl CatalogSource for Fixed {
        fn load_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
            Ok(self.0.clone())
        }
    }

    struct Offline;

    impl CatalogSource for Offline {
        fn load_catalog(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
            Err(CatalogError::Unavailable("offline".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingSurface(Vec<ScrollRequest>);

    impl ScrollSurface for RecordingSurface {
        fn scroll_to(&mut self, request: ScrollRequest) -> Result<(), SurfaceError> {
            self.0.push(request);
            Ok(())
        }
    }

    fn catalog() -> Fixed {
        Fixed(vec![
            CatalogEntry::new(1, "Kabras Sugar 2kg").with_category("foods"),
            CatalogEntry::new(2, "Omo Detergent 1kg").with_category("homecare"),
            CatalogEntry::new(3, "Mumias Sugar 1kg").with_category("foods"),
        ])
    }

    fn session() -> SearchSession {
        let mut session =
            SearchSession::new(&Settings::default(), Box::new(MemoryStore::new())).unwrap();
        session.load_catalog(&catalog()).unwrap();
        session.on_resize(800.0, 1);
        session
    }

    fn names(frame: &Frame) -> Vec<&str> {
        frame.visible.iter().map(|p| p.entry.name.as_str()).collect()
    }

    #[test]
    fn empty_query_shows_whole_catalog() {
        let mut session = session();
        let frame = session.on_frame(Instant::now());
        assert_eq!(frame.result_count, 3);
        assert_eq!(
            names(&frame),
            vec!["Kabras Sugar 2kg", "Omo Detergent 1kg", "Mumias Sugar 1kg"]
        );
        assert_eq!(frame.total_extent, 840.0);
        assert!(frame.error.is_none());
    }

    #[test]
    fn term_applies_after_debounce() {
        let mut session = session();
        let start = Instant::now();
        session.on_query_change("omo", start);

        let frame = session.on_frame(start + Duration::from_millis(50));
        assert!(frame.is_searching);
        assert_eq!(frame.raw_term, "omo");
        assert_eq!(frame.result_count, 3);

        let frame = session.on_frame(start + Duration::from_millis(250));
        assert!(!frame.is_searching);
        assert_eq!(names(&frame), vec!["Omo Detergent 1kg"]);
        assert_eq!(frame.history, vec!["omo"]);
    }

    #[test]
    fn category_filter_narrows_without_reranking() {
        let mut session = session();
        session.on_query_change("sugar", Instant::now());
        session.flush();
        let runs = session.query().rank_runs();

        session.on_category_change(CategoryFilter::parse("homecare"));
        let frame = session.on_frame(Instant::now());
        assert_eq!(frame.result_count, 0);
        assert_eq!(session.query().rank_runs(), runs);

        session.clear_filters();
        assert_eq!(session.on_frame(Instant::now()).result_count, 3);
    }

    #[test]
    fn failed_load_surfaces_error_and_clears_results() {
        let mut session = session();
        assert!(session.load_catalog(&Offline).is_err());

        let frame = session.on_frame(Instant::now());
        assert_eq!(frame.result_count, 0);
        assert!(frame.visible.is_empty());
        assert_eq!(frame.error.as_deref(), Some("catalog source unavailable: offline"));

        session.load_catalog(&catalog()).unwrap();
        assert!(session.on_frame(Instant::now()).error.is_none());
    }

    #[test]
    fn selection_shows_in_frame() {
        let mut session = session();
        assert_eq!(session.select(EntryId(2)), Some(SelectOutcome::Filled(RowId(1))));
        assert_eq!(session.select(EntryId(99)), None);

        let frame = session.on_frame(Instant::now());
        let selected: Vec<u64> = frame
            .visible
            .iter()
            .filter(|p| p.selected)
            .map(|p| p.entry.id.0)
            .collect();
        assert_eq!(selected, vec![2]);

        assert_eq!(session.toggle(EntryId(2)), Some(false));
        assert!(session.sheet().rows()[0].is_blank());
        assert_eq!(session.toggle(EntryId(99)), None);
    }

    #[test]
    fn scroll_requests_go_through_surface() {
        let mut session = session();
        let mut surface = RecordingSurface::default();
        let request = session.scroll_to_index(2);
        session.request_scroll(&mut surface, request).unwrap();
        session.request_scroll(&mut surface, session.scroll_to_top()).unwrap();

        assert_eq!(surface.0.len(), 2);
        assert_eq!(surface.0[0].index, Some(2));
        assert_eq!(surface.0[1].offset, 0.0);
        session.on_scroll(surface.0[0].offset);
        assert_eq!(session.on_frame(Instant::now()).result_count, 3);
    }

    #[test]
    fn same_snapshot_is_indexed_once() {
        let mut session = session();
        session.reindex();
        session.reindex();
        assert_eq!(session.index_builds(), 1);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = Settings {
            item_size: 0.0,
            ..Settings::default()
        };
        assert!(SearchSession::new(&settings, Box::new(MemoryStore::new())).is_err());
    }
}
