use std::ops::Range;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("scroll surface is detached")]
    Detached,
    #[error("scroll request rejected: {0}")]
    Rejected(String),
}

/// The rendering surface side of a scroll request. The surface scrolls and
/// later reports the new offset back through the normal scroll event.
pub trait ScrollSurface {
    fn scroll_to(&mut self, request: ScrollRequest) -> Result<(), SurfaceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollRequest {
    pub offset: f32,
    pub index: Option<usize>,
}

/// Half-open `[start_index, end_index)` slice of the item list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleRange {
    pub start_index: usize,
    pub end_index: usize,
}

impl VisibleRange {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..self.end_index).contains(&index)
    }

    pub fn indices(&self) -> Range<usize> {
        self.start_index..self.end_index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionedItem {
    pub index: usize,
    pub offset: f32,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFrame {
    pub range: VisibleRange,
    pub visible_items: Vec<PositionedItem>,
    pub total_extent: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    pub scroll_offset: f32,
    pub viewport_size: f32,
    pub item_size: f32,
    pub overscan: usize,
    pub columns: usize,
}

impl WindowState {
    pub fn new(item_size: f32, overscan: usize) -> Self {
        Self {
            scroll_offset: 0.0,
            viewport_size: 0.0,
            item_size,
            overscan,
            columns: 1,
        }
    }

    fn columns(&self) -> usize {
        self.columns.max(1)
    }

    fn usable(&self) -> bool {
        self.item_size > 0.0 && self.item_size.is_finite()
    }

    pub fn rows(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.columns())
    }

    pub fn total_extent(&self, item_count: usize) -> f32 {
        if !self.usable() {
            return 0.0;
        }
        self.rows(item_count) as f32 * self.item_size
    }

    pub fn max_scroll_offset(&self, item_count: usize) -> f32 {
        (self.total_extent(item_count) - self.viewport_size).max(0.0)
    }

    pub fn item_offset(&self, index: usize) -> f32 {
        (index / self.columns()) as f32 * self.item_size
    }

    /// Rows intersecting the viewport plus `overscan` rows on each side,
    /// expressed as item indices and clamped to `[0, item_count)`.
    pub fn visible_range(&self, item_count: usize) -> VisibleRange {
        if item_count == 0 || !self.usable() {
            return VisibleRange::default();
        }

        let columns = self.columns();
        let rows = self.rows(item_count);
        let offset = self.scroll_offset.max(0.0);
        let viewport = self.viewport_size.max(0.0);

        let first_row = (offset / self.item_size).floor() as usize;
        let start_row = first_row.saturating_sub(self.overscan);
        let last_row = ((offset + viewport) / self.item_size).ceil() as usize;
        let end_row = last_row.saturating_add(self.overscan).min(rows);

        let end_index = end_row.saturating_mul(columns).min(item_count);
        let start_index = start_row.saturating_mul(columns).min(end_index);
        VisibleRange {
            start_index,
            end_index,
        }
    }

    pub fn positioned_items(&self, range: VisibleRange) -> Vec<PositionedItem> {
        let columns = self.columns();
        range
            .indices()
            .map(|index| PositionedItem {
                index,
                offset: self.item_offset(index),
                column: index % columns,
            })
            .collect()
    }

    pub fn frame(&self, item_count: usize) -> WindowFrame {
        let range = self.visible_range(item_count);
        WindowFrame {
            range,
            visible_items: self.positioned_items(range),
            total_extent: self.total_extent(item_count),
        }
    }
}

/// Owns the window state. Scroll events are only recorded; the visible
/// slice is recomputed at most once per rendered frame.
#[derive(Debug)]
pub struct Windower {
    state: WindowState,
    pending_scroll: Option<f32>,
    item_count: usize,
    dirty: bool,
    frame: Option<WindowFrame>,
    recomputes: u64,
}

impl Windower {
    pub fn new(item_size: f32, overscan: usize) -> Self {
        Self {
            state: WindowState::new(item_size, overscan),
            pending_scroll: None,
            item_count: 0,
            dirty: true,
            frame: None,
            recomputes: 0,
        }
    }

    pub fn state(&self) -> &WindowState {
        &self.state
    }

    pub fn frame(&self) -> Option<&WindowFrame> {
        self.frame.as_ref()
    }

    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    pub fn on_scroll(&mut self, offset: f32) {
        if offset.is_finite() {
            self.pending_scroll = Some(offset);
        }
    }

    pub fn on_resize(&mut self, viewport_size: f32, columns: usize) {
        let viewport_size = if viewport_size.is_finite() {
            viewport_size.max(0.0)
        } else {
            0.0
        };
        let columns = columns.max(1);
        if viewport_size != self.state.viewport_size || columns != self.state.columns {
            self.state.viewport_size = viewport_size;
            self.state.columns = columns;
            self.dirty = true;
        }
    }

    /// Forces the next frame to recompute, e.g. after the item list changed
    /// without changing length.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Applies the latest pending scroll offset and recomputes when anything
    /// changed. Returns the new frame, or `None` when the previous one is
    /// still current.
    pub fn on_frame(&mut self, item_count: usize) -> Option<&WindowFrame> {
        if let Some(offset) = self.pending_scroll.take() {
            if offset != self.state.scroll_offset {
                self.state.scroll_offset = offset;
                self.dirty = true;
            }
        }
        if item_count != self.item_count {
            self.item_count = item_count;
            self.dirty = true;
        }
        if !self.dirty {
            return None;
        }

        self.dirty = false;
        self.recomputes += 1;
        let frame = self.state.frame(item_count);
        tracing::trace!(
            start = frame.range.start_index,
            end = frame.range.end_index,
            items = item_count,
            "window recomputed"
        );
        self.frame = Some(frame);
        self.frame.as_ref()
    }

    /// Target offset that puts `index` at the top of the viewport. Does not
    /// move the window; the surface's scroll event does.
    pub fn scroll_to_index(&self, index: usize, item_count: usize) -> ScrollRequest {
        let index = index.min(item_count.saturating_sub(1));
        let offset = self
            .state
            .item_offset(index)
            .min(self.state.max_scroll_offset(item_count));
        ScrollRequest {
            offset,
            index: (item_count > 0).then_some(index),
        }
    }

    pub fn scroll_to_top(&self) -> ScrollRequest {
        ScrollRequest {
            offset: 0.0,
            index: None,
        }
    }

    /// Smallest scroll that brings `index` fully into view, if it is not
    /// already. Used for keyboard navigation through results.
    pub fn scroll_into_view(&self, index: usize, item_count: usize) -> Option<ScrollRequest> {
        if index >= item_count || !self.state.usable() {
            return None;
        }

        let top = self.state.item_offset(index);
        let bottom = top + self.state.item_size;
        let view_top = self.state.scroll_offset;
        let view_bottom = view_top + self.state.viewport_size;

        let offset = if top < view_top {
            top
        } else if bottom > view_bottom {
            (bottom - self.state.viewport_size).min(self.state.max_scroll_offset(item_count))
        } else {
            return None;
        };
        Some(ScrollRequest {
            offset: offset.max(0.0),
            index: Some(index),
        })
    }

    pub fn request(
        &self,
        surface: &mut dyn ScrollSurface,
        request: ScrollRequest,
    ) -> Result<(), SurfaceError> {
        tracing::debug!(offset = request.offset, index = ?request.index, "scroll requested");
        surface.scroll_to(request)
    }
}
