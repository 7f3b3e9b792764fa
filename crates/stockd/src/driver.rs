use std::time::Duration;

use stockcore_index::EntryId;
use stockcore_query::CategoryFilter;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::{Frame, SearchSession};

/// Roughly one display refresh.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Query(String),
    Category(CategoryFilter),
    ClearFilters,
    Scroll(f32),
    Resize { viewport: f32, columns: usize },
    Select(EntryId),
    Deselect(EntryId),
    Shutdown,
}

impl SearchSession {
    pub fn handle(&mut self, event: SurfaceEvent, now: std::time::Instant) {
        match event {
            SurfaceEvent::Query(term) => self.on_query_change(term, now),
            SurfaceEvent::Category(filter) => self.on_category_change(filter),
            SurfaceEvent::ClearFilters => self.clear_filters(),
            SurfaceEvent::Scroll(offset) => self.on_scroll(offset),
            SurfaceEvent::Resize { viewport, columns } => self.on_resize(viewport, columns),
            SurfaceEvent::Select(id) => {
                if self.select(id).is_none() {
                    tracing::debug!(entry = %id, "select for unknown entry ignored");
                }
            }
            SurfaceEvent::Deselect(id) => {
                self.deselect(id);
            }
            SurfaceEvent::Shutdown => {}
        }
    }
}

/// Drives `session` until the event channel closes or a shutdown arrives.
/// Frames are ticked on a fixed interval and published only when they
/// differ from the last one. The session is handed back at the end.
pub async fn run_session(
    mut session: SearchSession,
    mut events: mpsc::Receiver<SurfaceEvent>,
    frames: watch::Sender<Frame>,
) -> SearchSession {
    let mut ticker = time::interval(FRAME_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(SurfaceEvent::Shutdown) | None => break,
                Some(event) => session.handle(event, Instant::now().into_std()),
            },
            _ = ticker.tick() => publish(&mut session, &frames),
        }
    }

    publish(&mut session, &frames);
    tracing::debug!("session loop stopped");
    session
}

fn publish(session: &mut SearchSession, frames: &watch::Sender<Frame>) {
    let frame = session.on_frame(Instant::now().into_std());
    frames.send_if_modified(|current| {
        if *current == frame {
            return false;
        }
        *current = frame;
        true
    });
}
