//! Session host: wires indexer, query controller, windower and selection
//! sync into one frame pipeline, plus the file-backed adapters and the
//! async event loop a rendering surface talks to.

mod driver;
mod files;
mod session;

pub use driver::{run_session, SurfaceEvent, FRAME_INTERVAL};
pub use files::{JsonFileCatalog, JsonFileStore};
pub use session::{Frame, SearchSession, VisibleProduct};
