//! Core editing logic for slidedeck.
//! Document model, style resolution, input coalescing and undo/redo history
//! for an AI-generated presentation editor.

pub mod coalesce;
pub mod config;
pub mod editor;
pub mod history;
pub mod logging;
pub mod model;
pub mod session;
pub mod style;

pub use coalesce::coalescer::{ChangeCoalescer, CoalescePolicy, Commit, CommitReason};
pub use config::{ConfigError, EditorConfig};
pub use editor::context::{derive_text_preview, EditorContext, EditorError, SurfaceHandle};
pub use editor::toolbar::ToolbarState;
pub use history::action::{ActionBody, ActionDraft, ActionKind, HistoryAction};
pub use history::engine::{
    HistoryDesync, HistoryEngine, HistoryError, HistoryEvent, HistoryObserver, HistoryResult,
    HistoryState, Replay, ReplayDirection,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{Document, DocumentError};
pub use model::element::{
    Element, ElementBody, ElementChange, ElementId, ElementKind, Geometry, ImageFit, ShapeKind,
    TextAlign, TextStyle,
};
pub use model::length::{Length, CANVAS_HEIGHT, CANVAS_WIDTH};
pub use model::patch::{Patch, PatchError, PatchResult, PatchTarget};
pub use model::slide::{Background, Slide, SlideChange, SlideId};
pub use session::editing_session::{
    EditingSession, LoadError, RenderedSlide, SessionError, SessionResult,
};
pub use session::source::{DeckSource, InMemoryDeckSource, JsonFileDeckSource, SourceError};
pub use style::resolver::{
    resolve_background, resolve_element_style, resolve_frame, resolve_length, resolve_length_str,
    resolve_style, to_percentage, Frame, ResolvedTextStyle, StyleMap,
};

/// Minimal health check for linkage.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
