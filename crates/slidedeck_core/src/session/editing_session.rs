//! Editing session facade.
//!
//! # Responsibility
//! - Own the document, history engine, coalescer and editor context for one
//!   opened presentation.
//! - Route typing through the coalescer, blur saves and direct manipulation
//!   through history, and undo/redo straight to the engine.
//!
//! # Invariants
//! - Every document change goes through `HistoryEngine::commit`.
//! - Pending coalesced input is flushed before undo/redo and before any
//!   commit that removes its element or slide, so typing is never reordered
//!   or lost.
//! - Coalesced input never lands inside an open batch. It is held and
//!   committed as its own entries once the batch closes.
//! - `reset` cancels pending input; a cancelled entry never commits.

use crate::coalesce::coalescer::{ChangeCoalescer, Commit};
use crate::config::EditorConfig;
use crate::editor::context::{EditorContext, EditorError, SurfaceHandle};
use crate::editor::toolbar::ToolbarState;
use crate::history::action::ActionDraft;
use crate::history::engine::{HistoryEngine, HistoryError, HistoryObserver, HistoryState, Replay};
use crate::model::document::Document;
use crate::model::element::{Element, ElementChange, ElementId};
use crate::model::length::Length;
use crate::model::patch::{Patch, PatchError, PatchTarget};
use crate::model::slide::{Background, Slide, SlideChange, SlideId};
use crate::session::source::{DeckSource, SourceError};
use crate::style::resolver::{resolve_background, resolve_element_style, resolve_frame, Frame, StyleMap};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub type SessionResult<T> = Result<T, SessionError>;

/// Session could not be created from the external source.
#[derive(Debug)]
pub enum LoadError {
    LoadFailed {
        request_id: String,
        source: SourceError,
    },
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadFailed { request_id, source } => {
                write!(f, "failed to load deck `{request_id}`: {source}")
            }
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LoadFailed { source, .. } => Some(source),
        }
    }
}

/// Errors from session operations. Each one rejects a single action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Editor(EditorError),
    History(HistoryError),
}

impl SessionError {
    /// Underlying patch rejection, if any.
    pub fn patch_error(&self) -> Option<&PatchError> {
        match self {
            Self::Editor(EditorError::Target(err)) => Some(err),
            Self::History(HistoryError::Patch(err)) => Some(err),
            _ => None,
        }
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Editor(err) => write!(f, "{err}"),
            Self::History(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Editor(err) => Some(err),
            Self::History(err) => Some(err),
        }
    }
}

impl From<EditorError> for SessionError {
    fn from(value: EditorError) -> Self {
        Self::Editor(value)
    }
}

impl From<HistoryError> for SessionError {
    fn from(value: HistoryError) -> Self {
        Self::History(value)
    }
}

impl From<PatchError> for SessionError {
    fn from(value: PatchError) -> Self {
        Self::History(HistoryError::Patch(value))
    }
}

/// Render-ready projection of one slide.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSlide {
    pub slide_id: SlideId,
    pub background: StyleMap,
    /// Element styles in z-order.
    pub elements: Vec<(ElementId, StyleMap)>,
}

/// One opened presentation and its editing state.
#[derive(Debug)]
pub struct EditingSession {
    document: Document,
    history: HistoryEngine,
    coalescer: ChangeCoalescer<SurfaceHandle, String>,
    editor: EditorContext,
    config: EditorConfig,
    /// Coalesced commits that came due while a batch was open.
    held: Vec<Commit<SurfaceHandle, String>>,
}

impl EditingSession {
    /// Seeds a session from an external deck source.
    ///
    /// # Errors
    /// - `LoadError::LoadFailed` when the source fails; no session exists
    ///   and the caller decides whether to retry.
    pub fn load(
        source: &impl DeckSource,
        request_id: &str,
        config: EditorConfig,
    ) -> Result<Self, LoadError> {
        match source.fetch_deck(request_id) {
            Ok(document) => {
                info!(
                    "event=session_load module=session status=ok slides={}",
                    document.len()
                );
                Ok(Self::from_document(document, config))
            }
            Err(err) => {
                warn!(
                    "event=session_load module=session status=error error={}",
                    err
                );
                Err(LoadError::LoadFailed {
                    request_id: request_id.to_string(),
                    source: err,
                })
            }
        }
    }

    pub fn from_document(document: Document, config: EditorConfig) -> Self {
        Self {
            document,
            history: HistoryEngine::new(config.max_history_depth),
            coalescer: ChangeCoalescer::new(config.coalesce_policy()),
            editor: EditorContext::new(config.preview_chars),
            config,
            held: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &HistoryEngine {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn subscribe(&mut self, observer: Box<dyn HistoryObserver>) {
        self.history.subscribe(observer);
    }

    pub fn toolbar(&self) -> ToolbarState {
        ToolbarState::from_history(&self.history)
    }

    /// Side-effect free snapshot for the surrounding app to persist.
    pub fn export(&self) -> Document {
        self.document.clone()
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        self.document.to_json_string()
    }

    pub fn active_surface(&self) -> Option<&SurfaceHandle> {
        self.editor.active()
    }

    pub fn has_pending_input(&self) -> bool {
        self.coalescer.pending_len() > 0 || !self.held.is_empty()
    }

    /// Attaches a rich-text surface, flushing the previous one first.
    pub fn attach(&mut self, surface: SurfaceHandle) -> SessionResult<()> {
        EditorContext::check_target(&self.document, &surface)?;
        self.detach()?;
        self.editor.attach(surface);
        Ok(())
    }

    /// Detaches the current surface and commits its outstanding input.
    pub fn detach(&mut self) -> SessionResult<Option<SurfaceHandle>> {
        let Some(previous) = self.editor.detach() else {
            return Ok(None);
        };
        if let Some(commit) = self.coalescer.flush(&previous) {
            if self.is_batching() {
                self.held.push(commit);
            } else {
                self.commit_content(&commit.key, &commit.payload)?;
            }
        }
        Ok(Some(previous))
    }

    /// Records one raw input event (keystroke) for the attached surface.
    pub fn input(&mut self, content: impl Into<String>, now: Duration) -> SessionResult<()> {
        let surface = self
            .editor
            .active()
            .cloned()
            .ok_or(EditorError::NoActiveSurface)?;
        if let Some(commit) = self.coalescer.emit(surface, content.into(), now) {
            self.record_coalesced(commit);
        }
        Ok(())
    }

    /// When the host loop should call `poll` next.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.coalescer.next_deadline()
    }

    /// Commits every coalesced entry due at `now`. Returns how many history
    /// entries were recorded.
    ///
    /// While a batch is open nothing is committed; due entries stay pending
    /// until the batch closes.
    pub fn poll(&mut self, now: Duration) -> usize {
        if self.is_batching() {
            return 0;
        }
        self.coalescer
            .poll(now)
            .into_iter()
            .filter(|commit| self.apply_coalesced(commit))
            .count()
    }

    /// Blur handler: commits the surface's serialized content.
    ///
    /// Returns `false` when the content was unchanged and nothing was
    /// recorded.
    pub fn save(&mut self, content: &str) -> SessionResult<bool> {
        let surface = self
            .editor
            .active()
            .cloned()
            .ok_or(EditorError::NoActiveSurface)?;
        self.coalescer.cancel(&surface);
        self.commit_content(&surface, content)
    }

    /// Commits a caller-built draft (generic direct manipulation).
    ///
    /// A draft that removes an element or slide first commits the pending
    /// input aimed at it and detaches the surface editing it.
    pub fn commit(&mut self, draft: ActionDraft) -> SessionResult<()> {
        self.release_surfaces(&draft.patch);
        self.history.commit(&mut self.document, draft)?;
        Ok(())
    }

    pub fn update_element(
        &mut self,
        slide_id: &SlideId,
        element_id: &ElementId,
        change: ElementChange,
        description: impl Into<String>,
    ) -> SessionResult<()> {
        self.commit(ActionDraft::new(
            description,
            Patch::UpdateElement {
                slide_id: slide_id.clone(),
                element_id: element_id.clone(),
                change,
            },
        ))
    }

    pub fn move_element(
        &mut self,
        slide_id: &SlideId,
        element_id: &ElementId,
        x: Length,
        y: Length,
    ) -> SessionResult<()> {
        let description = format!("Move {element_id}");
        self.update_element(
            slide_id,
            element_id,
            ElementChange::Position { x, y },
            description,
        )
    }

    pub fn resize_element(
        &mut self,
        slide_id: &SlideId,
        element_id: &ElementId,
        width: Length,
        height: Length,
    ) -> SessionResult<()> {
        let description = format!("Resize {element_id}");
        self.update_element(
            slide_id,
            element_id,
            ElementChange::Size { width, height },
            description,
        )
    }

    /// Inserts `element` at `index` (or on top when `None`).
    pub fn add_element(
        &mut self,
        slide_id: &SlideId,
        index: Option<usize>,
        element: Element,
    ) -> SessionResult<ElementId> {
        let slide = self
            .document
            .slide(slide_id)
            .ok_or_else(|| PatchError::NotFound(PatchTarget::Slide(slide_id.clone())))?;
        let index = index.unwrap_or(slide.element_count());
        let element_id = element.id.clone();
        let description = format!("Add {} {element_id}", element.kind());
        self.commit(ActionDraft::new(
            description,
            Patch::InsertElement {
                slide_id: slide_id.clone(),
                index,
                element,
            },
        ))?;
        Ok(element_id)
    }

    pub fn delete_element(
        &mut self,
        slide_id: &SlideId,
        element_id: &ElementId,
    ) -> SessionResult<()> {
        self.commit(ActionDraft::new(
            format!("Delete {element_id}"),
            Patch::RemoveElement {
                slide_id: slide_id.clone(),
                element_id: element_id.clone(),
            },
        ))
    }

    /// Inserts `slide` at `index` (or at the end when `None`).
    pub fn add_slide(&mut self, index: Option<usize>, slide: Slide) -> SessionResult<SlideId> {
        let index = index.unwrap_or(self.document.len());
        let slide_id = slide.id.clone();
        self.commit(ActionDraft::new(
            format!("Add slide {slide_id}"),
            Patch::InsertSlide { index, slide },
        ))?;
        Ok(slide_id)
    }

    pub fn delete_slide(&mut self, slide_id: &SlideId) -> SessionResult<()> {
        self.commit(ActionDraft::new(
            format!("Delete slide {slide_id}"),
            Patch::RemoveSlide {
                slide_id: slide_id.clone(),
            },
        ))
    }

    pub fn reorder_slide(&mut self, from: usize, to: usize) -> SessionResult<()> {
        self.commit(ActionDraft::new(
            format!("Move slide {} to {}", from + 1, to + 1),
            Patch::MoveSlide { from, to },
        ))
    }

    pub fn set_slide_background(
        &mut self,
        slide_id: &SlideId,
        background: Option<Background>,
    ) -> SessionResult<()> {
        self.commit(ActionDraft::new(
            format!("Change background of {slide_id}"),
            Patch::UpdateSlide {
                slide_id: slide_id.clone(),
                change: SlideChange::Background(background),
            },
        ))
    }

    pub fn set_slide_notes(
        &mut self,
        slide_id: &SlideId,
        notes: Option<String>,
    ) -> SessionResult<()> {
        self.commit(ActionDraft::new(
            format!("Edit notes of {slide_id}"),
            Patch::UpdateSlide {
                slide_id: slide_id.clone(),
                change: SlideChange::Notes(notes),
            },
        ))
    }

    /// Opens a batch. Pending input is committed first, outside the batch.
    pub fn begin_batch(&mut self, description: impl Into<String>) -> SessionResult<()> {
        if !self.is_batching() {
            self.flush_pending();
        }
        self.history.begin_batch(description)?;
        Ok(())
    }

    pub fn end_batch(&mut self) -> SessionResult<bool> {
        let recorded = self.history.end_batch()?;
        self.release_held();
        Ok(recorded)
    }

    pub fn cancel_batch(&mut self) -> SessionResult<()> {
        self.history.cancel_batch(&mut self.document)?;
        self.release_held();
        self.drop_dangling_surface();
        Ok(())
    }

    /// Flushes pending input, then reverts the latest action.
    ///
    /// # Errors
    /// - `HistoryError::BatchInProgress` while a batch is open; pending input
    ///   is left untouched.
    pub fn undo(&mut self) -> SessionResult<Replay> {
        self.reject_while_batching()?;
        self.flush_pending();
        let replay = self.history.undo(&mut self.document)?;
        self.drop_dangling_surface();
        Ok(replay)
    }

    /// Flushes pending input, then re-applies the latest undone action.
    pub fn redo(&mut self) -> SessionResult<Replay> {
        self.reject_while_batching()?;
        self.flush_pending();
        let replay = self.history.redo(&mut self.document)?;
        self.drop_dangling_surface();
        Ok(replay)
    }

    /// Replaces the document, dropping pending input and all history.
    pub fn reset(&mut self, document: Document) {
        let cancelled = self.coalescer.cancel_all() + self.held.len();
        self.held.clear();
        self.editor.detach();
        self.history.clear();
        self.document = document;
        info!(
            "event=session_reset module=session status=ok cancelled_inputs={} slides={}",
            cancelled,
            self.document.len()
        );
    }

    pub fn render_frame(&self, slide_id: &SlideId, element_id: &ElementId) -> Option<Frame> {
        self.document.element(slide_id, element_id).map(resolve_frame)
    }

    pub fn render_slide(&self, slide_id: &SlideId) -> Option<RenderedSlide> {
        let slide = self.document.slide(slide_id)?;
        Some(RenderedSlide {
            slide_id: slide.id.clone(),
            background: resolve_background(slide.background.as_ref()),
            elements: slide
                .elements()
                .map(|element| (element.id.clone(), resolve_element_style(element)))
                .collect(),
        })
    }

    fn commit_content(&mut self, surface: &SurfaceHandle, content: &str) -> SessionResult<bool> {
        let Some(draft) = self.editor.content_draft(&self.document, surface, content)? else {
            return Ok(false);
        };
        self.history.commit(&mut self.document, draft)?;
        Ok(true)
    }

    /// Commits one coalesced entry; a rejection is logged and dropped.
    fn apply_coalesced(&mut self, commit: &Commit<SurfaceHandle, String>) -> bool {
        match self.commit_content(&commit.key, &commit.payload) {
            Ok(recorded) => recorded,
            Err(err) => {
                warn!(
                    "event=coalesced_commit module=session status=rejected reason={:?} target={} error={}",
                    commit.reason, commit.key, err
                );
                false
            }
        }
    }

    /// Commits now, or holds the entry while a batch is open.
    fn record_coalesced(&mut self, commit: Commit<SurfaceHandle, String>) -> bool {
        if self.is_batching() {
            self.held.push(commit);
            return false;
        }
        self.apply_coalesced(&commit)
    }

    fn release_held(&mut self) {
        for commit in std::mem::take(&mut self.held) {
            self.apply_coalesced(&commit);
        }
    }

    fn flush_pending(&mut self) {
        for commit in self.coalescer.flush_all() {
            self.record_coalesced(commit);
        }
    }

    /// Commits input aimed at whatever `patch` removes and detaches the
    /// surface editing it. Inside a batch the input joins the batch, ahead of
    /// the removal.
    fn release_surfaces(&mut self, patch: &Patch) {
        if !matches!(
            patch,
            Patch::RemoveElement { .. } | Patch::RemoveSlide { .. }
        ) {
            return;
        }
        let (doomed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.held)
            .into_iter()
            .partition(|commit| removes_surface(patch, &commit.key));
        self.held = kept;
        let flushed = self
            .coalescer
            .flush_where(|key| removes_surface(patch, key));
        for commit in doomed.into_iter().chain(flushed) {
            self.apply_coalesced(&commit);
        }
        if self
            .editor
            .active()
            .is_some_and(|surface| removes_surface(patch, surface))
        {
            self.editor.detach();
        }
    }

    fn is_batching(&self) -> bool {
        self.history.state() == HistoryState::Batching
    }

    fn reject_while_batching(&self) -> SessionResult<()> {
        if self.is_batching() {
            return Err(HistoryError::BatchInProgress.into());
        }
        Ok(())
    }

    fn drop_dangling_surface(&mut self) {
        let dangling = self
            .editor
            .active()
            .is_some_and(|surface| EditorContext::check_target(&self.document, surface).is_err());
        if dangling {
            if let Some(surface) = self.editor.detach() {
                self.coalescer.cancel(&surface);
            }
        }
    }
}

fn removes_surface(patch: &Patch, surface: &SurfaceHandle) -> bool {
    match patch {
        Patch::RemoveElement {
            slide_id,
            element_id,
        } => &surface.slide_id == slide_id && &surface.element_id == element_id,
        Patch::RemoveSlide { slide_id } => &surface.slide_id == slide_id,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::EditingSession;
    use crate::config::EditorConfig;
    use crate::editor::context::SurfaceHandle;
    use crate::model::document::Document;
    use crate::model::element::{Element, Geometry};
    use crate::model::slide::Slide;
    use std::time::Duration;

    fn session() -> EditingSession {
        let document = Document::new(vec![Slide::new("s1")]).expect("valid doc");
        EditingSession::from_document(document, EditorConfig::default())
    }

    #[test]
    fn undoing_an_add_drops_the_attached_surface() {
        let mut session = session();
        session
            .add_element(
                &"s1".into(),
                None,
                Element::text("t1", Geometry::default(), "new"),
            )
            .expect("add");
        session
            .attach(SurfaceHandle::new("s1", "t1"))
            .expect("attach");

        session.undo().expect("undo");
        assert!(session.active_surface().is_none());
        assert!(session.input("x", Duration::ZERO).is_err());
    }

    #[test]
    fn detach_commits_outstanding_input() {
        let mut session = session();
        session
            .add_element(&"s1".into(), None, Element::text("t1", Geometry::default(), ""))
            .expect("add");
        session
            .attach(SurfaceHandle::new("s1", "t1"))
            .expect("attach");
        session.input("typed", Duration::from_millis(5)).expect("input");

        let detached = session.detach().expect("detach");
        assert_eq!(detached, Some(SurfaceHandle::new("s1", "t1")));
        assert_eq!(session.history().past_len(), 2);
        assert!(!session.has_pending_input());
    }

    #[test]
    fn ceiling_commit_inside_batch_waits_for_batch_end() {
        let config = EditorConfig {
            quiet_window_ms: 500,
            max_wait_ms: 1_000,
            ..EditorConfig::default()
        };
        let document = Document::new(vec![
            Slide::new("s1").with_element(Element::text("t1", Geometry::default(), ""))
        ])
        .expect("valid doc");
        let mut session = EditingSession::from_document(document, config);
        session.begin_batch("layout").expect("begin");
        session
            .attach(SurfaceHandle::new("s1", "t1"))
            .expect("attach");

        for at in [0, 400, 800, 1_000] {
            session
                .input(format!("v{at}"), Duration::from_millis(at))
                .expect("input");
        }
        assert!(session.has_pending_input());
        assert!(!session.end_batch().expect("end"));

        assert_eq!(session.history().past_len(), 1);
        let text = session
            .document()
            .element(&"s1".into(), &"t1".into())
            .and_then(Element::content);
        assert_eq!(text, Some("v1000"));
    }
}
