//! Undo/redo history engine.
//!
//! # Responsibility
//! - Apply committed patches to the document and record their inverses.
//! - Group explicit multi-step operations into atomic batch entries.
//! - Replay inverse/forward patches on undo/redo.
//!
//! # Invariants
//! - A rejected patch never enters history and never changes the document.
//! - Any fresh commit clears `future` (no branching history).
//! - `future` is only non-empty after an undo.
//! - When bounded, overflow drops the oldest `past` entry only.
//! - A replay failure drops the entry, reports `HistoryDesync` and keeps
//!   the current document.
//!
//! The engine borrows the document for each call; it never owns it.

use crate::history::action::{ActionDraft, ActionKind, HistoryAction};
use crate::model::document::Document;
use crate::model::patch::PatchError;
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Engine state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    Idle,
    Batching,
}

/// Direction of a failed replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayDirection {
    Undo,
    Redo,
}

impl ReplayDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

/// Recoverable warning: a recorded action no longer applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDesync {
    pub kind: ActionKind,
    pub description: String,
    pub direction: ReplayDirection,
    pub cause: PatchError,
}

impl Display for HistoryDesync {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "history desync during {} of `{}`: {}",
            self.direction.as_str(),
            self.description,
            self.cause
        )
    }
}

impl Error for HistoryDesync {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.cause)
    }
}

/// Errors from engine calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The committed patch was rejected by the document model.
    Patch(PatchError),
    /// `begin_batch` while a batch is already open.
    BatchAlreadyOpen { open: String },
    /// `end_batch`/`cancel_batch` without an open batch.
    NoOpenBatch,
    /// Undo/redo requested while a batch is open.
    BatchInProgress,
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patch(err) => write!(f, "{err}"),
            Self::BatchAlreadyOpen { open } => {
                write!(f, "batch already open: `{open}`; batches do not nest")
            }
            Self::NoOpenBatch => write!(f, "no batch is open"),
            Self::BatchInProgress => write!(f, "undo/redo is unavailable while a batch is open"),
        }
    }
}

impl Error for HistoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Patch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatchError> for HistoryError {
    fn from(value: PatchError) -> Self {
        Self::Patch(value)
    }
}

/// Result of one undo/redo request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replay {
    /// Stack was empty.
    Nothing,
    /// Action replayed; carries its description.
    Applied { kind: ActionKind, description: String },
    /// Action no longer applied and was dropped.
    Desynced(HistoryDesync),
}

/// Notifications delivered to observers after state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    Committed { kind: ActionKind, description: String },
    Undone { kind: ActionKind, description: String },
    Redone { kind: ActionKind, description: String },
    BatchDiscarded { description: String },
    Desync(HistoryDesync),
    Cleared,
}

/// Receives history notifications (toolbar refresh, warnings UI).
pub trait HistoryObserver {
    fn on_event(&mut self, event: &HistoryEvent);
}

impl<F> HistoryObserver for F
where
    F: FnMut(&HistoryEvent),
{
    fn on_event(&mut self, event: &HistoryEvent) {
        self(event)
    }
}

struct OpenBatch {
    description: String,
    actions: Vec<HistoryAction>,
}

/// Undo/redo stacks over a borrowed `Document`.
pub struct HistoryEngine {
    past: VecDeque<HistoryAction>,
    future: Vec<HistoryAction>,
    max_depth: Option<usize>,
    batch: Option<OpenBatch>,
    observers: Vec<Box<dyn HistoryObserver>>,
}

impl std::fmt::Debug for HistoryEngine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryEngine")
            .field("past", &self.past.len())
            .field("future", &self.future.len())
            .field("max_depth", &self.max_depth)
            .field("state", &self.state())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for HistoryEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HistoryEngine {
    /// Creates an engine retaining at most `max_depth` undo entries.
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            max_depth: max_depth.map(|depth| depth.max(1)),
            batch: None,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn HistoryObserver>) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> HistoryState {
        if self.batch.is_some() {
            HistoryState::Batching
        } else {
            HistoryState::Idle
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Action that the next `undo` would revert.
    pub fn peek_undo(&self) -> Option<&HistoryAction> {
        self.past.back()
    }

    /// Action that the next `redo` would re-apply.
    pub fn peek_redo(&self) -> Option<&HistoryAction> {
        self.future.last()
    }

    pub fn past(&self) -> impl Iterator<Item = &HistoryAction> + '_ {
        self.past.iter()
    }

    /// Applies `draft` to `doc` and records it, stamped with wall-clock time.
    pub fn commit(&mut self, doc: &mut Document, draft: ActionDraft) -> HistoryResult<()> {
        self.commit_at(doc, draft, now_epoch_ms())
    }

    /// Applies `draft` to `doc` and records it with an explicit timestamp.
    ///
    /// # Errors
    /// - `HistoryError::Patch` when the model rejects the patch; `doc` and
    ///   both stacks are unchanged.
    pub fn commit_at(
        &mut self,
        doc: &mut Document,
        draft: ActionDraft,
        timestamp_ms: i64,
    ) -> HistoryResult<()> {
        let ActionDraft { description, patch } = draft;
        let (next, inverse) = doc.apply_patch(&patch).map_err(|err| {
            warn!(
                "event=history_commit module=history status=rejected target={} error={}",
                patch.target_label(),
                err
            );
            err
        })?;
        *doc = next;

        let action = HistoryAction::single(description, patch, inverse, timestamp_ms);
        if let Some(batch) = self.batch.as_mut() {
            debug!(
                "event=history_batch_append module=history status=ok kind={} batch_len={}",
                action.kind(),
                batch.actions.len() + 1
            );
            batch.actions.push(action);
            return Ok(());
        }

        self.record(action);
        Ok(())
    }

    /// Opens a batch; following commits are grouped into one entry.
    pub fn begin_batch(&mut self, description: impl Into<String>) -> HistoryResult<()> {
        if let Some(open) = &self.batch {
            return Err(HistoryError::BatchAlreadyOpen {
                open: open.description.clone(),
            });
        }
        self.batch = Some(OpenBatch {
            description: description.into(),
            actions: Vec::new(),
        });
        Ok(())
    }

    /// Closes the open batch.
    ///
    /// Returns `true` when a batch entry was recorded and `false` when the
    /// batch collected nothing and was discarded.
    pub fn end_batch(&mut self) -> HistoryResult<bool> {
        self.end_batch_at(now_epoch_ms())
    }

    pub fn end_batch_at(&mut self, timestamp_ms: i64) -> HistoryResult<bool> {
        let batch = self.batch.take().ok_or(HistoryError::NoOpenBatch)?;
        if batch.actions.is_empty() {
            debug!("event=history_batch_end module=history status=discarded reason=empty");
            self.notify(&HistoryEvent::BatchDiscarded {
                description: batch.description,
            });
            return Ok(false);
        }

        self.record(HistoryAction::batch(
            batch.description,
            batch.actions,
            timestamp_ms,
        ));
        Ok(true)
    }

    /// Closes the open batch and rolls back everything it applied.
    pub fn cancel_batch(&mut self, doc: &mut Document) -> HistoryResult<()> {
        let batch = self.batch.take().ok_or(HistoryError::NoOpenBatch)?;
        let rollback = HistoryAction::batch(batch.description.clone(), batch.actions, 0);
        match rollback.revert(doc) {
            Ok(restored) => *doc = restored,
            Err(cause) => {
                self.report_desync(&rollback, ReplayDirection::Undo, cause);
            }
        }
        self.notify(&HistoryEvent::BatchDiscarded {
            description: batch.description,
        });
        Ok(())
    }

    /// Reverts the most recent action.
    pub fn undo(&mut self, doc: &mut Document) -> HistoryResult<Replay> {
        if self.batch.is_some() {
            return Err(HistoryError::BatchInProgress);
        }
        let Some(action) = self.past.pop_back() else {
            return Ok(Replay::Nothing);
        };

        match action.revert(doc) {
            Ok(restored) => {
                *doc = restored;
                info!(
                    "event=history_undo module=history status=ok kind={} past={} future={}",
                    action.kind(),
                    self.past.len(),
                    self.future.len() + 1
                );
                let event = HistoryEvent::Undone {
                    kind: action.kind(),
                    description: action.description().to_string(),
                };
                let replay = Replay::Applied {
                    kind: action.kind(),
                    description: action.description().to_string(),
                };
                self.future.push(action);
                self.notify(&event);
                Ok(replay)
            }
            Err(cause) => Ok(Replay::Desynced(self.report_desync(
                &action,
                ReplayDirection::Undo,
                cause,
            ))),
        }
    }

    /// Re-applies the most recently undone action.
    pub fn redo(&mut self, doc: &mut Document) -> HistoryResult<Replay> {
        if self.batch.is_some() {
            return Err(HistoryError::BatchInProgress);
        }
        let Some(action) = self.future.pop() else {
            return Ok(Replay::Nothing);
        };

        match action.replay(doc) {
            Ok(replayed) => {
                *doc = replayed;
                info!(
                    "event=history_redo module=history status=ok kind={} past={} future={}",
                    action.kind(),
                    self.past.len() + 1,
                    self.future.len()
                );
                let event = HistoryEvent::Redone {
                    kind: action.kind(),
                    description: action.description().to_string(),
                };
                let replay = Replay::Applied {
                    kind: action.kind(),
                    description: action.description().to_string(),
                };
                self.push_past(action);
                self.notify(&event);
                Ok(replay)
            }
            Err(cause) => Ok(Replay::Desynced(self.report_desync(
                &action,
                ReplayDirection::Redo,
                cause,
            ))),
        }
    }

    /// Drops both stacks and any open batch (document reset).
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.batch = None;
        self.notify(&HistoryEvent::Cleared);
    }

    fn record(&mut self, action: HistoryAction) {
        self.future.clear();
        info!(
            "event=history_commit module=history status=ok kind={} past={}",
            action.kind(),
            self.past.len() + 1
        );
        let event = HistoryEvent::Committed {
            kind: action.kind(),
            description: action.description().to_string(),
        };
        self.push_past(action);
        self.notify(&event);
    }

    fn push_past(&mut self, action: HistoryAction) {
        self.past.push_back(action);
        if let Some(max_depth) = self.max_depth {
            while self.past.len() > max_depth {
                self.past.pop_front();
                debug!(
                    "event=history_trim module=history status=ok max_depth={}",
                    max_depth
                );
            }
        }
    }

    fn report_desync(
        &mut self,
        action: &HistoryAction,
        direction: ReplayDirection,
        cause: PatchError,
    ) -> HistoryDesync {
        warn!(
            "event=history_desync module=history status=warning direction={} kind={} error={}",
            direction.as_str(),
            action.kind(),
            cause
        );
        let desync = HistoryDesync {
            kind: action.kind(),
            description: action.description().to_string(),
            direction,
            cause,
        };
        self.notify(&HistoryEvent::Desync(desync.clone()));
        desync
    }

    fn notify(&mut self, event: &HistoryEvent) {
        for observer in &mut self.observers {
            observer.on_event(event);
        }
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
