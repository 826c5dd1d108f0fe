//! Recorded history actions.
//!
//! # Invariants
//! - A single action stores the forward patch and the inverse produced by
//!   actually applying it, so replaying the inverse restores the prior
//!   state by value.
//! - A batch replays its sub-actions in reverse order on undo and in
//!   original order on redo, on a working snapshot (all-or-nothing).

use crate::model::document::Document;
use crate::model::patch::{Patch, PatchResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// History action category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ElementUpdate,
    ElementAdd,
    ElementDelete,
    SlideAdd,
    SlideDelete,
    SlideReorder,
    SlideUpdate,
    Batch,
}

impl ActionKind {
    /// Category of the action that records `patch`.
    pub fn for_patch(patch: &Patch) -> Self {
        match patch {
            Patch::UpdateElement { .. } => Self::ElementUpdate,
            Patch::InsertElement { .. } => Self::ElementAdd,
            Patch::RemoveElement { .. } => Self::ElementDelete,
            Patch::InsertSlide { .. } => Self::SlideAdd,
            Patch::RemoveSlide { .. } => Self::SlideDelete,
            Patch::MoveSlide { .. } => Self::SlideReorder,
            Patch::UpdateSlide { .. } => Self::SlideUpdate,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ElementUpdate => "element_update",
            Self::ElementAdd => "element_add",
            Self::ElementDelete => "element_delete",
            Self::SlideAdd => "slide_add",
            Self::SlideDelete => "slide_delete",
            Self::SlideReorder => "slide_reorder",
            Self::SlideUpdate => "slide_update",
            Self::Batch => "batch",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller request to record one patch.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDraft {
    pub description: String,
    pub patch: Patch,
}

impl ActionDraft {
    pub fn new(description: impl Into<String>, patch: Patch) -> Self {
        Self {
            description: description.into(),
            patch,
        }
    }
}

/// Replayable payload of an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "body", rename_all = "snake_case")]
pub enum ActionBody {
    Single { forward: Patch, inverse: Patch },
    Batch { actions: Vec<HistoryAction> },
}

/// One entry on the undo/redo stacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryAction {
    #[serde(rename = "type")]
    kind: ActionKind,
    description: String,
    /// Unix epoch milliseconds when the action was recorded.
    timestamp_ms: i64,
    #[serde(flatten)]
    body: ActionBody,
}

impl HistoryAction {
    pub(crate) fn single(
        description: String,
        forward: Patch,
        inverse: Patch,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            kind: ActionKind::for_patch(&forward),
            description,
            timestamp_ms,
            body: ActionBody::Single { forward, inverse },
        }
    }

    pub(crate) fn batch(description: String, actions: Vec<HistoryAction>, timestamp_ms: i64) -> Self {
        Self {
            kind: ActionKind::Batch,
            description,
            timestamp_ms,
            body: ActionBody::Batch { actions },
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn body(&self) -> &ActionBody {
        &self.body
    }

    /// Sub-actions of a batch; empty for single actions.
    pub fn sub_actions(&self) -> &[HistoryAction] {
        match &self.body {
            ActionBody::Single { .. } => &[],
            ActionBody::Batch { actions } => actions.as_slice(),
        }
    }

    /// Returns `doc` with this action reverted.
    pub(crate) fn revert(&self, doc: &Document) -> PatchResult<Document> {
        match &self.body {
            ActionBody::Single { inverse, .. } => Ok(doc.apply_patch(inverse)?.0),
            ActionBody::Batch { actions } => actions
                .iter()
                .rev()
                .try_fold(doc.clone(), |working, action| action.revert(&working)),
        }
    }

    /// Returns `doc` with this action re-applied.
    pub(crate) fn replay(&self, doc: &Document) -> PatchResult<Document> {
        match &self.body {
            ActionBody::Single { forward, .. } => Ok(doc.apply_patch(forward)?.0),
            ActionBody::Batch { actions } => actions
                .iter()
                .try_fold(doc.clone(), |working, action| action.replay(&working)),
        }
    }
}
