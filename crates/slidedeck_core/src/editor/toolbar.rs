//! Read-only toolbar projection of history state.

use crate::history::action::HistoryAction;
use crate::history::engine::HistoryEngine;
use serde::Serialize;

/// Undo/redo indicator state, recomputed after every history change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ToolbarState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub pending_undo_description: Option<String>,
    pub pending_redo_description: Option<String>,
}

impl ToolbarState {
    pub fn from_history(history: &HistoryEngine) -> Self {
        Self {
            can_undo: history.can_undo(),
            can_redo: history.can_redo(),
            pending_undo_description: history
                .peek_undo()
                .map(HistoryAction::description)
                .map(str::to_string),
            pending_redo_description: history
                .peek_redo()
                .map(HistoryAction::description)
                .map(str::to_string),
        }
    }

    /// Tooltip text for the undo button.
    pub fn undo_label(&self) -> String {
        match &self.pending_undo_description {
            Some(description) => format!("Undo: {description}"),
            None => "Nothing to undo".to_string(),
        }
    }

    /// Tooltip text for the redo button.
    pub fn redo_label(&self) -> String {
        match &self.pending_redo_description {
            Some(description) => format!("Redo: {description}"),
            None => "Nothing to redo".to_string(),
        }
    }
}
