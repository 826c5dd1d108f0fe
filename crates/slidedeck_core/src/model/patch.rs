//! Structural patches over the document model.
//!
//! # Responsibility
//! - Describe one minimal structural change to a `Document`.
//! - Define the error taxonomy for rejected patches.
//!
//! # Invariants
//! - Applying a patch yields the inverse patch that restores the prior state
//!   by value.
//! - A rejected patch leaves the document unchanged.

use crate::model::element::{Element, ElementChange, ElementId, ElementKind};
use crate::model::slide::{Slide, SlideChange, SlideId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PatchResult<T> = Result<T, PatchError>;

/// One structural change, serialized with an `op` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Patch {
    UpdateElement {
        slide_id: SlideId,
        element_id: ElementId,
        change: ElementChange,
    },
    InsertElement {
        slide_id: SlideId,
        index: usize,
        element: Element,
    },
    RemoveElement {
        slide_id: SlideId,
        element_id: ElementId,
    },
    InsertSlide {
        index: usize,
        slide: Slide,
    },
    RemoveSlide {
        slide_id: SlideId,
    },
    MoveSlide {
        from: usize,
        to: usize,
    },
    UpdateSlide {
        slide_id: SlideId,
        change: SlideChange,
    },
}

impl Patch {
    /// Short metadata-only label for logs (never includes content).
    pub fn target_label(&self) -> String {
        match self {
            Self::UpdateElement {
                slide_id,
                element_id,
                change,
            } => format!("{slide_id}/{element_id}.{}", change.field_name()),
            Self::InsertElement {
                slide_id, element, ..
            } => format!("{slide_id}/{}", element.id),
            Self::RemoveElement {
                slide_id,
                element_id,
            } => format!("{slide_id}/{element_id}"),
            Self::InsertSlide { slide, .. } => slide.id.to_string(),
            Self::RemoveSlide { slide_id } => slide_id.to_string(),
            Self::MoveSlide { from, to } => format!("{from}->{to}"),
            Self::UpdateSlide { slide_id, change } => {
                format!("{slide_id}.{}", change.field_name())
            }
        }
    }
}

/// Missing patch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchTarget {
    Slide(SlideId),
    Element {
        slide_id: SlideId,
        element_id: ElementId,
    },
}

impl Display for PatchTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Slide(id) => write!(f, "slide `{id}`"),
            Self::Element {
                slide_id,
                element_id,
            } => write!(f, "element `{element_id}` on slide `{slide_id}`"),
        }
    }
}

/// Reasons a patch is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// Target slide or element does not exist.
    NotFound(PatchTarget),
    /// Field does not belong to the element's variant.
    InvalidVariant {
        element_id: ElementId,
        kind: ElementKind,
        field: &'static str,
    },
    /// Insert or move index outside the current sequence.
    IndexOutOfBounds { index: usize, len: usize },
    /// Inserted slide id already exists in the document.
    DuplicateSlide(SlideId),
    /// Inserted element id already exists on the slide.
    DuplicateElement {
        slide_id: SlideId,
        element_id: ElementId,
    },
}

impl PatchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for PatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(target) => write!(f, "patch target not found: {target}"),
            Self::InvalidVariant {
                element_id,
                kind,
                field,
            } => write!(
                f,
                "field `{field}` is not valid for {kind} element `{element_id}`"
            ),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::DuplicateSlide(id) => write!(f, "slide id already exists: {id}"),
            Self::DuplicateElement {
                slide_id,
                element_id,
            } => write!(
                f,
                "element id already exists on slide `{slide_id}`: {element_id}"
            ),
        }
    }
}

impl Error for PatchError {}
