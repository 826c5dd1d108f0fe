//! Slide domain model.
//!
//! # Invariants
//! - Element order is z-order (first is bottom-most) and is significant.
//! - Element ids are unique within one slide.

use crate::model::element::{Element, ElementId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Opaque slide identifier, unique within a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlideId(String);

impl SlideId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh random id for newly created slides.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for SlideId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlideId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Stored background descriptor (`{"kind": ..., "value": ...}` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Background {
    Color(String),
    Gradient(String),
    Image(String),
}

/// One slide: background plus an ordered element stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub id: SlideId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub(crate) elements: Vec<Arc<Element>>,
}

impl Slide {
    pub fn new(id: impl Into<SlideId>) -> Self {
        Self {
            id: id.into(),
            background: None,
            notes: None,
            elements: Vec::new(),
        }
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    /// Appends an element while building a slide outside of history.
    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(Arc::new(element));
        self
    }

    pub fn elements(&self) -> impl ExactSizeIterator<Item = &Element> + '_ {
        self.elements.iter().map(Arc::as_ref)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn element(&self, element_id: &ElementId) -> Option<&Element> {
        self.elements
            .iter()
            .map(Arc::as_ref)
            .find(|element| &element.id == element_id)
    }

    pub fn element_index(&self, element_id: &ElementId) -> Option<usize> {
        self.elements
            .iter()
            .position(|element| &element.id == element_id)
    }

    /// Returns the first element id that appears more than once.
    pub(crate) fn duplicate_element_id(&self) -> Option<&ElementId> {
        let mut seen = std::collections::HashSet::new();
        self.elements
            .iter()
            .map(|element| &element.id)
            .find(|id| !seen.insert(*id))
    }
}

/// Typed update of one slide field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum SlideChange {
    Background(Option<Background>),
    Notes(Option<String>),
}

impl SlideChange {
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Background(_) => "background",
            Self::Notes(_) => "notes",
        }
    }
}

impl Slide {
    pub(crate) fn apply_change(&mut self, change: SlideChange) -> SlideChange {
        match change {
            SlideChange::Background(value) => {
                SlideChange::Background(std::mem::replace(&mut self.background, value))
            }
            SlideChange::Notes(value) => {
                SlideChange::Notes(std::mem::replace(&mut self.notes, value))
            }
        }
    }
}
