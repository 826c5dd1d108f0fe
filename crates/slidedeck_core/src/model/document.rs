//! Presentation document aggregate.
//!
//! # Responsibility
//! - Own the ordered slide sequence and expose read-only traversal.
//! - Apply structural patches as copy-on-write snapshots.
//!
//! # Invariants
//! - Slide ids are unique; element ids are unique within their slide.
//! - `apply_patch` never mutates `self`: it returns a new snapshot, sharing
//!   untouched slides/elements through `Arc`.
//! - Only the history engine applies patches (`pub(crate)` surface).

use crate::model::element::{Element, ElementId};
use crate::model::patch::{Patch, PatchError, PatchResult, PatchTarget};
use crate::model::slide::{Slide, SlideId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Errors for building a document from external data.
#[derive(Debug)]
pub enum DocumentError {
    /// Payload is not a valid document JSON shape.
    Json(serde_json::Error),
    /// Payload decoded but violates an id uniqueness invariant.
    Invalid(PatchError),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid document json: {err}"),
            Self::Invalid(err) => write!(f, "invalid document: {err}"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<PatchError> for DocumentError {
    fn from(value: PatchError) -> Self {
        Self::Invalid(value)
    }
}

/// Ordered slides of one presentation.
///
/// Deserializing always validates id uniqueness, whichever serde entry point
/// is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDocument")]
pub struct Document {
    slides: Vec<Arc<Slide>>,
}

/// Wire shape before id validation.
#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    slides: Vec<Arc<Slide>>,
}

impl TryFrom<RawDocument> for Document {
    type Error = PatchError;

    fn try_from(raw: RawDocument) -> PatchResult<Self> {
        let document = Self { slides: raw.slides };
        document.validate()?;
        Ok(document)
    }
}

impl Document {
    /// Builds a document after checking id uniqueness.
    pub fn new(slides: Vec<Slide>) -> PatchResult<Self> {
        let document = Self {
            slides: slides.into_iter().map(Arc::new).collect(),
        };
        document.validate()?;
        Ok(document)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Decodes and validates a document from JSON.
    pub fn from_json_str(raw: &str) -> Result<Self, DocumentError> {
        let raw: RawDocument = serde_json::from_str(raw)?;
        Ok(Self::try_from(raw)?)
    }

    /// Pure export of the current snapshot.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Checks slide and element id uniqueness.
    pub fn validate(&self) -> PatchResult<()> {
        let mut seen = HashSet::new();
        for slide in &self.slides {
            if !seen.insert(&slide.id) {
                return Err(PatchError::DuplicateSlide(slide.id.clone()));
            }
            if let Some(element_id) = slide.duplicate_element_id() {
                return Err(PatchError::DuplicateElement {
                    slide_id: slide.id.clone(),
                    element_id: element_id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slides(&self) -> impl ExactSizeIterator<Item = &Slide> + '_ {
        self.slides.iter().map(Arc::as_ref)
    }

    pub fn slide_ids(&self) -> Vec<SlideId> {
        self.slides.iter().map(|slide| slide.id.clone()).collect()
    }

    pub fn slide(&self, slide_id: &SlideId) -> Option<&Slide> {
        self.slides
            .iter()
            .map(Arc::as_ref)
            .find(|slide| &slide.id == slide_id)
    }

    pub fn slide_at(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index).map(Arc::as_ref)
    }

    pub fn slide_index(&self, slide_id: &SlideId) -> Option<usize> {
        self.slides.iter().position(|slide| &slide.id == slide_id)
    }

    pub fn element(&self, slide_id: &SlideId, element_id: &ElementId) -> Option<&Element> {
        self.slide(slide_id)?.element(element_id)
    }

    /// Applies `patch` to a copy of this snapshot.
    ///
    /// Returns the new snapshot and the patch that reverses it.
    ///
    /// # Errors
    /// - `NotFound` when the target slide/element does not exist.
    /// - `InvalidVariant` when an element field update is foreign to the
    ///   element's variant.
    /// - `IndexOutOfBounds` / `DuplicateSlide` / `DuplicateElement` for
    ///   inserts and moves that would break sequence invariants.
    pub(crate) fn apply_patch(&self, patch: &Patch) -> PatchResult<(Document, Patch)> {
        let mut next = self.clone();
        let inverse = next.apply_in_place(patch)?;
        Ok((next, inverse))
    }

    fn apply_in_place(&mut self, patch: &Patch) -> PatchResult<Patch> {
        match patch {
            Patch::UpdateElement {
                slide_id,
                element_id,
                change,
            } => {
                let slide = self.slide_mut(slide_id)?;
                let element = element_mut(slide, element_id)?;
                let previous = element.apply_change(change.clone())?;
                Ok(Patch::UpdateElement {
                    slide_id: slide_id.clone(),
                    element_id: element_id.clone(),
                    change: previous,
                })
            }
            Patch::InsertElement {
                slide_id,
                index,
                element,
            } => {
                let slide = self.slide_mut(slide_id)?;
                ensure_index(*index, slide.elements.len() + 1)?;
                if slide.element(&element.id).is_some() {
                    return Err(PatchError::DuplicateElement {
                        slide_id: slide_id.clone(),
                        element_id: element.id.clone(),
                    });
                }
                slide.elements.insert(*index, Arc::new(element.clone()));
                Ok(Patch::RemoveElement {
                    slide_id: slide_id.clone(),
                    element_id: element.id.clone(),
                })
            }
            Patch::RemoveElement {
                slide_id,
                element_id,
            } => {
                let slide = self.slide_mut(slide_id)?;
                let index = slide
                    .element_index(element_id)
                    .ok_or_else(|| element_not_found(slide_id, element_id))?;
                let removed = slide.elements.remove(index);
                Ok(Patch::InsertElement {
                    slide_id: slide_id.clone(),
                    index,
                    element: Arc::unwrap_or_clone(removed),
                })
            }
            Patch::InsertSlide { index, slide } => {
                ensure_index(*index, self.slides.len() + 1)?;
                if self.slide(&slide.id).is_some() {
                    return Err(PatchError::DuplicateSlide(slide.id.clone()));
                }
                if let Some(element_id) = slide.duplicate_element_id() {
                    return Err(PatchError::DuplicateElement {
                        slide_id: slide.id.clone(),
                        element_id: element_id.clone(),
                    });
                }
                self.slides.insert(*index, Arc::new(slide.clone()));
                Ok(Patch::RemoveSlide {
                    slide_id: slide.id.clone(),
                })
            }
            Patch::RemoveSlide { slide_id } => {
                let index = self
                    .slide_index(slide_id)
                    .ok_or_else(|| PatchError::NotFound(PatchTarget::Slide(slide_id.clone())))?;
                let removed = self.slides.remove(index);
                Ok(Patch::InsertSlide {
                    index,
                    slide: Arc::unwrap_or_clone(removed),
                })
            }
            Patch::MoveSlide { from, to } => {
                let len = self.slides.len();
                ensure_index(*from, len)?;
                ensure_index(*to, len)?;
                let slide = self.slides.remove(*from);
                self.slides.insert(*to, slide);
                Ok(Patch::MoveSlide {
                    from: *to,
                    to: *from,
                })
            }
            Patch::UpdateSlide { slide_id, change } => {
                let slide = self.slide_mut(slide_id)?;
                let previous = slide.apply_change(change.clone());
                Ok(Patch::UpdateSlide {
                    slide_id: slide_id.clone(),
                    change: previous,
                })
            }
        }
    }

    fn slide_mut(&mut self, slide_id: &SlideId) -> PatchResult<&mut Slide> {
        let index = self
            .slide_index(slide_id)
            .ok_or_else(|| PatchError::NotFound(PatchTarget::Slide(slide_id.clone())))?;
        Ok(Arc::make_mut(&mut self.slides[index]))
    }
}

fn element_mut<'a>(slide: &'a mut Slide, element_id: &ElementId) -> PatchResult<&'a mut Element> {
    let index = slide
        .element_index(element_id)
        .ok_or_else(|| element_not_found(&slide.id, element_id))?;
    Ok(Arc::make_mut(&mut slide.elements[index]))
}

fn element_not_found(slide_id: &SlideId, element_id: &ElementId) -> PatchError {
    PatchError::NotFound(PatchTarget::Element {
        slide_id: slide_id.clone(),
        element_id: element_id.clone(),
    })
}

fn ensure_index(index: usize, len: usize) -> PatchResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(PatchError::IndexOutOfBounds { index, len })
    }
}

#[cfg(test)]
mod tests {
    use super::Document;
    use crate::model::element::{Element, ElementChange, Geometry};
    use crate::model::patch::{Patch, PatchError};
    use crate::model::slide::{Slide, SlideId};

    fn deck() -> Document {
        Document::new(vec![
            Slide::new("s1").with_element(Element::text("t1", Geometry::default(), "Hello")),
            Slide::new("s2"),
            Slide::new("s3"),
        ])
        .expect("valid deck")
    }

    #[test]
    fn apply_patch_leaves_prior_snapshot_untouched() {
        let before = deck();
        let patch = Patch::UpdateElement {
            slide_id: "s1".into(),
            element_id: "t1".into(),
            change: ElementChange::Content("Changed".to_string()),
        };

        let (after, inverse) = before.apply_patch(&patch).expect("patch applies");

        assert_eq!(
            before.element(&"s1".into(), &"t1".into()).and_then(Element::content),
            Some("Hello")
        );
        assert_eq!(
            after.element(&"s1".into(), &"t1".into()).and_then(Element::content),
            Some("Changed")
        );

        let (restored, _) = after.apply_patch(&inverse).expect("inverse applies");
        assert_eq!(restored, before);
    }

    #[test]
    fn untouched_slides_are_shared_between_snapshots() {
        let before = deck();
        let patch = Patch::UpdateElement {
            slide_id: "s1".into(),
            element_id: "t1".into(),
            change: ElementChange::Content("x".to_string()),
        };
        let (after, _) = before.apply_patch(&patch).expect("patch applies");

        assert!(std::sync::Arc::ptr_eq(&before.slides[1], &after.slides[1]));
        assert!(!std::sync::Arc::ptr_eq(&before.slides[0], &after.slides[0]));
    }

    #[test]
    fn move_slide_inverse_restores_order() {
        let before = deck();
        let (after, inverse) = before
            .apply_patch(&Patch::MoveSlide { from: 2, to: 0 })
            .expect("move applies");
        assert_eq!(
            after.slide_ids(),
            vec![SlideId::new("s3"), SlideId::new("s1"), SlideId::new("s2")]
        );

        let (restored, _) = after.apply_patch(&inverse).expect("inverse applies");
        assert_eq!(restored, before);
    }

    #[test]
    fn insert_rejects_duplicate_and_out_of_range() {
        let before = deck();
        let duplicate = before
            .apply_patch(&Patch::InsertSlide {
                index: 0,
                slide: Slide::new("s2"),
            })
            .expect_err("duplicate id rejected");
        assert_eq!(duplicate, PatchError::DuplicateSlide("s2".into()));

        let out_of_range = before
            .apply_patch(&Patch::InsertSlide {
                index: 9,
                slide: Slide::new("s9"),
            })
            .expect_err("index rejected");
        assert_eq!(out_of_range, PatchError::IndexOutOfBounds { index: 9, len: 4 });
    }

    #[test]
    fn new_rejects_duplicate_element_ids() {
        let err = Document::new(vec![Slide::new("s1")
            .with_element(Element::text("t1", Geometry::default(), "a"))
            .with_element(Element::text("t1", Geometry::default(), "b"))])
        .expect_err("duplicate element ids rejected");
        assert!(matches!(err, PatchError::DuplicateElement { .. }));
    }

    #[test]
    fn every_serde_entry_point_rejects_duplicate_ids() {
        let value = serde_json::json!({
            "slides": [
                { "id": "s", "elements": [] },
                { "id": "s", "elements": [] }
            ]
        });
        let err = serde_json::from_value::<Document>(value).expect_err("duplicate slides");
        assert!(err.to_string().contains("slide id already exists"));

        #[derive(serde::Deserialize)]
        struct Envelope {
            deck: Document,
        }
        let nested = r#"{"deck": {"slides": [{"id": "a", "elements": [
            {"id": "e", "type": "text", "content": ""},
            {"id": "e", "type": "text", "content": ""}
        ]}]}}"#;
        assert!(serde_json::from_str::<Envelope>(nested).is_err());

        let empty: Document = serde_json::from_str("{}").expect("slides default to empty");
        assert!(empty.is_empty());
    }
}
