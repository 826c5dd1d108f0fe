//! Rich-text editor context.
//!
//! # Responsibility
//! - Hold the single attached rich-text editing surface.
//! - Turn serialized surface content into `element_update` drafts with a
//!   readable description.
//!
//! # Invariants
//! - At most one surface is attached at a time.
//! - Content is an opaque string; it is only inspected to build a preview.
//! - Saving content identical to the stored value produces no draft.

use crate::history::action::ActionDraft;
use crate::model::document::Document;
use crate::model::element::{ElementChange, ElementId};
use crate::model::patch::{Patch, PatchError, PatchTarget};
use crate::model::slide::SlideId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Identity of one attached editing surface; also its coalescing key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SurfaceHandle {
    pub slide_id: SlideId,
    pub element_id: ElementId,
}

impl SurfaceHandle {
    pub fn new(slide_id: impl Into<SlideId>, element_id: impl Into<ElementId>) -> Self {
        Self {
            slide_id: slide_id.into(),
            element_id: element_id.into(),
        }
    }
}

impl Display for SurfaceHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.slide_id, self.element_id)
    }
}

/// Editor context errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// `save`/`input` without an attached surface.
    NoActiveSurface,
    /// Surface target is missing or cannot hold rich content.
    Target(PatchError),
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoActiveSurface => write!(f, "no editing surface is attached"),
            Self::Target(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoActiveSurface => None,
            Self::Target(err) => Some(err),
        }
    }
}

impl From<PatchError> for EditorError {
    fn from(value: PatchError) -> Self {
        Self::Target(value)
    }
}

/// Single-surface rich-text context.
#[derive(Debug, Clone)]
pub struct EditorContext {
    active: Option<SurfaceHandle>,
    preview_chars: usize,
}

impl EditorContext {
    pub fn new(preview_chars: usize) -> Self {
        Self {
            active: None,
            preview_chars,
        }
    }

    pub fn active(&self) -> Option<&SurfaceHandle> {
        self.active.as_ref()
    }

    /// Attaches `surface` and returns the previously attached one.
    ///
    /// The caller flushes outstanding input for the returned handle.
    pub fn attach(&mut self, surface: SurfaceHandle) -> Option<SurfaceHandle> {
        self.active.replace(surface)
    }

    pub fn detach(&mut self) -> Option<SurfaceHandle> {
        self.active.take()
    }

    /// Checks that `surface` targets an existing text-like element.
    pub fn check_target(document: &Document, surface: &SurfaceHandle) -> Result<(), EditorError> {
        let element = document
            .element(&surface.slide_id, &surface.element_id)
            .ok_or_else(|| {
                PatchError::NotFound(PatchTarget::Element {
                    slide_id: surface.slide_id.clone(),
                    element_id: surface.element_id.clone(),
                })
            })?;
        if !element.is_text_like() {
            return Err(PatchError::InvalidVariant {
                element_id: element.id.clone(),
                kind: element.kind(),
                field: "content",
            }
            .into());
        }
        Ok(())
    }

    /// Builds the blur-time draft for the attached surface.
    pub fn save_draft(
        &self,
        document: &Document,
        content: &str,
    ) -> Result<Option<ActionDraft>, EditorError> {
        let surface = self.active.as_ref().ok_or(EditorError::NoActiveSurface)?;
        self.content_draft(document, surface, content)
    }

    /// Builds an `element_update` draft replacing `surface` content.
    ///
    /// Returns `Ok(None)` when the stored content already equals `content`.
    pub fn content_draft(
        &self,
        document: &Document,
        surface: &SurfaceHandle,
        content: &str,
    ) -> Result<Option<ActionDraft>, EditorError> {
        Self::check_target(document, surface)?;
        let current = document
            .element(&surface.slide_id, &surface.element_id)
            .and_then(|element| element.content());
        if current == Some(content) {
            return Ok(None);
        }

        let preview = derive_text_preview(content, self.preview_chars);
        Ok(Some(ActionDraft::new(
            format!("Edit text of {}: \"{}\"", surface.element_id, preview),
            Patch::UpdateElement {
                slide_id: surface.slide_id.clone(),
                element_id: surface.element_id.clone(),
                change: ElementChange::Content(content.to_string()),
            },
        )))
    }
}

/// Derives a short plain-text preview from serialized rich content.
///
/// Tags are removed, common entities decoded, whitespace collapsed and the
/// result truncated to `max_chars` characters with a trailing `...`.
pub fn derive_text_preview(content: &str, max_chars: usize) -> String {
    let without_tags = HTML_TAG_RE.replace_all(content, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&");
    let normalized = WHITESPACE_RE.replace_all(&decoded, " ");
    let trimmed = normalized.trim();

    let mut preview: String = trimmed.chars().take(max_chars).collect();
    if trimmed.chars().count() > max_chars {
        preview.push_str("...");
    }
    preview
}
