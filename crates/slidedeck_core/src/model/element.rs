//! Slide element domain model.
//!
//! # Responsibility
//! - Define the closed set of element variants placed on a slide.
//! - Apply typed field changes and hand back the previous value.
//!
//! # Invariants
//! - Every element carries exactly one variant tag (`type` on the wire).
//! - A field change foreign to the element's variant is rejected before any
//!   mutation happens.
//! - Rich content is an opaque string; it is never parsed here.

use crate::model::length::Length;
use crate::model::patch::{PatchError, PatchResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque element identifier, unique within its slide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh random id for newly created elements.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ElementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Variant tag of an element, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Text,
    Image,
    Shape,
    Table,
    List,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Shape => "shape",
            Self::Table => "table",
            Self::List => "list",
        }
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }
}

/// Inline style overrides for text-like elements.
///
/// Every field is optional; absent values fall back to resolver defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Length>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
}

/// How an image fills its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFit {
    #[default]
    Cover,
    Contain,
    Fill,
}

impl ImageFit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
            Self::Fill => "fill",
        }
    }
}

/// Geometric primitive drawn by a shape element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    RoundedRectangle,
    Ellipse,
    Line,
    Arrow,
}

/// Position and size of an element on the canvas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub x: Length,
    #[serde(default)]
    pub y: Length,
    #[serde(default)]
    pub width: Length,
    #[serde(default)]
    pub height: Length,
}

impl Geometry {
    pub fn new(
        x: impl Into<Length>,
        y: impl Into<Length>,
        width: impl Into<Length>,
        height: impl Into<Length>,
    ) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            width: width.into(),
            height: height.into(),
        }
    }
}

/// Variant-specific payload of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementBody {
    Text {
        /// Serialized rich content (HTML-like), opaque to the core.
        content: String,
        #[serde(default)]
        style: TextStyle,
    },
    Image {
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
        #[serde(default)]
        fit: ImageFit,
    },
    Shape {
        #[serde(default)]
        shape: ShapeKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
    },
    Table {
        #[serde(default)]
        rows: Vec<Vec<String>>,
        #[serde(default)]
        style: TextStyle,
    },
    List {
        /// Serialized list markup, opaque to the core.
        content: String,
        #[serde(default)]
        ordered: bool,
        #[serde(default)]
        style: TextStyle,
    },
}

impl ElementBody {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Text { .. } => ElementKind::Text,
            Self::Image { .. } => ElementKind::Image,
            Self::Shape { .. } => ElementKind::Shape,
            Self::Table { .. } => ElementKind::Table,
            Self::List { .. } => ElementKind::List,
        }
    }
}

/// One positioned element on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(flatten)]
    pub body: ElementBody,
}

impl Element {
    pub fn new(id: impl Into<ElementId>, geometry: Geometry, body: ElementBody) -> Self {
        Self {
            id: id.into(),
            geometry,
            body,
        }
    }

    /// Creates a text element with default style.
    pub fn text(id: impl Into<ElementId>, geometry: Geometry, content: impl Into<String>) -> Self {
        Self::new(
            id,
            geometry,
            ElementBody::Text {
                content: content.into(),
                style: TextStyle::default(),
            },
        )
    }

    /// Creates an image element that covers its frame.
    pub fn image(id: impl Into<ElementId>, geometry: Geometry, src: impl Into<String>) -> Self {
        Self::new(
            id,
            geometry,
            ElementBody::Image {
                src: src.into(),
                alt: None,
                fit: ImageFit::Cover,
            },
        )
    }

    pub fn kind(&self) -> ElementKind {
        self.body.kind()
    }

    /// Returns rich content for text-like variants.
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            ElementBody::Text { content, .. } | ElementBody::List { content, .. } => {
                Some(content.as_str())
            }
            _ => None,
        }
    }

    /// Returns inline style overrides for variants that carry them.
    pub fn text_style(&self) -> Option<&TextStyle> {
        match &self.body {
            ElementBody::Text { style, .. }
            | ElementBody::Table { style, .. }
            | ElementBody::List { style, .. } => Some(style),
            _ => None,
        }
    }

    /// Whether the element can host a rich-text editing surface.
    pub fn is_text_like(&self) -> bool {
        self.content().is_some()
    }

    /// Applies one field change and returns the change that restores the
    /// previous value.
    ///
    /// # Errors
    /// - `PatchError::InvalidVariant` when the field does not exist on this
    ///   element's variant. The element is left untouched in that case.
    pub(crate) fn apply_change(&mut self, change: ElementChange) -> PatchResult<ElementChange> {
        let kind = self.kind();
        let field = change.field_name();
        let previous = match (change, &mut self.body) {
            (ElementChange::Position { x, y }, _) => ElementChange::Position {
                x: std::mem::replace(&mut self.geometry.x, x.normalized()),
                y: std::mem::replace(&mut self.geometry.y, y.normalized()),
            },
            (ElementChange::Size { width, height }, _) => ElementChange::Size {
                width: std::mem::replace(&mut self.geometry.width, width.normalized()),
                height: std::mem::replace(&mut self.geometry.height, height.normalized()),
            },
            (
                ElementChange::Content(value),
                ElementBody::Text { content, .. } | ElementBody::List { content, .. },
            ) => ElementChange::Content(std::mem::replace(content, value)),
            (
                ElementChange::TextStyle(value),
                ElementBody::Text { style, .. }
                | ElementBody::Table { style, .. }
                | ElementBody::List { style, .. },
            ) => ElementChange::TextStyle(std::mem::replace(style, value)),
            (ElementChange::Source(value), ElementBody::Image { src, .. }) => {
                ElementChange::Source(std::mem::replace(src, value))
            }
            (ElementChange::Alt(value), ElementBody::Image { alt, .. }) => {
                ElementChange::Alt(std::mem::replace(alt, value))
            }
            (ElementChange::Fit(value), ElementBody::Image { fit, .. }) => {
                ElementChange::Fit(std::mem::replace(fit, value))
            }
            (ElementChange::ShapeKind(value), ElementBody::Shape { shape, .. }) => {
                ElementChange::ShapeKind(std::mem::replace(shape, value))
            }
            (ElementChange::Fill(value), ElementBody::Shape { fill, .. }) => {
                ElementChange::Fill(std::mem::replace(fill, value))
            }
            (ElementChange::Stroke(value), ElementBody::Shape { stroke, .. }) => {
                ElementChange::Stroke(std::mem::replace(stroke, value))
            }
            (ElementChange::Rows(value), ElementBody::Table { rows, .. }) => {
                ElementChange::Rows(std::mem::replace(rows, value))
            }
            (ElementChange::Ordered(value), ElementBody::List { ordered, .. }) => {
                ElementChange::Ordered(std::mem::replace(ordered, value))
            }
            _ => {
                return Err(PatchError::InvalidVariant {
                    element_id: self.id.clone(),
                    kind,
                    field,
                })
            }
        };
        Ok(previous)
    }
}

/// Typed update of one element field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ElementChange {
    Position { x: Length, y: Length },
    Size { width: Length, height: Length },
    Content(String),
    TextStyle(TextStyle),
    Source(String),
    Alt(Option<String>),
    Fit(ImageFit),
    ShapeKind(ShapeKind),
    Fill(Option<String>),
    Stroke(Option<String>),
    Rows(Vec<Vec<String>>),
    Ordered(bool),
}

impl ElementChange {
    /// Stable wire name of the targeted field.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Position { .. } => "position",
            Self::Size { .. } => "size",
            Self::Content(_) => "content",
            Self::TextStyle(_) => "text_style",
            Self::Source(_) => "source",
            Self::Alt(_) => "alt",
            Self::Fit(_) => "fit",
            Self::ShapeKind(_) => "shape_kind",
            Self::Fill(_) => "fill",
            Self::Stroke(_) => "stroke",
            Self::Rows(_) => "rows",
            Self::Ordered(_) => "ordered",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Element, ElementBody, ElementChange, ElementKind, Geometry, Length};
    use crate::model::patch::PatchError;

    #[test]
    fn content_change_returns_previous_value() {
        let mut element = Element::text("t1", Geometry::default(), "Hello");
        let previous = element
            .apply_change(ElementChange::Content("Hello World".to_string()))
            .expect("text accepts content");

        assert_eq!(previous, ElementChange::Content("Hello".to_string()));
        assert_eq!(element.content(), Some("Hello World"));
    }

    #[test]
    fn foreign_field_is_rejected_without_mutation() {
        let mut element = Element::image("img", Geometry::default(), "a.png");
        let before = element.clone();

        let err = element
            .apply_change(ElementChange::Content("text".to_string()))
            .expect_err("image has no content");

        assert_eq!(
            err,
            PatchError::InvalidVariant {
                element_id: "img".into(),
                kind: ElementKind::Image,
                field: "content",
            }
        );
        assert_eq!(element, before);
    }

    #[test]
    fn wire_shape_flattens_geometry_and_tags_variant() {
        let element = Element::text(
            "t1",
            Geometry::new(Length::Percent(10.0), 20.0, 300.0, Length::Percent(5.0)),
            "<p>Hi</p>",
        );
        let json = serde_json::to_value(&element).expect("serialize element");

        assert_eq!(json["type"], "text");
        assert_eq!(json["id"], "t1");
        assert_eq!(json["x"], "10%");
        assert_eq!(json["y"], 20.0);
        assert_eq!(json["content"], "<p>Hi</p>");

        let decoded: Element = serde_json::from_value(json).expect("decode element");
        assert_eq!(decoded, element);
        assert!(matches!(decoded.body, ElementBody::Text { .. }));
    }
}
