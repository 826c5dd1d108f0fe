//! Style resolution from stored descriptors to render geometry.
//!
//! # Responsibility
//! - Convert unit-agnostic lengths into canvas pixels.
//! - Map background descriptors and partial text styles into CSS-like
//!   style maps.
//!
//! # Invariants
//! - Every function is total: malformed input degrades to a default
//!   (`0` pixels, `#ffffff` background, `#000000` text) instead of failing.
//! - Output depends only on input (no clock, locale or global state).
//! - `resolve_length(&to_percentage(px, e), e)` reproduces `px` within
//!   `1e-6` for finite `px` and `e > 0`.

use crate::model::element::{Element, ElementBody, TextAlign, TextStyle};
use crate::model::length::{Length, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::model::slide::Background;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

/// Default background color for slides without a usable descriptor.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";
/// Default text color.
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
/// Default font size in pixels.
pub const DEFAULT_FONT_SIZE_PX: f64 = 18.0;

static COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})|(?:rgba?|hsla?)\([^()]*\)|[a-zA-Z]+)$",
    )
    .expect("valid color regex")
});
static GRADIENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:repeating-)?(?:linear|radial|conic)-gradient\(.*\)$")
        .expect("valid gradient regex")
});

/// CSS-like property map with deterministic ordering.
pub type StyleMap = BTreeMap<String, String>;

/// Absolute pixel frame of one element on the reference canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Fully resolved text style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTextStyle {
    pub color: String,
    pub align: TextAlign,
    pub font_size_px: f64,
    pub bold: bool,
    pub italic: bool,
}

impl ResolvedTextStyle {
    pub fn to_style_map(&self) -> StyleMap {
        let mut map = StyleMap::new();
        map.insert("color".to_string(), self.color.clone());
        map.insert("text-align".to_string(), self.align.as_str().to_string());
        map.insert("font-size".to_string(), px(self.font_size_px));
        map.insert(
            "font-weight".to_string(),
            if self.bold { "700" } else { "400" }.to_string(),
        );
        map.insert(
            "font-style".to_string(),
            if self.italic { "italic" } else { "normal" }.to_string(),
        );
        map
    }
}

/// Resolves a stored length against an axis extent in pixels.
///
/// Unparsed values, non-finite numbers and unusable extents resolve to `0`.
pub fn resolve_length(value: &Length, extent: f64) -> f64 {
    let resolved = match value {
        Length::Px(px) => *px,
        Length::Percent(percent) => {
            if !extent.is_finite() || extent < 0.0 {
                return 0.0;
            }
            percent / 100.0 * extent
        }
        Length::Unparsed(_) => 0.0,
    };
    if resolved.is_finite() {
        resolved
    } else {
        0.0
    }
}

/// Convenience for raw stored strings such as `"25%"`.
pub fn resolve_length_str(raw: &str, extent: f64) -> f64 {
    resolve_length(&Length::parse(raw), extent)
}

/// Expresses an absolute pixel value as a percentage of `extent`.
///
/// Non-positive or non-finite extents yield `0%`.
pub fn to_percentage(px: f64, extent: f64) -> Length {
    if !extent.is_finite() || extent <= 0.0 || !px.is_finite() {
        return Length::Percent(0.0);
    }
    Length::percent(px / extent * 100.0)
}

/// Resolves all four geometry fields against the reference canvas.
pub fn resolve_frame(element: &Element) -> Frame {
    let geometry = &element.geometry;
    Frame {
        x: resolve_length(&geometry.x, CANVAS_WIDTH),
        y: resolve_length(&geometry.y, CANVAS_HEIGHT),
        width: resolve_length(&geometry.width, CANVAS_WIDTH).max(0.0),
        height: resolve_length(&geometry.height, CANVAS_HEIGHT).max(0.0),
    }
}

/// Maps a background descriptor to render properties.
///
/// Absent or malformed descriptors resolve to an opaque white fill.
pub fn resolve_background(descriptor: Option<&Background>) -> StyleMap {
    let mut map = StyleMap::new();
    map.insert(
        "background-color".to_string(),
        DEFAULT_BACKGROUND.to_string(),
    );

    match descriptor {
        Some(Background::Color(value)) => {
            if let Some(color) = valid_color(value) {
                map.insert("background-color".to_string(), color);
            }
        }
        Some(Background::Gradient(value)) => {
            let trimmed = value.trim();
            if GRADIENT_RE.is_match(trimmed) {
                map.insert("background-image".to_string(), trimmed.to_string());
            }
        }
        Some(Background::Image(value)) => {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                map.insert(
                    "background-image".to_string(),
                    format!("url(\"{}\")", trimmed.replace('"', "%22")),
                );
                map.insert("background-position".to_string(), "center".to_string());
                map.insert("background-repeat".to_string(), "no-repeat".to_string());
                map.insert("background-size".to_string(), "cover".to_string());
            }
        }
        None => {}
    }
    map
}

/// Normalizes a partial text style record, filling every default.
pub fn resolve_style(style: &TextStyle) -> ResolvedTextStyle {
    let font_size_px = style
        .font_size
        .as_ref()
        .map(|size| resolve_length(size, CANVAS_HEIGHT))
        .filter(|size| *size > 0.0)
        .unwrap_or(DEFAULT_FONT_SIZE_PX);

    ResolvedTextStyle {
        color: style
            .color
            .as_deref()
            .and_then(valid_color)
            .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
        align: style.align.unwrap_or_default(),
        font_size_px,
        bold: style.bold.unwrap_or(false),
        italic: style.italic.unwrap_or(false),
    }
}

/// Full render style for one element: absolute frame plus variant styling.
pub fn resolve_element_style(element: &Element) -> StyleMap {
    let frame = resolve_frame(element);
    let mut map = StyleMap::new();
    map.insert("position".to_string(), "absolute".to_string());
    map.insert("left".to_string(), px(frame.x));
    map.insert("top".to_string(), px(frame.y));
    map.insert("width".to_string(), px(frame.width));
    map.insert("height".to_string(), px(frame.height));

    if let Some(style) = element.text_style() {
        map.extend(resolve_style(style).to_style_map());
    }

    match &element.body {
        ElementBody::Image { fit, .. } => {
            map.insert("object-fit".to_string(), fit.as_str().to_string());
        }
        ElementBody::Shape { fill, stroke, .. } => {
            if let Some(color) = fill.as_deref().and_then(valid_color) {
                map.insert("background-color".to_string(), color);
            }
            if let Some(color) = stroke.as_deref().and_then(valid_color) {
                map.insert("border".to_string(), format!("1px solid {color}"));
            }
        }
        _ => {}
    }
    map
}

fn valid_color(value: &str) -> Option<String> {
    let trimmed = value.trim();
    COLOR_RE.is_match(trimmed).then(|| trimmed.to_string())
}

fn px(value: f64) -> String {
    format!("{value}px")
}
