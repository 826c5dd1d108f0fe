//! Unit-agnostic length values stored on elements.
//!
//! # Responsibility
//! - Represent geometry as absolute pixels or a percentage of the canvas.
//! - Preserve unparseable stored values verbatim so load/export is lossless.
//!
//! # Invariants
//! - Stored `Px` and `Percent` values are finite. Non-finite input becomes
//!   zero in the constructors, on geometry changes and on the wire.
//! - Wire shape: pixels serialize as JSON numbers, percentages as `"N%"`,
//!   unparsed values as their original string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Reference canvas width in pixels.
pub const CANVAS_WIDTH: f64 = 960.0;
/// Reference canvas height in pixels.
pub const CANVAS_HEIGHT: f64 = 540.0;

static LENGTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(-?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)\s*(%|px)?\s*$")
        .expect("valid length regex")
});

/// One geometry value as stored in a slide document.
#[derive(Debug, Clone, PartialEq)]
pub enum Length {
    /// Absolute pixels in the 960x540 reference frame.
    Px(f64),
    /// Percentage of the axis extent (`50.0` means half).
    Percent(f64),
    /// Stored value that could not be parsed; resolves to the default.
    Unparsed(String),
}

impl Length {
    pub fn px(value: f64) -> Self {
        if value.is_finite() {
            Self::Px(value)
        } else {
            Self::Px(0.0)
        }
    }

    pub fn percent(value: f64) -> Self {
        if value.is_finite() {
            Self::Percent(value)
        } else {
            Self::Percent(0.0)
        }
    }

    /// Maps a non-finite `Px` or `Percent` to zero of the same unit.
    pub fn normalized(self) -> Self {
        match self {
            Self::Px(value) => Self::px(value),
            Self::Percent(value) => Self::percent(value),
            unparsed => unparsed,
        }
    }

    /// Parses `"12.5%"`, `"120px"` or a bare number.
    ///
    /// Never fails: anything else is kept as `Length::Unparsed`.
    pub fn parse(raw: &str) -> Self {
        let Some(caps) = LENGTH_RE.captures(raw) else {
            return Self::Unparsed(raw.to_string());
        };
        let number = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|value| value.is_finite());
        let Some(number) = number else {
            return Self::Unparsed(raw.to_string());
        };
        match caps.get(2).map(|m| m.as_str()) {
            Some("%") => Self::Percent(number),
            _ => Self::Px(number),
        }
    }

    pub fn is_percent(&self) -> bool {
        matches!(self, Self::Percent(_))
    }
}

impl Default for Length {
    fn default() -> Self {
        Self::Px(0.0)
    }
}

impl Display for Length {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Px(value) => write!(f, "{value}px"),
            Self::Percent(value) => write!(f, "{value}%"),
            Self::Unparsed(raw) => write!(f, "{raw}"),
        }
    }
}

impl Serialize for Length {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.clone().normalized() {
            Self::Px(value) => serializer.serialize_f64(value),
            Self::Percent(value) => serializer.serialize_str(&format!("{value}%")),
            Self::Unparsed(raw) => serializer.serialize_str(&raw),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLength {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Length {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawLength::deserialize(deserializer)? {
            RawLength::Number(value) => Ok(Self::px(value)),
            RawLength::Text(raw) => Ok(Self::parse(&raw)),
        }
    }
}

impl From<f64> for Length {
    fn from(value: f64) -> Self {
        Self::px(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Length;

    #[test]
    fn parse_accepts_percent_px_and_bare_numbers() {
        assert_eq!(Length::parse("12.5%"), Length::Percent(12.5));
        assert_eq!(Length::parse(" 120px "), Length::Px(120.0));
        assert_eq!(Length::parse("-4"), Length::Px(-4.0));
        assert_eq!(Length::parse(".5%"), Length::Percent(0.5));
    }

    #[test]
    fn parse_keeps_garbage_verbatim() {
        assert_eq!(
            Length::parse("auto"),
            Length::Unparsed("auto".to_string())
        );
        assert_eq!(Length::parse(""), Length::Unparsed(String::new()));
    }

    #[test]
    fn wire_shape_uses_numbers_for_px_and_strings_otherwise() {
        let values = vec![
            Length::Px(10.0),
            Length::Percent(25.0),
            Length::Unparsed("calc(1px)".to_string()),
        ];
        let json = serde_json::to_value(&values).expect("serialize lengths");
        assert_eq!(json, serde_json::json!([10.0, "25%", "calc(1px)"]));

        let decoded: Vec<Length> = serde_json::from_value(json).expect("decode lengths");
        assert_eq!(decoded, values);
    }

    #[test]
    fn non_finite_values_collapse_to_zero() {
        assert_eq!(Length::Px(f64::NAN).normalized(), Length::Px(0.0));
        assert_eq!(
            Length::Percent(f64::INFINITY).normalized(),
            Length::Percent(0.0)
        );

        let values = vec![Length::Px(f64::NAN), Length::Percent(f64::NEG_INFINITY)];
        let json = serde_json::to_value(&values).expect("serialize lengths");
        assert_eq!(json, serde_json::json!([0.0, "0%"]));
    }
}
