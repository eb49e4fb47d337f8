//! Symbolic lengths and their resolution against a viewport.
//!
//! A [`Length`] is what callers write into layer props: a plain number, a
//! percentage, a pixel literal, a viewport keyword or a reference to another
//! layer's geometry. Everything but references resolves here; references
//! need a layer registry and are resolved by the scene crate.

use crate::geometry::Size;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Axis a length is measured along.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    #[default]
    Horizontal,
    Vertical,
}

/// Viewport-relative keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewportKeyword {
    /// `vw`: full width of the selected box.
    Width,
    /// `vh`: full height of the selected box.
    Height,
    /// `vmin`: smaller of width and height.
    MinDimension,
    /// `vmax`: larger of width and height.
    MaxDimension,
}

impl ViewportKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewportKeyword::Width => "vw",
            ViewportKeyword::Height => "vh",
            ViewportKeyword::MinDimension => "vmin",
            ViewportKeyword::MaxDimension => "vmax",
        }
    }

    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "vw" => Some(ViewportKeyword::Width),
            "vh" => Some(ViewportKeyword::Height),
            "vmin" => Some(ViewportKeyword::MinDimension),
            "vmax" => Some(ViewportKeyword::MaxDimension),
            _ => None,
        }
    }

    fn of(&self, size: Size) -> f64 {
        match self {
            ViewportKeyword::Width => size.width,
            ViewportKeyword::Height => size.height,
            ViewportKeyword::MinDimension => size.min_dimension(),
            ViewportKeyword::MaxDimension => size.max_dimension(),
        }
    }
}

/// Geometric attribute a reference reads from its source layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceAttribute {
    Width,
    Height,
    X,
    Y,
}

impl ReferenceAttribute {
    /// Axis the attribute lies on.
    pub fn axis(&self) -> Axis {
        match self {
            ReferenceAttribute::Width | ReferenceAttribute::X => Axis::Horizontal,
            ReferenceAttribute::Height | ReferenceAttribute::Y => Axis::Vertical,
        }
    }
}

/// A length derived from another layer's resolved geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct LengthReference {
    /// Id of the source layer.
    pub source: String,
    /// Attribute read from the source.
    pub attribute: ReferenceAttribute,
    /// Added to the source value after resolution.
    pub offset: Box<Length>,
}

/// A symbolic length.
#[derive(Clone, Debug, PartialEq)]
pub enum Length {
    /// Plain number.
    Number(f64),
    /// `N%` of the viewport or of the local box.
    Percent(f64),
    /// `Npx` literal.
    Pixels(f64),
    /// `vw`, `vh`, `vmin`, `vmax`.
    Viewport(ViewportKeyword),
    /// Another layer's width, height, x or y plus an offset.
    Reference(LengthReference),
    /// Unrecognized input. Kept verbatim so documents round-trip; resolves to 0.
    Unknown(String),
}

impl Default for Length {
    fn default() -> Self {
        Length::Number(0.0)
    }
}

impl Length {
    pub const ZERO: Length = Length::Number(0.0);

    pub fn px(value: f64) -> Self {
        Length::parse(&format!("{}px", value))
    }

    pub fn percent(value: f64) -> Self {
        Length::parse(&format!("{}%", value))
    }

    pub fn reference(
        source: impl Into<String>,
        attribute: ReferenceAttribute,
        offset: impl Into<Length>,
    ) -> Self {
        Length::Reference(LengthReference {
            source: source.into(),
            attribute,
            offset: Box::new(offset.into()),
        })
    }

    /// Parse a length from its document string form. Never fails.
    pub fn parse(input: &str) -> Self {
        let s = input.trim();

        if let Some(keyword) = ViewportKeyword::from_keyword(s) {
            return Length::Viewport(keyword);
        }
        let finite = |n: &str| n.trim().parse::<f64>().ok().filter(|v| v.is_finite());
        if let Some(number) = s.strip_suffix('%').and_then(finite) {
            return Length::Percent(number);
        }
        if let Some(number) = s.strip_suffix("px").and_then(finite) {
            return Length::Pixels(number);
        }
        match finite(s) {
            Some(number) => Length::Number(number),
            None => Length::Unknown(input.to_string()),
        }
    }

    /// A plain number; NaN and infinities become [`Length::Unknown`] so the
    /// value still has a document form.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Length::Number(value)
        } else {
            Length::Unknown(value.to_string())
        }
    }

    /// Resolve against a viewport and optional local box.
    ///
    /// References cannot be resolved without a registry and yield 0 here.
    pub fn resolve(&self, ctx: &LengthContext) -> f64 {
        match self {
            Length::Number(v) | Length::Pixels(v) => *v,
            Length::Percent(p) => p / 100.0 * ctx.base_along_axis(),
            Length::Viewport(keyword) => keyword.of(ctx.base_box()),
            Length::Reference(reference) => {
                tracing::trace!(source = %reference.source, "reference resolved without registry");
                0.0
            }
            Length::Unknown(raw) => {
                tracing::trace!(raw = %raw, "unrecognized length resolves to 0");
                0.0
            }
        }
    }

    /// Scale absolute components by `ratio`.
    ///
    /// Percentages and viewport keywords follow the viewport and stay unchanged.
    pub fn scaled(&self, ratio: f64) -> Length {
        match self {
            Length::Number(v) => Length::number(v * ratio),
            Length::Pixels(v) => Length::px(v * ratio),
            Length::Reference(reference) => Length::Reference(LengthReference {
                source: reference.source.clone(),
                attribute: reference.attribute,
                offset: Box::new(reference.offset.scaled(ratio)),
            }),
            other => other.clone(),
        }
    }

    pub fn as_reference(&self) -> Option<&LengthReference> {
        match self {
            Length::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Length::Number(v) | Length::Pixels(v) | Length::Percent(v) if *v == 0.0)
    }
}

impl From<f64> for Length {
    fn from(value: f64) -> Self {
        Length::number(value)
    }
}

impl From<i32> for Length {
    fn from(value: i32) -> Self {
        Length::Number(value as f64)
    }
}

impl From<&str> for Length {
    fn from(value: &str) -> Self {
        Length::parse(value)
    }
}

impl FromStr for Length {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Length::parse(s))
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Number(v) => write!(f, "{}", v),
            Length::Percent(v) => write!(f, "{}%", v),
            Length::Pixels(v) => write!(f, "{}px", v),
            Length::Viewport(keyword) => write!(f, "{}", keyword.as_str()),
            Length::Reference(r) => write!(f, "link({}.{:?} + {})", r.source, r.attribute, r.offset),
            Length::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// Document form of a reference.
#[derive(Serialize, Deserialize)]
struct RawLink {
    source: String,
    #[serde(rename = "type")]
    attribute: ReferenceAttribute,
    #[serde(rename = "additionalSpacing", default)]
    additional_spacing: Length,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLength {
    Number(f64),
    Text(String),
    Link(RawLink),
}

impl Serialize for Length {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Length::Number(v) => serializer.serialize_f64(*v),
            Length::Reference(r) => RawLink {
                source: r.source.clone(),
                attribute: r.attribute,
                additional_spacing: (*r.offset).clone(),
            }
            .serialize(serializer),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Length {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawLength::deserialize(deserializer)? {
            RawLength::Number(v) => Length::Number(v),
            RawLength::Text(s) => Length::parse(&s),
            RawLength::Link(link) => Length::Reference(LengthReference {
                source: link.source,
                attribute: link.attribute,
                offset: Box::new(link.additional_spacing),
            }),
        })
    }
}

/// Context for resolving symbolic lengths.
#[derive(Clone, Copy, Debug)]
pub struct LengthContext {
    /// Scene viewport.
    pub viewport: Size,
    /// Local layer box; when set, percentages and keywords use it instead of the viewport.
    pub local: Option<Size>,
    /// Axis selecting width or height for percentages.
    pub axis: Axis,
}

impl LengthContext {
    pub fn new(viewport: Size, axis: Axis) -> Self {
        Self { viewport, local: None, axis }
    }

    pub fn horizontal(viewport: Size) -> Self {
        Self::new(viewport, Axis::Horizontal)
    }

    pub fn vertical(viewport: Size) -> Self {
        Self::new(viewport, Axis::Vertical)
    }

    pub fn with_local(mut self, local: Size) -> Self {
        self.local = Some(local);
        self
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    /// Box percentages and keywords are measured against.
    pub fn base_box(&self) -> Size {
        self.local.unwrap_or(self.viewport)
    }

    pub fn base_along_axis(&self) -> f64 {
        let base = self.base_box();
        match self.axis {
            Axis::Horizontal => base.width,
            Axis::Vertical => base.height,
        }
    }
}
