//! Fill styles: flat colors, gradients and patterns.

use crate::scene::Scene;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use common::units::Length;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use surface::Repetition;

/// How a shape is painted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawFill", into = "RawFill")]
pub enum FillStyle {
    /// CSS color string.
    Color(String),
    Gradient(Gradient),
    Pattern(Pattern),
}

impl FillStyle {
    pub fn color(color: impl Into<String>) -> Self {
        FillStyle::Color(color.into())
    }

    pub(crate) fn scaled(&self, ratio: f64) -> FillStyle {
        match self {
            FillStyle::Gradient(gradient) => FillStyle::Gradient(gradient.scaled(ratio)),
            other => other.clone(),
        }
    }
}

impl From<&str> for FillStyle {
    fn from(color: &str) -> Self {
        FillStyle::Color(color.to_string())
    }
}

impl From<Gradient> for FillStyle {
    fn from(gradient: Gradient) -> Self {
        FillStyle::Gradient(gradient)
    }
}

impl From<Pattern> for FillStyle {
    fn from(pattern: Pattern) -> Self {
        FillStyle::Pattern(pattern)
    }
}

/// Document form: a plain string, or an object tagged by `fillType`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawFill {
    Color(String),
    Paint(RawPaint),
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "fillType", rename_all = "lowercase")]
enum RawPaint {
    Gradient(Gradient),
    Pattern(Pattern),
}

impl From<RawFill> for FillStyle {
    fn from(raw: RawFill) -> Self {
        match raw {
            RawFill::Color(color) => FillStyle::Color(color),
            RawFill::Paint(RawPaint::Gradient(gradient)) => FillStyle::Gradient(gradient),
            RawFill::Paint(RawPaint::Pattern(pattern)) => FillStyle::Pattern(pattern),
        }
    }
}

impl From<FillStyle> for RawFill {
    fn from(fill: FillStyle) -> Self {
        match fill {
            FillStyle::Color(color) => RawFill::Color(color),
            FillStyle::Gradient(gradient) => RawFill::Paint(RawPaint::Gradient(gradient)),
            FillStyle::Pattern(pattern) => RawFill::Paint(RawPaint::Pattern(pattern)),
        }
    }
}

/// Gradient shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientType {
    Linear,
    Radial,
    Conic,
}

/// Gradient control point, relative to the painted layer's box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientPoint {
    pub x: Length,
    pub y: Length,
    /// Radius, radial gradients only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<Length>,
}

impl GradientPoint {
    pub fn new(x: impl Into<Length>, y: impl Into<Length>) -> Self {
        Self { x: x.into(), y: y.into(), r: None }
    }

    pub fn with_radius(mut self, r: impl Into<Length>) -> Self {
        self.r = Some(r.into());
        self
    }
}

/// Color stop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: String,
}

/// Linear, radial or conic gradient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    #[serde(rename = "type")]
    pub kind: GradientType,
    pub points: SmallVec<[GradientPoint; 2]>,
    pub stops: SmallVec<[GradientStop; 4]>,
    /// Start angle in radians, conic gradients only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
}

impl Gradient {
    pub fn linear(start: GradientPoint, end: GradientPoint) -> Self {
        Self {
            kind: GradientType::Linear,
            points: SmallVec::from_vec(vec![start, end]),
            stops: SmallVec::new(),
            angle: None,
        }
    }

    pub fn radial(start: GradientPoint, end: GradientPoint) -> Self {
        Self {
            kind: GradientType::Radial,
            ..Self::linear(start, end)
        }
    }

    pub fn conic(center: GradientPoint, angle: f64) -> Self {
        Self {
            kind: GradientType::Conic,
            points: SmallVec::from_vec(vec![center]),
            stops: SmallVec::new(),
            angle: Some(angle),
        }
    }

    pub fn add_stop(mut self, offset: f64, color: impl Into<String>) -> Self {
        self.stops.push(GradientStop { offset, color: color.into() });
        self
    }

    fn scaled(&self, ratio: f64) -> Gradient {
        let mut gradient = self.clone();
        for point in gradient.points.iter_mut() {
            point.x = point.x.scaled(ratio);
            point.y = point.y.scaled(ratio);
            point.r = point.r.as_ref().map(|r| r.scaled(ratio));
        }
        gradient
    }
}

/// Repeating image fill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    #[serde(rename = "type", default)]
    pub repeat: Repetition,
    pub source: PatternSource,
}

impl Pattern {
    pub fn new(source: PatternSource, repeat: Repetition) -> Self {
        Self { repeat, source }
    }
}

/// What a pattern tiles: an image, or a whole scene rendered offscreen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSource {
    Image(ImageSource),
    Scene(Box<Scene>),
}

/// Image locator: a file path or inline encoded bytes.
///
/// Inline bytes travel through documents as a base64 `data:` URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageSource {
    Path(String),
    Inline(Vec<u8>),
}

const DATA_URI_PREFIX: &str = "data:application/octet-stream;base64,";

impl ImageSource {
    pub fn path(path: impl Into<String>) -> Self {
        ImageSource::Path(path.into())
    }

    /// Cache key for the image loader.
    pub fn cache_key(&self) -> String {
        match self {
            ImageSource::Path(path) => path.clone(),
            ImageSource::Inline(bytes) => {
                // FNV-1a over the encoded bytes.
                let hash = bytes.iter().fold(0xcbf29ce484222325u64, |h, b| {
                    (h ^ *b as u64).wrapping_mul(0x100000001b3)
                });
                format!("inline:{:016x}:{}", hash, bytes.len())
            }
        }
    }

    fn parse(s: &str) -> Result<Self, base64::DecodeError> {
        if let Some((header, payload)) = s.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
            if header.ends_with(";base64") {
                return BASE64.decode(payload).map(ImageSource::Inline);
            }
        }
        Ok(ImageSource::Path(s.to_string()))
    }
}

impl Serialize for ImageSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ImageSource::Path(path) => serializer.serialize_str(path),
            ImageSource::Inline(bytes) => {
                serializer.serialize_str(&format!("{}{}", DATA_URI_PREFIX, BASE64.encode(bytes)))
            }
        }
    }
}

impl<'de> Deserialize<'de> for ImageSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ImageSource::parse(&raw).map_err(de::Error::custom)
    }
}
