//! Layer property records.
//!
//! Every drawable kind embeds [`BaseProps`] (position, opacity, paint, shadow,
//! composite mode, transform) and adds its own geometry. Field names follow
//! the document format (`camelCase`).

use crate::align::Anchor;
use crate::style::{FillStyle, ImageSource};
use common::units::Length;
use serde::{Deserialize, Serialize};
use surface::{CompositeOperation, LineCap, LineJoin, TextAlign, TextBaseline};

fn default_opacity() -> f64 {
    1.0
}

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Properties shared by every drawable layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseProps {
    #[serde(default)]
    pub x: Length,
    #[serde(default)]
    pub y: Length,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_style: Option<FillStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<StrokeStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowStyle>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub global_composite: CompositeOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformOps>,
    /// CSS filter string, passed through to surfaces that support it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Default for BaseProps {
    fn default() -> Self {
        Self {
            x: Length::ZERO,
            y: Length::ZERO,
            opacity: 1.0,
            fill_style: None,
            stroke: None,
            shadow: None,
            global_composite: CompositeOperation::SourceOver,
            transform: None,
            filter: None,
        }
    }
}

impl BaseProps {
    pub(crate) fn scale(&mut self, ratio: f64) {
        self.x = self.x.scaled(ratio);
        self.y = self.y.scaled(ratio);
        if let Some(fill) = &mut self.fill_style {
            *fill = fill.scaled(ratio);
        }
        if let Some(stroke) = &mut self.stroke {
            stroke.width = stroke.width.scaled(ratio);
            stroke.style = stroke.style.scaled(ratio);
        }
        if let Some(shadow) = &mut self.shadow {
            shadow.offset_x = shadow.offset_x.scaled(ratio);
            shadow.offset_y = shadow.offset_y.scaled(ratio);
            shadow.blur *= ratio;
        }
        if let Some(transform) = &mut self.transform {
            if let Some(translate) = &mut transform.translate {
                translate.x = translate.x.scaled(ratio);
                translate.y = translate.y.scaled(ratio);
            }
        }
    }
}

/// Stroke settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeStyle {
    pub style: FillStyle,
    #[serde(default = "StrokeStyle::default_width")]
    pub width: Length,
    #[serde(default, skip_serializing_if = "is_default")]
    pub cap: LineCap,
    #[serde(default, skip_serializing_if = "is_default")]
    pub join: LineJoin,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dash: Vec<f64>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub dash_offset: f64,
    #[serde(default = "StrokeStyle::default_miter_limit")]
    pub miter_limit: f64,
}

impl StrokeStyle {
    pub fn new(style: impl Into<FillStyle>, width: impl Into<Length>) -> Self {
        Self {
            style: style.into(),
            width: width.into(),
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            dash: Vec::new(),
            dash_offset: 0.0,
            miter_limit: 10.0,
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn with_dash(mut self, dash: Vec<f64>, offset: f64) -> Self {
        self.dash = dash;
        self.dash_offset = offset;
        self
    }

    fn default_width() -> Length {
        Length::Number(1.0)
    }

    fn default_miter_limit() -> f64 {
        10.0
    }
}

/// Drop shadow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowStyle {
    pub color: String,
    #[serde(default)]
    pub blur: f64,
    #[serde(default)]
    pub offset_x: Length,
    #[serde(default)]
    pub offset_y: Length,
}

impl ShadowStyle {
    pub fn new(color: impl Into<String>, blur: f64, offset_x: impl Into<Length>, offset_y: impl Into<Length>) -> Self {
        Self {
            color: color.into(),
            blur,
            offset_x: offset_x.into(),
            offset_y: offset_y.into(),
        }
    }
}

/// Scale factors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleOps {
    pub x: f64,
    pub y: f64,
}

/// Translation offsets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranslateOps {
    pub x: Length,
    pub y: Length,
}

/// Affine operations applied before drawing.
///
/// Rotation and scale pivot on the layer's anchor point; translation and the
/// raw matrix are applied in that order afterwards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformOps {
    /// Rotation in degrees, clockwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleOps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<TranslateOps>,
    /// `[a, b, c, d, e, f]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[f64; 6]>,
}

impl TransformOps {
    pub fn rotate(degrees: f64) -> Self {
        Self { rotate: Some(degrees), ..Self::default() }
    }

    pub fn scale(x: f64, y: f64) -> Self {
        Self { scale: Some(ScaleOps { x, y }), ..Self::default() }
    }

    pub fn translate(x: impl Into<Length>, y: impl Into<Length>) -> Self {
        Self {
            translate: Some(TranslateOps { x: x.into(), y: y.into() }),
            ..Self::default()
        }
    }
}

/// A point with symbolic coordinates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointProps {
    pub x: Length,
    pub y: Length,
}

impl PointProps {
    pub fn new(x: impl Into<Length>, y: impl Into<Length>) -> Self {
        Self { x: x.into(), y: y.into() }
    }

    fn scaled(&self, ratio: f64) -> PointProps {
        PointProps { x: self.x.scaled(ratio), y: self.y.scaled(ratio) }
    }
}

/// Declared box size.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeProps {
    pub width: Length,
    pub height: Length,
    /// Corner radius.
    #[serde(default, skip_serializing_if = "Length::is_zero")]
    pub radius: Length,
}

impl SizeProps {
    pub fn new(width: impl Into<Length>, height: impl Into<Length>) -> Self {
        Self { width: width.into(), height: height.into(), radius: Length::ZERO }
    }

    fn scale(&mut self, ratio: f64) {
        self.width = self.width.scaled(ratio);
        self.height = self.height.scaled(ratio);
        self.radius = self.radius.scaled(ratio);
    }
}

/// Font description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Font {
    /// Family name; empty selects the configured default.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub family: String,
    pub size: f64,
    #[serde(default = "Font::default_weight")]
    pub weight: String,
}

impl Font {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self { family: family.into(), size, weight: Self::default_weight() }
    }

    fn default_weight() -> String {
        "normal".to_string()
    }

    /// CSS font shorthand, e.g. `bold 16px Arial`.
    pub fn to_css(&self, default_family: &str) -> String {
        let family = if self.family.is_empty() { default_family } else { &self.family };
        format!("{} {}px {}", self.weight, self.size, family)
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new("", 16.0)
    }
}

/// Line wrapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Multiline {
    pub enabled: bool,
    /// Line height as a multiple of the font size.
    #[serde(default = "Multiline::default_spacing")]
    pub spacing: f64,
}

impl Multiline {
    fn default_spacing() -> f64 {
        1.2
    }
}

impl Default for Multiline {
    fn default() -> Self {
        Self { enabled: false, spacing: Self::default_spacing() }
    }
}

/// Text layer properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    #[serde(flatten)]
    pub base: BaseProps,
    pub text: String,
    #[serde(default)]
    pub font: Font,
    #[serde(default, skip_serializing_if = "is_default")]
    pub align: TextAlign,
    #[serde(default, skip_serializing_if = "is_default")]
    pub baseline: TextBaseline,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<Length>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub multiline: Multiline,
}

/// Image layer properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageProps {
    #[serde(flatten)]
    pub base: BaseProps,
    pub src: ImageSource,
    pub size: SizeProps,
    #[serde(default)]
    pub centring: Anchor,
}

/// Rounded rectangle properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MorphProps {
    #[serde(flatten)]
    pub base: BaseProps,
    pub size: SizeProps,
    #[serde(default)]
    pub centring: Anchor,
}

/// Quadratic curve properties; the start point is `base.x`/`base.y`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuadraticProps {
    #[serde(flatten)]
    pub base: BaseProps,
    pub control: PointProps,
    #[serde(rename = "endPoint")]
    pub end: PointProps,
}

/// Cubic curve properties; the start point is `base.x`/`base.y`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BezierProps {
    #[serde(flatten)]
    pub base: BaseProps,
    pub controls: [PointProps; 2],
    #[serde(rename = "endPoint")]
    pub end: PointProps,
}

/// Straight line properties; the start point is `base.x`/`base.y`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineProps {
    #[serde(flatten)]
    pub base: BaseProps,
    #[serde(rename = "endPoint")]
    pub end: PointProps,
}

/// Regular polygon inscribed in the box at `base.x`/`base.y`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolygonProps {
    #[serde(flatten)]
    pub base: BaseProps,
    pub size: SizeProps,
    pub sides: u32,
}

/// Raw path segment, relative to the layer position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PathSegment {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    QuadraticCurveTo { cpx: f64, cpy: f64, x: f64, y: f64 },
    BezierCurveTo { cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64 },
    Arc { x: f64, y: f64, radius: f64, start: f64, end: f64, #[serde(default)] anticlockwise: bool },
    ClosePath,
}

impl PathSegment {
    /// Map every point through `f`; arc radii are multiplied by `radius_factor`.
    fn map_points(&self, f: impl Fn(f64, f64) -> (f64, f64), radius_factor: f64) -> PathSegment {
        match *self {
            PathSegment::MoveTo { x, y } => {
                let (x, y) = f(x, y);
                PathSegment::MoveTo { x, y }
            }
            PathSegment::LineTo { x, y } => {
                let (x, y) = f(x, y);
                PathSegment::LineTo { x, y }
            }
            PathSegment::QuadraticCurveTo { cpx, cpy, x, y } => {
                let (cpx, cpy) = f(cpx, cpy);
                let (x, y) = f(x, y);
                PathSegment::QuadraticCurveTo { cpx, cpy, x, y }
            }
            PathSegment::BezierCurveTo { cp1x, cp1y, cp2x, cp2y, x, y } => {
                let (cp1x, cp1y) = f(cp1x, cp1y);
                let (cp2x, cp2y) = f(cp2x, cp2y);
                let (x, y) = f(x, y);
                PathSegment::BezierCurveTo { cp1x, cp1y, cp2x, cp2y, x, y }
            }
            PathSegment::Arc { x, y, radius, start, end, anticlockwise } => {
                let (x, y) = f(x, y);
                PathSegment::Arc { x, y, radius: radius * radius_factor, start, end, anticlockwise }
            }
            PathSegment::ClosePath => PathSegment::ClosePath,
        }
    }

    fn scaled(&self, k: f64) -> PathSegment {
        self.map_points(|x, y| (x * k, y * k), k)
    }

    /// Segment moved by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> PathSegment {
        self.map_points(|x, y| (x + dx, y + dy), 1.0)
    }
}

/// Raw path properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathProps {
    #[serde(flatten)]
    pub base: BaseProps,
    pub segments: Vec<PathSegment>,
}

/// Clear-region properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClearProps {
    #[serde(flatten)]
    pub base: BaseProps,
    pub size: SizeProps,
    #[serde(default)]
    pub centring: Anchor,
}

/// Access to the shared properties of every drawable kind.
pub trait HasBase {
    fn base(&self) -> &BaseProps;
    fn base_mut(&mut self) -> &mut BaseProps;

    /// Multiply every absolute length by `ratio`.
    fn scale(&mut self, ratio: f64) {
        self.base_mut().scale(ratio);
    }
}

impl HasBase for LineProps {
    fn base(&self) -> &BaseProps {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseProps {
        &mut self.base
    }

    fn scale(&mut self, ratio: f64) {
        self.base.scale(ratio);
        self.end = self.end.scaled(ratio);
    }
}

impl HasBase for TextProps {
    fn base(&self) -> &BaseProps {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseProps {
        &mut self.base
    }

    fn scale(&mut self, ratio: f64) {
        self.base.scale(ratio);
        self.font.size *= ratio;
        self.max_width = self.max_width.as_ref().map(|w| w.scaled(ratio));
    }
}

macro_rules! impl_has_base_sized {
    ($($props:ty),* $(,)?) => {
        $(
            impl HasBase for $props {
                fn base(&self) -> &BaseProps {
                    &self.base
                }

                fn base_mut(&mut self) -> &mut BaseProps {
                    &mut self.base
                }

                fn scale(&mut self, ratio: f64) {
                    self.base.scale(ratio);
                    self.size.scale(ratio);
                }
            }
        )*
    };
}

impl_has_base_sized!(ImageProps, MorphProps, PolygonProps, ClearProps);

impl HasBase for QuadraticProps {
    fn base(&self) -> &BaseProps {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseProps {
        &mut self.base
    }

    fn scale(&mut self, ratio: f64) {
        self.base.scale(ratio);
        self.control = self.control.scaled(ratio);
        self.end = self.end.scaled(ratio);
    }
}

impl HasBase for BezierProps {
    fn base(&self) -> &BaseProps {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseProps {
        &mut self.base
    }

    fn scale(&mut self, ratio: f64) {
        self.base.scale(ratio);
        self.controls = [self.controls[0].scaled(ratio), self.controls[1].scaled(ratio)];
        self.end = self.end.scaled(ratio);
    }
}

impl HasBase for PathProps {
    fn base(&self) -> &BaseProps {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseProps {
        &mut self.base
    }

    fn scale(&mut self, ratio: f64) {
        self.base.scale(ratio);
        self.segments = self.segments.iter().map(|s| s.scaled(ratio)).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_defaults_from_empty_object() {
        let base: BaseProps = serde_json::from_str("{}").unwrap();
        assert_eq!(base, BaseProps::default());
        assert_eq!(serde_json::to_string(&base).unwrap(), r#"{"x":0.0,"y":0.0,"opacity":1.0}"#);
    }

    #[test]
    fn test_font_css() {
        let font = Font { weight: "bold".to_string(), ..Font::new("Arial", 20.0) };
        assert_eq!(font.to_css("sans-serif"), "bold 20px Arial");
        assert_eq!(Font::default().to_css("serif"), "normal 16px serif");
    }

    #[test]
    fn test_line_requires_end_point() {
        let result: Result<LineProps, _> = serde_json::from_str(r#"{"x":1,"y":2}"#);
        assert!(result.is_err());
        let line: LineProps = serde_json::from_str(r#"{"x":1,"y":2,"endPoint":{"x":"50%","y":3}}"#).unwrap();
        assert_eq!(line.end.x, Length::percent(50.0));
    }

    #[test]
    fn test_path_segments_document_form() {
        let segments = vec![
            PathSegment::MoveTo { x: 0.0, y: 0.0 },
            PathSegment::Arc { x: 5.0, y: 5.0, radius: 5.0, start: 0.0, end: 3.0, anticlockwise: false },
            PathSegment::ClosePath,
        ];
        let json = serde_json::to_string(&segments).unwrap();
        assert!(json.contains(r#"{"op":"moveTo","x":0.0,"y":0.0}"#));
        assert!(json.contains(r#"{"op":"closePath"}"#));
        let back: Vec<PathSegment> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, segments);
    }

    #[test]
    fn test_scale_sized_props() {
        let mut props = MorphProps {
            base: BaseProps { x: Length::px(10.0), y: Length::percent(10.0), ..BaseProps::default() },
            size: SizeProps::new(100.0, "50%"),
            centring: Anchor::Center,
        };
        props.scale(2.0);
        assert_eq!(props.base.x, Length::px(20.0));
        assert_eq!(props.base.y, Length::percent(10.0));
        assert_eq!(props.size.width, Length::Number(200.0));
        assert_eq!(props.size.height, Length::percent(50.0));
    }
}
