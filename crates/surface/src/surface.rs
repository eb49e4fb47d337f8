//! The drawing-surface interface and its paint and style values.

use crate::bitmap::RasterImage;
use common::color::Color;
use common::error::SceneResult;
use common::geometry::{Point, Transform};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;

/// A 2D immediate-mode drawing surface.
///
/// Coordinates passed to path and draw calls are in user space and are mapped
/// through the current transform at call time. All state set through this
/// trait is scoped by [`save`](DrawingSurface::save) /
/// [`restore`](DrawingSurface::restore).
pub trait DrawingSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn save(&mut self);
    fn restore(&mut self);

    fn set_composite_operation(&mut self, op: CompositeOperation);
    fn set_global_alpha(&mut self, alpha: f64);
    fn set_shadow(&mut self, shadow: Shadow);

    /// Multiply the current transform by `matrix`.
    fn transform(&mut self, matrix: Transform);

    fn translate(&mut self, x: f64, y: f64) {
        self.transform(Transform::translation(x, y));
    }

    fn rotate(&mut self, angle: f64) {
        self.transform(Transform::rotation(angle));
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.transform(Transform::scaling(x, y));
    }

    fn set_fill_paint(&mut self, paint: Paint);
    fn set_stroke_paint(&mut self, paint: Paint);
    fn set_line_style(&mut self, style: LineStyle);
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);
    fn set_text_baseline(&mut self, baseline: TextBaseline);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool);
    fn close_path(&mut self);

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
    }

    fn fill(&mut self);
    fn stroke(&mut self);
    fn clip(&mut self);

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn fill_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>);
    fn stroke_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>);

    /// Measure `text` set in `font` without touching surface state.
    fn measure_text(&self, text: &str, font: &str) -> TextMetrics;

    fn draw_image(&mut self, image: &RasterImage, x: f64, y: f64, width: f64, height: f64);

    /// Full-frame RGBA copy of the surface.
    fn snapshot(&self) -> RasterImage;

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    fn encode_raster(&self, format: RasterFormat) -> SceneResult<Vec<u8>>;
    fn encode_vector(&self, flag: VectorFlag) -> SceneResult<String>;

    /// A fresh surface of the same kind, used for nested pattern scenes.
    fn create_offscreen(&self, width: u32, height: u32) -> Self
    where
        Self: Sized;
}

/// Composite operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeOperation {
    #[default]
    SourceOver,
    SourceIn,
    SourceOut,
    SourceAtop,
    DestinationOver,
    DestinationIn,
    DestinationOut,
    DestinationAtop,
    Lighter,
    Copy,
    Xor,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl CompositeOperation {
    /// Composite `src` onto `dst` inside the painted area.
    ///
    /// Porter-Duff operators are exact; separable blend modes are applied to
    /// color before source-over. The remaining modes fall back to source-over.
    pub fn composite(&self, src: Color, dst: Color) -> Color {
        let sa = src.a as f64 / 255.0;
        let da = dst.a as f64 / 255.0;
        let (fa, fb) = match self {
            CompositeOperation::SourceIn => (da, 0.0),
            CompositeOperation::SourceOut => (1.0 - da, 0.0),
            CompositeOperation::SourceAtop => (da, 1.0 - sa),
            CompositeOperation::DestinationOver => (1.0 - da, 1.0),
            CompositeOperation::DestinationIn => (0.0, sa),
            CompositeOperation::DestinationOut => (0.0, 1.0 - sa),
            CompositeOperation::DestinationAtop => (1.0 - da, sa),
            CompositeOperation::Lighter => (1.0, 1.0),
            CompositeOperation::Copy => (1.0, 0.0),
            CompositeOperation::Xor => (1.0 - da, 1.0 - sa),
            _ => (1.0, 1.0 - sa),
        };

        let blend = |s: u8, d: u8| -> f64 {
            let s = s as f64 / 255.0;
            let d = d as f64 / 255.0;
            let mixed = match self {
                CompositeOperation::Multiply => s * d,
                CompositeOperation::Screen => s + d - s * d,
                CompositeOperation::Darken => s.min(d),
                CompositeOperation::Lighten => s.max(d),
                CompositeOperation::Difference => (s - d).abs(),
                CompositeOperation::Exclusion => s + d - 2.0 * s * d,
                _ => s,
            };
            // Blend result only applies where the destination has coverage.
            (1.0 - da) * s + da * mixed
        };

        let out_a = (sa * fa + da * fb).min(1.0);
        if out_a <= 0.0 {
            return Color::TRANSPARENT;
        }
        let channel = |s: u8, d: u8| -> u8 {
            let s_premul = blend(s, d) * sa;
            let d_premul = d as f64 / 255.0 * da;
            let out = ((s_premul * fa + d_premul * fb) / out_a).clamp(0.0, 1.0);
            (out * 255.0).round() as u8
        };

        Color::rgba(
            channel(src.r, dst.r),
            channel(src.g, dst.g),
            channel(src.b, dst.b),
            (out_a * 255.0).round() as u8,
        )
    }
}

/// Line cap style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Line join style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Stroke geometry settings.
#[derive(Clone, Debug, PartialEq)]
pub struct LineStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub dash: Vec<f64>,
    pub dash_offset: f64,
    pub miter_limit: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            dash: Vec::new(),
            dash_offset: 0.0,
            miter_limit: 10.0,
        }
    }
}

/// Text align.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Start,
    End,
    Left,
    Right,
    Center,
}

/// Text baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBaseline {
    Top,
    Hanging,
    Middle,
    #[default]
    Alphabetic,
    Ideographic,
    Bottom,
}

/// Text metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
}

impl TextMetrics {
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }
}

/// Drop shadow applied to subsequent draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Shadow {
    /// Transparent shadow: no visible effect.
    pub const NONE: Shadow = Shadow {
        color: Color::TRANSPARENT,
        blur: 0.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    pub fn is_visible(&self) -> bool {
        self.color.a > 0 && (self.blur > 0.0 || self.offset_x != 0.0 || self.offset_y != 0.0)
    }
}

impl Default for Shadow {
    fn default() -> Self {
        Self::NONE
    }
}

/// Color stop of a gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Color,
}

/// Resolved gradient geometry in user space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientKind {
    Linear { start: Point, end: Point },
    Radial { start: Point, start_radius: f64, end: Point, end_radius: f64 },
    Conic { center: Point, angle: f64 },
}

/// A gradient paint.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientPaint {
    pub kind: GradientKind,
    pub stops: Vec<ColorStop>,
}

impl GradientPaint {
    /// Gradient parameter at a user-space point, clamped to `[0, 1]`.
    pub fn parameter_at(&self, p: Point) -> f64 {
        let t = match self.kind {
            GradientKind::Linear { start, end } => {
                let d = end - start;
                let len2 = d.x * d.x + d.y * d.y;
                if len2 == 0.0 {
                    0.0
                } else {
                    ((p.x - start.x) * d.x + (p.y - start.y) * d.y) / len2
                }
            }
            GradientKind::Radial { start_radius, end, end_radius, .. } => {
                let span = end_radius - start_radius;
                if span == 0.0 {
                    0.0
                } else {
                    (p.distance(end) - start_radius) / span
                }
            }
            GradientKind::Conic { center, angle } => {
                let theta = (p.y - center.y).atan2(p.x - center.x) - angle;
                theta.rem_euclid(2.0 * PI) / (2.0 * PI)
            }
        };
        t.clamp(0.0, 1.0)
    }

    pub fn color_at(&self, p: Point) -> Color {
        let t = self.parameter_at(p);
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Color::TRANSPARENT,
        };
        if t <= first.offset {
            return first.color;
        }
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t >= a.offset && t <= b.offset {
                let span = b.offset - a.offset;
                let local = if span == 0.0 { 0.0 } else { (t - a.offset) / span };
                let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * local).round() as u8;
                return Color::rgba(
                    mix(a.color.r, b.color.r),
                    mix(a.color.g, b.color.g),
                    mix(a.color.b, b.color.b),
                    mix(a.color.a, b.color.a),
                );
            }
        }
        last.color
    }
}

/// Pattern repetition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Repetition {
    #[default]
    Repeat,
    RepeatX,
    RepeatY,
    NoRepeat,
}

/// An image pattern paint.
#[derive(Clone, Debug, PartialEq)]
pub struct PatternPaint {
    pub image: Arc<RasterImage>,
    pub repetition: Repetition,
}

impl PatternPaint {
    pub fn color_at(&self, p: Point) -> Color {
        let (w, h) = (self.image.width as i64, self.image.height as i64);
        if w == 0 || h == 0 {
            return Color::TRANSPARENT;
        }
        let (mut x, mut y) = (p.x.floor() as i64, p.y.floor() as i64);
        match self.repetition {
            Repetition::Repeat => {
                x = x.rem_euclid(w);
                y = y.rem_euclid(h);
            }
            Repetition::RepeatX => x = x.rem_euclid(w),
            Repetition::RepeatY => y = y.rem_euclid(h),
            Repetition::NoRepeat => {}
        }
        if x < 0 || y < 0 || x >= w || y >= h {
            return Color::TRANSPARENT;
        }
        self.image.pixel(x as u32, y as u32)
    }
}

/// Fill or stroke paint.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Color(Color),
    Gradient(GradientPaint),
    Pattern(PatternPaint),
}

impl Default for Paint {
    fn default() -> Self {
        Paint::Color(Color::BLACK)
    }
}

impl Paint {
    /// Paint color at a user-space point.
    pub fn color_at(&self, p: Point) -> Color {
        match self {
            Paint::Color(color) => *color,
            Paint::Gradient(gradient) => gradient.color_at(p),
            Paint::Pattern(pattern) => pattern.color_at(p),
        }
    }

    /// Representative color for vector output.
    pub fn representative(&self) -> Color {
        match self {
            Paint::Color(color) => *color,
            Paint::Gradient(gradient) => gradient.stops.first().map(|s| s.color).unwrap_or_default(),
            Paint::Pattern(pattern) => pattern.image.pixel(0, 0),
        }
    }
}

/// Raster encoding format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasterFormat {
    /// Raw RGBA bytes.
    Rgba,
    Png,
    Jpeg,
}

/// Vector export flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VectorFlag {
    #[default]
    None,
    ConvertTextToPaths,
    NoPrettyXml,
    RelativePathEncoding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_over_opaque() {
        let out = CompositeOperation::SourceOver.composite(Color::RED, Color::BLUE);
        assert_eq!(out, Color::RED);
    }

    #[test]
    fn test_destination_out_erases() {
        let out = CompositeOperation::DestinationOut.composite(Color::RED, Color::BLUE);
        assert_eq!(out.a, 0);
    }

    #[test]
    fn test_destination_over_keeps_destination() {
        let out = CompositeOperation::DestinationOver.composite(Color::RED, Color::BLUE);
        assert_eq!(out, Color::BLUE);
    }

    #[test]
    fn test_multiply_on_transparent_is_source() {
        let out = CompositeOperation::Multiply.composite(Color::RED, Color::TRANSPARENT);
        assert_eq!(out, Color::RED);
    }

    #[test]
    fn test_linear_gradient_midpoint() {
        let gradient = GradientPaint {
            kind: GradientKind::Linear { start: Point::new(0.0, 0.0), end: Point::new(100.0, 0.0) },
            stops: vec![
                ColorStop { offset: 0.0, color: Color::BLACK },
                ColorStop { offset: 1.0, color: Color::WHITE },
            ],
        };
        let mid = gradient.color_at(Point::new(50.0, 10.0));
        assert!(mid.r > 120 && mid.r < 135);
        assert_eq!(gradient.color_at(Point::new(-10.0, 0.0)), Color::BLACK);
        assert_eq!(gradient.color_at(Point::new(500.0, 0.0)), Color::WHITE);
    }

    #[test]
    fn test_composite_serde_names() {
        let json = serde_json::to_string(&CompositeOperation::ColorDodge).unwrap();
        assert_eq!(json, "\"color-dodge\"");
        let op: CompositeOperation = serde_json::from_str("\"source-over\"").unwrap();
        assert_eq!(op, CompositeOperation::SourceOver);
    }
}
