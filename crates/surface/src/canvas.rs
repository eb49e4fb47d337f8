//! In-memory 2D canvas.
//!
//! [`Canvas2D`] rasterizes fills, strokes, clears and image blits into an RGBA
//! buffer and keeps a log of vector items for SVG output. Text is logged but
//! not rasterized; glyph shaping belongs to a real surface backend.

use crate::bitmap::{encode_jpeg, encode_png, RasterImage};
use crate::path::Path;
use crate::raster::{fill_mask, stroke_outline, Mask};
use crate::surface::{
    CompositeOperation, DrawingSurface, LineStyle, Paint, RasterFormat, Shadow, TextAlign,
    TextBaseline, TextMetrics, VectorFlag,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use common::color::Color;
use common::error::SceneResult;
use common::geometry::{Point, Transform};
use std::fmt::Write;
use std::sync::Arc;

/// Samples per curve segment when flattening paths.
const CURVE_STEPS: usize = 24;

/// Saved context state.
#[derive(Clone, Debug)]
struct ContextState {
    fill: Paint,
    stroke: Paint,
    line_style: LineStyle,
    global_alpha: f64,
    composite: CompositeOperation,
    font: String,
    text_align: TextAlign,
    text_baseline: TextBaseline,
    shadow: Shadow,
    transform: Transform,
    clip: Option<Arc<Mask>>,
}

impl Default for ContextState {
    fn default() -> Self {
        Self {
            fill: Paint::default(),
            stroke: Paint::default(),
            line_style: LineStyle::default(),
            global_alpha: 1.0,
            composite: CompositeOperation::SourceOver,
            font: "10px sans-serif".to_string(),
            text_align: TextAlign::Start,
            text_baseline: TextBaseline::Alphabetic,
            shadow: Shadow::NONE,
            transform: Transform::identity(),
            clip: None,
        }
    }
}

/// Logged vector item, in device space.
#[derive(Clone, Debug, PartialEq)]
pub enum VectorItem {
    Fill { data: String, relative_data: String, color: Color },
    Stroke { data: String, relative_data: String, color: Color, width: f64 },
    Text { text: String, position: Point, font: String, color: Color, stroked: bool },
    Image { x: f64, y: f64, width: f64, height: f64, png: Vec<u8> },
}

/// 2D canvas with an RGBA backing buffer.
#[derive(Debug)]
pub struct Canvas2D {
    width: u32,
    height: u32,
    data: Vec<u8>,
    state: ContextState,
    save_stack: Vec<ContextState>,
    path: Path,
    log: Vec<VectorItem>,
}

impl Canvas2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
            state: ContextState::default(),
            save_stack: Vec::new(),
            path: Path::new(),
            log: Vec::new(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        if x >= self.width || y >= self.height {
            return Color::TRANSPARENT;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        Color::rgba(self.data[idx], self.data[idx + 1], self.data[idx + 2], self.data[idx + 3])
    }

    pub fn vector_items(&self) -> &[VectorItem] {
        &self.log
    }

    pub fn composite_operation(&self) -> CompositeOperation {
        self.state.composite
    }

    pub fn shadow(&self) -> Shadow {
        self.state.shadow
    }

    pub fn current_transform(&self) -> Transform {
        self.state.transform
    }

    pub fn save_depth(&self) -> usize {
        self.save_stack.len()
    }

    fn write_pixel(&mut self, x: u32, y: u32, color: Color) {
        let idx = ((y * self.width + x) * 4) as usize;
        self.data[idx..idx + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
    }

    fn clipped(&self, mut mask: Mask) -> Mask {
        if let Some(clip) = &self.state.clip {
            mask.intersect(clip);
        }
        mask
    }

    fn paint_mask(&mut self, mask: &Mask, paint: &Paint) {
        let inverse = self.state.transform.inverse();
        let alpha = self.state.global_alpha;
        let op = self.state.composite;
        for y in 0..self.height {
            for x in 0..self.width {
                if !mask.get(x, y) {
                    continue;
                }
                let device = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                let user = inverse.map(|t| t.transform_point(device)).unwrap_or(device);
                let src = paint.color_at(user).with_opacity(alpha);
                let out = op.composite(src, self.pixel(x, y));
                self.write_pixel(x, y, out);
            }
        }
    }

    fn device_rect(&self, x: f64, y: f64, width: f64, height: f64) -> Path {
        let mut path = Path::new();
        let t = &self.state.transform;
        path.move_to(t, x, y);
        path.line_to(t, x + width, y);
        path.line_to(t, x + width, y + height);
        path.line_to(t, x, y + height);
        path.close_path();
        path
    }

    fn log_text(&mut self, text: &str, x: f64, y: f64, stroked: bool) {
        let paint = if stroked { &self.state.stroke } else { &self.state.fill };
        let item = VectorItem::Text {
            text: text.to_string(),
            position: self.state.transform.transform_point(Point::new(x, y)),
            font: self.state.font.clone(),
            color: paint.representative().with_opacity(self.state.global_alpha),
            stroked,
        };
        tracing::trace!(text, "text logged without rasterization");
        self.log.push(item);
    }

    fn to_svg(&self, flag: VectorFlag) -> String {
        let pretty = flag != VectorFlag::NoPrettyXml;
        let relative = flag == VectorFlag::RelativePathEncoding;
        let sep = if pretty { "\n  " } else { "" };

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        for item in &self.log {
            svg.push_str(sep);
            match item {
                VectorItem::Fill { data, relative_data, color } => {
                    let d = if relative { relative_data } else { data };
                    let _ = write!(svg, r#"<path d="{}" fill="{}"/>"#, d, color.to_css());
                }
                VectorItem::Stroke { data, relative_data, color, width } => {
                    let d = if relative { relative_data } else { data };
                    let _ = write!(
                        svg,
                        r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                        d,
                        color.to_css(),
                        width
                    );
                }
                VectorItem::Text { text, position, font, color, stroked } => {
                    let paint = if *stroked {
                        format!(r#"fill="none" stroke="{}""#, color.to_css())
                    } else {
                        format!(r#"fill="{}""#, color.to_css())
                    };
                    let _ = write!(
                        svg,
                        r#"<text x="{}" y="{}" style="font: {}" {}>{}</text>"#,
                        position.x,
                        position.y,
                        escape_xml(font),
                        paint,
                        escape_xml(text)
                    );
                }
                VectorItem::Image { x, y, width, height, png } => {
                    let _ = write!(
                        svg,
                        r#"<image x="{}" y="{}" width="{}" height="{}" href="data:image/png;base64,{}"/>"#,
                        x,
                        y,
                        width,
                        height,
                        BASE64.encode(png)
                    );
                }
            }
        }
        if pretty {
            svg.push('\n');
        }
        svg.push_str("</svg>");
        svg
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Font size in pixels from a CSS font shorthand such as `bold 16px Arial`.
pub fn font_size_px(font: &str) -> f64 {
    font.split_whitespace()
        .find_map(|part| part.strip_suffix("px").and_then(|n| n.parse::<f64>().ok()))
        .unwrap_or(10.0)
}

impl DrawingSurface for Canvas2D {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn save(&mut self) {
        self.save_stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.save_stack.pop() {
            self.state = state;
        }
    }

    fn set_composite_operation(&mut self, op: CompositeOperation) {
        self.state.composite = op;
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.global_alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_shadow(&mut self, shadow: Shadow) {
        self.state.shadow = shadow;
    }

    fn transform(&mut self, matrix: Transform) {
        self.state.transform = self.state.transform.then(&matrix);
    }

    fn set_fill_paint(&mut self, paint: Paint) {
        self.state.fill = paint;
    }

    fn set_stroke_paint(&mut self, paint: Paint) {
        self.state.stroke = paint;
    }

    fn set_line_style(&mut self, style: LineStyle) {
        self.state.line_style = style;
    }

    fn set_font(&mut self, font: &str) {
        self.state.font = font.to_string();
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.state.text_align = align;
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.text_baseline = baseline;
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.move_to(&self.state.transform, x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.path.line_to(&self.state.transform, x, y);
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.path.quadratic_curve_to(&self.state.transform, cpx, cpy, x, y);
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.path
            .bezier_curve_to(&self.state.transform, cp1x, cp1y, cp2x, cp2y, x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, anticlockwise: bool) {
        self.path
            .arc(&self.state.transform, x, y, radius, start, end, anticlockwise);
    }

    fn close_path(&mut self) {
        self.path.close_path();
    }

    fn fill(&mut self) {
        let lines = self.path.flatten(CURVE_STEPS);
        let mask = self.clipped(fill_mask(&lines, self.width, self.height));
        let paint = self.state.fill.clone();
        self.paint_mask(&mask, &paint);
        self.log.push(VectorItem::Fill {
            data: self.path.to_svg_data(false),
            relative_data: self.path.to_svg_data(true),
            color: paint.representative().with_opacity(self.state.global_alpha),
        });
    }

    fn stroke(&mut self) {
        let lines = self.path.flatten(CURVE_STEPS);
        let scale = self.state.transform.mean_scale();
        let outline = stroke_outline(&lines, &self.state.line_style, scale);
        let mask = self.clipped(fill_mask(&outline, self.width, self.height));
        let paint = self.state.stroke.clone();
        self.paint_mask(&mask, &paint);
        self.log.push(VectorItem::Stroke {
            data: self.path.to_svg_data(false),
            relative_data: self.path.to_svg_data(true),
            color: paint.representative().with_opacity(self.state.global_alpha),
            width: self.state.line_style.width * scale,
        });
    }

    fn clip(&mut self) {
        let lines = self.path.flatten(CURVE_STEPS);
        let mask = self.clipped(fill_mask(&lines, self.width, self.height));
        self.state.clip = Some(Arc::new(mask));
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let lines = self.device_rect(x, y, width, height).flatten(1);
        let mask = self.clipped(fill_mask(&lines, self.width, self.height));
        for py in 0..self.height {
            for px in 0..self.width {
                if mask.get(px, py) {
                    self.write_pixel(px, py, Color::TRANSPARENT);
                }
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, _max_width: Option<f64>) {
        self.log_text(text, x, y, false);
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64, _max_width: Option<f64>) {
        self.log_text(text, x, y, true);
    }

    fn measure_text(&self, text: &str, font: &str) -> TextMetrics {
        // Approximate advance: 0.6em per character.
        let size = font_size_px(font);
        TextMetrics {
            width: text.chars().count() as f64 * size * 0.6,
            ascent: size * 0.8,
            descent: size * 0.2,
        }
    }

    fn draw_image(&mut self, image: &RasterImage, x: f64, y: f64, width: f64, height: f64) {
        if image.width == 0 || image.height == 0 || width == 0.0 || height == 0.0 {
            return;
        }
        let Some(inverse) = self.state.transform.inverse() else {
            return;
        };
        let lines = self.device_rect(x, y, width, height).flatten(1);
        let mask = self.clipped(fill_mask(&lines, self.width, self.height));
        let alpha = self.state.global_alpha;
        let op = self.state.composite;

        for py in 0..self.height {
            for px in 0..self.width {
                if !mask.get(px, py) {
                    continue;
                }
                let user = inverse.transform_point(Point::new(px as f64 + 0.5, py as f64 + 0.5));
                let u = ((user.x - x) / width * image.width as f64).floor();
                let v = ((user.y - y) / height * image.height as f64).floor();
                if u < 0.0 || v < 0.0 {
                    continue;
                }
                let src = image.pixel(u as u32, v as u32).with_opacity(alpha);
                let out = op.composite(src, self.pixel(px, py));
                self.write_pixel(px, py, out);
            }
        }

        let origin = self.state.transform.transform_point(Point::new(x, y));
        let scale = self.state.transform.mean_scale();
        match encode_png(image) {
            Ok(png) => self.log.push(VectorItem::Image {
                x: origin.x,
                y: origin.y,
                width: width * scale,
                height: height * scale,
                png,
            }),
            Err(err) => tracing::warn!(%err, "image omitted from vector log"),
        }
    }

    fn snapshot(&self) -> RasterImage {
        RasterImage {
            width: self.width,
            height: self.height,
            pixels: self.data.clone(),
        }
    }

    fn clear(&mut self) {
        self.data.iter_mut().for_each(|b| *b = 0);
        self.log.clear();
    }

    fn encode_raster(&self, format: RasterFormat) -> SceneResult<Vec<u8>> {
        match format {
            RasterFormat::Rgba => Ok(self.data.clone()),
            RasterFormat::Png => encode_png(&self.snapshot()),
            RasterFormat::Jpeg => encode_jpeg(&self.snapshot()),
        }
    }

    fn encode_vector(&self, flag: VectorFlag) -> SceneResult<String> {
        if flag == VectorFlag::ConvertTextToPaths {
            tracing::debug!("text-to-path conversion needs glyph outlines; emitting <text>");
        }
        Ok(self.to_svg(flag))
    }

    fn create_offscreen(&self, width: u32, height: u32) -> Self {
        Canvas2D::new(width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_creation() {
        let canvas = Canvas2D::new(800, 600);
        assert_eq!(canvas.width(), 800);
        assert_eq!(canvas.height(), 600);
        assert_eq!(canvas.data().len(), 800 * 600 * 4);
    }

    #[test]
    fn test_fill_rect_path() {
        let mut ctx = Canvas2D::new(20, 20);
        ctx.set_fill_paint(Paint::Color(Color::RED));
        ctx.begin_path();
        ctx.rect(5.0, 5.0, 10.0, 10.0);
        ctx.fill();

        assert_eq!(ctx.pixel(5, 5), Color::RED);
        assert_eq!(ctx.pixel(14, 14), Color::RED);
        assert_eq!(ctx.pixel(15, 15), Color::TRANSPARENT);
        assert_eq!(ctx.vector_items().len(), 1);
    }

    #[test]
    fn test_save_restore() {
        let mut ctx = Canvas2D::new(10, 10);
        ctx.set_composite_operation(CompositeOperation::Multiply);
        ctx.save();
        ctx.set_composite_operation(CompositeOperation::Xor);
        ctx.translate(5.0, 5.0);
        assert_eq!(ctx.composite_operation(), CompositeOperation::Xor);
        ctx.restore();
        assert_eq!(ctx.composite_operation(), CompositeOperation::Multiply);
        assert!(ctx.current_transform().is_identity());
    }

    #[test]
    fn test_translate_moves_fill() {
        let mut ctx = Canvas2D::new(20, 20);
        ctx.set_fill_paint(Paint::Color(Color::BLUE));
        ctx.translate(10.0, 0.0);
        ctx.begin_path();
        ctx.rect(0.0, 0.0, 2.0, 2.0);
        ctx.fill();
        assert_eq!(ctx.pixel(10, 0), Color::BLUE);
        assert_eq!(ctx.pixel(0, 0), Color::TRANSPARENT);
    }

    #[test]
    fn test_clip_limits_fill() {
        let mut ctx = Canvas2D::new(20, 20);
        ctx.begin_path();
        ctx.rect(0.0, 0.0, 5.0, 5.0);
        ctx.clip();
        ctx.set_fill_paint(Paint::Color(Color::RED));
        ctx.begin_path();
        ctx.rect(0.0, 0.0, 20.0, 20.0);
        ctx.fill();
        assert_eq!(ctx.pixel(4, 4), Color::RED);
        assert_eq!(ctx.pixel(6, 6), Color::TRANSPARENT);
    }

    #[test]
    fn test_clear_rect() {
        let mut ctx = Canvas2D::new(10, 10);
        ctx.set_fill_paint(Paint::Color(Color::RED));
        ctx.begin_path();
        ctx.rect(0.0, 0.0, 10.0, 10.0);
        ctx.fill();
        ctx.clear_rect(0.0, 0.0, 5.0, 10.0);
        assert_eq!(ctx.pixel(2, 2), Color::TRANSPARENT);
        assert_eq!(ctx.pixel(7, 2), Color::RED);
    }

    #[test]
    fn test_global_alpha() {
        let mut ctx = Canvas2D::new(4, 4);
        ctx.set_global_alpha(0.5);
        ctx.set_fill_paint(Paint::Color(Color::RED));
        ctx.begin_path();
        ctx.rect(0.0, 0.0, 4.0, 4.0);
        ctx.fill();
        let px = ctx.pixel(1, 1);
        assert_eq!(px.r, 255);
        assert!(px.a > 120 && px.a < 135);
    }

    #[test]
    fn test_draw_image_scaled() {
        let mut image = RasterImage::new(1, 1);
        image.set_pixel(0, 0, Color::GREEN);
        let mut ctx = Canvas2D::new(10, 10);
        ctx.draw_image(&image, 2.0, 2.0, 4.0, 4.0);
        assert_eq!(ctx.pixel(2, 2), Color::GREEN);
        assert_eq!(ctx.pixel(5, 5), Color::GREEN);
        assert_eq!(ctx.pixel(6, 6), Color::TRANSPARENT);
    }

    #[test]
    fn test_measure_text() {
        let ctx = Canvas2D::new(10, 10);
        let metrics = ctx.measure_text("abcd", "bold 20px Arial");
        assert_eq!(metrics.width, 48.0);
        assert_eq!(metrics.height(), 20.0);
    }

    #[test]
    fn test_svg_output() {
        let mut ctx = Canvas2D::new(10, 10);
        ctx.set_fill_paint(Paint::Color(Color::RED));
        ctx.begin_path();
        ctx.rect(0.0, 0.0, 2.0, 2.0);
        ctx.fill();
        ctx.fill_text("a<b", 1.0, 1.0, None);

        let svg = ctx.encode_vector(VectorFlag::NoPrettyXml).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r##"<path d="M0 0 L2 0 L2 2 L0 2 Z" fill="#ff0000"/>"##));
        assert!(svg.contains("a&lt;b"));
        assert!(!svg.contains('\n'));
    }

    #[test]
    fn test_png_export() {
        let ctx = Canvas2D::new(3, 3);
        let png = ctx.encode_raster(RasterFormat::Png).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
