//! Per-kind draw routines.
//!
//! Drawing a layer happens in two steps. Planning resolves every length,
//! paint and image against the scene while the surface is only borrowed for
//! measurement. Execution then replays the plan on the surface between a
//! `save` and a `restore`.

use crate::align::{align, Anchor};
use crate::bbox::bounding_box;
use crate::config::RenderConfig;
use crate::layer::{Capabilities, HasBoundingBox, Layer, LayerKind};
use crate::props::{BaseProps, PathSegment, ShadowStyle, SizeProps, StrokeStyle, TransformOps};
use crate::registry::LayerRegistry;
use crate::resolve::{LengthBatch, Resolver};
use crate::scene::Scene;
use crate::style::{FillStyle, Gradient, GradientPoint, GradientType, ImageSource, PatternSource};
use common::color::Color;
use common::error::{SceneError, SceneResult};
use common::geometry::{Point, Rect, Size, Transform};
use common::units::{Axis, LengthContext};
use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;
use surface::{
    ColorStop, DrawingSurface, GradientKind, GradientPaint, ImageLoader, LineStyle, Paint,
    PatternPaint, RasterImage, Shadow, TextAlign, TextBaseline,
};

/// Parse a CSS color; unparseable input draws black.
pub(crate) fn parse_color(input: &str) -> Color {
    Color::parse(input).unwrap_or_else(|| {
        tracing::warn!(color = input, "unrecognized color, using black");
        Color::BLACK
    })
}

/// Geometry a layer's paints and transform are resolved against.
struct Frame {
    /// Where gradient coordinates start.
    origin: Point,
    /// Box for percentages in gradient coordinates; `None` uses the viewport.
    local: Option<Size>,
    /// Point rotation and scaling happen about.
    pivot: Point,
}

struct Decor {
    opacity: f64,
    shadow: Option<Shadow>,
    transform: Option<Transform>,
    fill: Option<Paint>,
    stroke: Option<(Paint, LineStyle)>,
}

struct TextRun {
    lines: Vec<String>,
    position: Point,
    font: String,
    align: TextAlign,
    baseline: TextBaseline,
    max_width: Option<f64>,
    line_height: f64,
}

enum Shape {
    Outline(Vec<PathSegment>),
    Text(TextRun),
    Image { image: Arc<RasterImage>, rect: Rect, radius: f64 },
    Clear(Rect),
}

struct Plan {
    decor: Decor,
    shape: Shape,
}

/// Resolved box of an image, morph or clear layer.
struct BoxGeometry {
    anchor: Point,
    rect: Rect,
    radius: f64,
}

/// Draws layers of one scene.
#[derive(Clone, Copy)]
pub(crate) struct Painter<'a> {
    root: &'a LayerRegistry,
    viewport: Size,
    config: &'a RenderConfig,
    images: &'a ImageLoader,
    depth: usize,
}

impl<'a> Painter<'a> {
    pub(crate) fn new(scene: &'a Scene, config: &'a RenderConfig, images: &'a ImageLoader) -> Self {
        Self {
            root: scene.layers(),
            viewport: scene.viewport(),
            config,
            images,
            depth: 0,
        }
    }

    /// Draw one layer; groups draw their children in z-order.
    pub(crate) fn draw<S: DrawingSurface>(&self, layer: &Layer, surface: &mut S) -> SceneResult<()> {
        if !layer.visible() {
            tracing::trace!(id = layer.id(), "hidden layer skipped");
            return Ok(());
        }
        if let Layer::Group(group) = layer {
            for child in group.layers.iter() {
                self.draw(child, surface)?;
            }
            return Ok(());
        }

        let Some(plan) = self.plan(layer, &*surface)? else {
            return Ok(());
        };
        if let Some(base) = layer.base() {
            surface.set_composite_operation(base.global_composite);
        }
        execute(plan, surface);
        surface.set_shadow(Shadow::NONE);
        tracing::trace!(id = layer.id(), kind = layer.kind().as_str(), "layer drawn");
        Ok(())
    }

    fn plan<S: DrawingSurface>(&self, layer: &Layer, view: &S) -> SceneResult<Option<Plan>> {
        let r = Resolver::new(self.root, self.viewport, view, self.config);
        let plan = match layer {
            Layer::Text(node) => {
                let p = &node.props;
                let position = r.resolve_point(&p.base.x, &p.base.y)?;
                let font = r.font_css(p);
                let lines = r.text_lines(p)?;
                let max_width = match &p.max_width {
                    Some(width) => Some(r.resolve_along(width, Axis::Horizontal)?),
                    None => None,
                };
                let line_height = p.font.size * p.multiline.spacing;
                let width = lines
                    .iter()
                    .map(|line| view.measure_text(line, &font).width)
                    .fold(0.0, f64::max);
                let height = view.measure_text(&p.text, &font).height()
                    + line_height * lines.len().saturating_sub(1) as f64;
                let frame = Frame { origin: position, local: Some(Size::new(width, height)), pivot: position };
                Plan {
                    decor: self.decor(LayerKind::Text, &p.base, &r, view, &frame)?,
                    shape: Shape::Text(TextRun {
                        lines,
                        position,
                        font,
                        align: p.align,
                        baseline: p.baseline,
                        max_width,
                        line_height,
                    }),
                }
            }
            Layer::Image(node) => {
                let p = &node.props;
                let geometry = box_geometry(&r, &p.base, &p.size, p.centring, LayerKind::Image)?;
                let image = self.load_image(&p.src)?;
                Plan {
                    decor: self.decor(LayerKind::Image, &p.base, &r, view, &geometry.frame())?,
                    shape: Shape::Image { image, rect: geometry.rect, radius: geometry.radius },
                }
            }
            Layer::Morph(node) => {
                let p = &node.props;
                let geometry = box_geometry(&r, &p.base, &p.size, p.centring, LayerKind::Morph)?;
                Plan {
                    decor: self.decor(LayerKind::Morph, &p.base, &r, view, &geometry.frame())?,
                    shape: Shape::Outline(rounded_rect(geometry.rect, geometry.radius)),
                }
            }
            Layer::Clear(node) => {
                let p = &node.props;
                let geometry = box_geometry(&r, &p.base, &p.size, p.centring, LayerKind::Clear)?;
                Plan {
                    decor: self.decor(LayerKind::Clear, &p.base, &r, view, &geometry.frame())?,
                    shape: Shape::Clear(geometry.rect),
                }
            }
            Layer::Polygon(node) => {
                let p = &node.props;
                let batch = LengthBatch::new()
                    .add("x", &p.base.x, Axis::Horizontal)
                    .add("y", &p.base.y, Axis::Vertical)
                    .add("width", &p.size.width, Axis::Horizontal)
                    .add("height", &p.size.height, Axis::Vertical);
                let v = r.resolve_batch(&batch)?;
                let rect = Rect::new(v.get("x"), v.get("y"), v.get("width"), v.get("height"));
                let frame = Frame { origin: rect.origin(), local: Some(rect.size()), pivot: rect.origin() };
                Plan {
                    decor: self.decor(LayerKind::Polygon, &p.base, &r, view, &frame)?,
                    shape: Shape::Outline(polygon(rect, p.sides)),
                }
            }
            Layer::Line(node) => self.plan_curve(LayerKind::Line, &node.props, &node.props.base, &r, view)?,
            Layer::Quadratic(node) => {
                self.plan_curve(LayerKind::Quadratic, &node.props, &node.props.base, &r, view)?
            }
            Layer::Bezier(node) => self.plan_curve(LayerKind::Bezier, &node.props, &node.props.base, &r, view)?,
            Layer::Path(node) => {
                let p = &node.props;
                let position = r.resolve_point(&p.base.x, &p.base.y)?;
                let frame = Frame { origin: position, local: None, pivot: position };
                Plan {
                    decor: self.decor(LayerKind::Path, &p.base, &r, view, &frame)?,
                    shape: Shape::Outline(p.segments.iter().map(|s| s.offset(position.x, position.y)).collect()),
                }
            }
            Layer::Group(_) => return Ok(None),
        };
        Ok(Some(plan))
    }

    fn plan_curve<S: DrawingSurface, P: HasBoundingBox>(
        &self,
        kind: LayerKind,
        props: &P,
        base: &BaseProps,
        r: &Resolver<'_>,
        view: &S,
    ) -> SceneResult<Plan> {
        let mut points = Vec::with_capacity(4);
        for (x, y) in props.curve_points() {
            points.push(r.resolve_point(x, y)?);
        }
        let bbox = bounding_box(&points, self.config.sample_density)?;

        let mut segments = vec![PathSegment::MoveTo { x: points[0].x, y: points[0].y }];
        segments.push(match points[1..] {
            [end] => PathSegment::LineTo { x: end.x, y: end.y },
            [c, end] => PathSegment::QuadraticCurveTo { cpx: c.x, cpy: c.y, x: end.x, y: end.y },
            [c1, c2, end] => PathSegment::BezierCurveTo {
                cp1x: c1.x,
                cp1y: c1.y,
                cp2x: c2.x,
                cp2y: c2.y,
                x: end.x,
                y: end.y,
            },
            _ => return Err(SceneError::render(format!("{} layer has {} points", kind.as_str(), points.len()))),
        });

        let frame = Frame {
            origin: bbox.min,
            local: Some(Size::new(bbox.width, bbox.height)),
            pivot: points[0],
        };
        Ok(Plan {
            decor: self.decor(kind, base, r, view, &frame)?,
            shape: Shape::Outline(segments),
        })
    }

    /// Resolve paints, shadow, opacity and transform.
    ///
    /// Kinds that can be filled fall back to a black fill when neither fill
    /// nor stroke is set; curves always stroke, with a 1px black line by
    /// default.
    fn decor<S: DrawingSurface>(
        &self,
        kind: LayerKind,
        base: &BaseProps,
        r: &Resolver<'_>,
        view: &S,
        frame: &Frame,
    ) -> SceneResult<Decor> {
        let caps = kind.capabilities();
        let curve = matches!(kind, LayerKind::Line | LayerKind::Quadratic | LayerKind::Bezier);

        let fill = match (&base.fill_style, &base.stroke) {
            _ if !caps.contains(Capabilities::PAINT) => None,
            (Some(style), _) => Some(self.paint(style, r, view, frame)?),
            (None, None) if !curve => Some(Paint::default()),
            (None, _) => None,
        };

        let stroke = match &base.stroke {
            _ if !caps.contains(Capabilities::STROKE) => None,
            Some(stroke) => Some(self.stroke(stroke, r, view, frame)?),
            None if curve => Some((Paint::default(), LineStyle::default())),
            None => None,
        };

        let shadow = match &base.shadow {
            Some(shadow) => Some(resolve_shadow(shadow, r)?),
            None => None,
        };

        let transform = match &base.transform {
            Some(ops) => Some(resolve_transform(ops, r, frame.pivot)?),
            None => None,
        };

        if let Some(filter) = &base.filter {
            tracing::warn!(filter = %filter, "filters are not supported by the drawing surface");
        }

        Ok(Decor {
            opacity: base.opacity,
            shadow,
            transform,
            fill,
            stroke,
        })
    }

    fn stroke<S: DrawingSurface>(
        &self,
        stroke: &StrokeStyle,
        r: &Resolver<'_>,
        view: &S,
        frame: &Frame,
    ) -> SceneResult<(Paint, LineStyle)> {
        let paint = self.paint(&stroke.style, r, view, frame)?;
        let style = LineStyle {
            width: r.resolve_along(&stroke.width, Axis::Horizontal)?,
            cap: stroke.cap,
            join: stroke.join,
            dash: stroke.dash.clone(),
            dash_offset: stroke.dash_offset,
            miter_limit: stroke.miter_limit,
        };
        Ok((paint, style))
    }

    fn paint<S: DrawingSurface>(
        &self,
        style: &FillStyle,
        r: &Resolver<'_>,
        view: &S,
        frame: &Frame,
    ) -> SceneResult<Paint> {
        match style {
            FillStyle::Color(color) => Ok(Paint::Color(parse_color(color))),
            FillStyle::Gradient(gradient) => Ok(Paint::Gradient(resolve_gradient(gradient, r, frame)?)),
            FillStyle::Pattern(pattern) => {
                let image = match &pattern.source {
                    PatternSource::Image(source) => self.load_image(source)?,
                    PatternSource::Scene(scene) => self.render_pattern_scene(scene, view)?,
                };
                Ok(Paint::Pattern(PatternPaint { image, repetition: pattern.repeat }))
            }
        }
    }

    fn load_image(&self, source: &ImageSource) -> SceneResult<Arc<RasterImage>> {
        match source {
            ImageSource::Path(path) => self.images.load(path),
            ImageSource::Inline(bytes) => self.images.load_bytes(&source.cache_key(), bytes),
        }
    }

    /// Render a nested scene offscreen at its own size.
    fn render_pattern_scene<S: DrawingSurface>(&self, scene: &Scene, view: &S) -> SceneResult<Arc<RasterImage>> {
        if self.depth >= self.config.max_pattern_depth {
            return Err(SceneError::render(format!(
                "pattern scenes nested deeper than {}",
                self.config.max_pattern_depth
            )));
        }
        let nested = Painter {
            root: scene.layers(),
            viewport: scene.viewport(),
            depth: self.depth + 1,
            ..*self
        };
        let mut offscreen = view.create_offscreen(scene.width(), scene.height());
        for layer in scene.layers().iter() {
            nested.draw(layer, &mut offscreen)?;
        }
        tracing::debug!(depth = nested.depth, width = scene.width(), height = scene.height(), "pattern scene rendered");
        Ok(Arc::new(offscreen.snapshot()))
    }
}

impl BoxGeometry {
    fn frame(&self) -> Frame {
        Frame {
            origin: self.rect.origin(),
            local: Some(self.rect.size()),
            pivot: self.anchor,
        }
    }
}

fn box_geometry(
    r: &Resolver<'_>,
    base: &BaseProps,
    size: &SizeProps,
    centring: Anchor,
    kind: LayerKind,
) -> SceneResult<BoxGeometry> {
    let batch = LengthBatch::new()
        .add("x", &base.x, Axis::Horizontal)
        .add("y", &base.y, Axis::Vertical)
        .add("width", &size.width, Axis::Horizontal)
        .add("height", &size.height, Axis::Vertical)
        .add("radius", &size.radius, Axis::Horizontal);
    let v = r.resolve_batch(&batch)?;
    let (width, height) = (v.get("width"), v.get("height"));
    let origin = align(centring, kind, width, height, v.get("x"), v.get("y"));
    Ok(BoxGeometry {
        anchor: Point::new(v.get("x"), v.get("y")),
        rect: Rect::new(origin.x, origin.y, width, height),
        radius: v.get("radius"),
    })
}

fn resolve_shadow(shadow: &ShadowStyle, r: &Resolver<'_>) -> SceneResult<Shadow> {
    Ok(Shadow {
        color: parse_color(&shadow.color),
        blur: shadow.blur,
        offset_x: r.resolve_along(&shadow.offset_x, Axis::Horizontal)?,
        offset_y: r.resolve_along(&shadow.offset_y, Axis::Vertical)?,
    })
}

/// A point is rotated and scaled about `pivot`, then mapped by the matrix,
/// then translated.
fn resolve_transform(ops: &TransformOps, r: &Resolver<'_>, pivot: Point) -> SceneResult<Transform> {
    let mut t = Transform::identity();
    if let Some(translate) = &ops.translate {
        let offset = r.resolve_point(&translate.x, &translate.y)?;
        t = t.then(&Transform::translation(offset.x, offset.y));
    }
    if let Some([a, b, c, d, e, f]) = ops.matrix {
        t = t.then(&Transform::new(a, b, c, d, e, f));
    }
    if ops.rotate.is_some() || ops.scale.is_some() {
        t = t.then(&Transform::translation(pivot.x, pivot.y));
        if let Some(degrees) = ops.rotate {
            t = t.then(&Transform::rotation(degrees.to_radians()));
        }
        if let Some(scale) = &ops.scale {
            t = t.then(&Transform::scaling(scale.x, scale.y));
        }
        t = t.then(&Transform::translation(-pivot.x, -pivot.y));
    }
    Ok(t)
}

fn resolve_gradient(gradient: &Gradient, r: &Resolver<'_>, frame: &Frame) -> SceneResult<GradientPaint> {
    let horizontal = LengthContext {
        viewport: r.viewport(),
        local: frame.local,
        axis: Axis::Horizontal,
    };
    let vertical = horizontal.with_axis(Axis::Vertical);
    let point = |gp: &GradientPoint| -> SceneResult<(Point, f64)> {
        let p = Point::new(r.resolve(&gp.x, &horizontal)?, r.resolve(&gp.y, &vertical)?);
        let radius = match &gp.r {
            Some(radius) => r.resolve(radius, &horizontal)?,
            None => 0.0,
        };
        Ok((p + frame.origin, radius))
    };

    let needed = if gradient.kind == GradientType::Conic { 1 } else { 2 };
    if gradient.points.len() < needed {
        return Err(SceneError::validation(format!(
            "{:?} gradient needs {} points, got {}",
            gradient.kind,
            needed,
            gradient.points.len()
        )));
    }

    let kind = match gradient.kind {
        GradientType::Linear => GradientKind::Linear {
            start: point(&gradient.points[0])?.0,
            end: point(&gradient.points[1])?.0,
        },
        GradientType::Radial => {
            let (start, start_radius) = point(&gradient.points[0])?;
            let (end, end_radius) = point(&gradient.points[1])?;
            GradientKind::Radial { start, start_radius, end, end_radius }
        }
        GradientType::Conic => GradientKind::Conic {
            center: point(&gradient.points[0])?.0,
            angle: gradient.angle.unwrap_or(0.0),
        },
    };

    let mut stops: Vec<ColorStop> = gradient
        .stops
        .iter()
        .map(|stop| ColorStop {
            offset: stop.offset.clamp(0.0, 1.0),
            color: parse_color(&stop.color),
        })
        .collect();
    stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    Ok(GradientPaint { kind, stops })
}

fn rounded_rect(rect: Rect, radius: f64) -> Vec<PathSegment> {
    let Rect { x, y, width: w, height: h } = rect;
    let r = radius.max(0.0).min(w.abs() / 2.0).min(h.abs() / 2.0);
    if r == 0.0 {
        return vec![
            PathSegment::MoveTo { x, y },
            PathSegment::LineTo { x: x + w, y },
            PathSegment::LineTo { x: x + w, y: y + h },
            PathSegment::LineTo { x, y: y + h },
            PathSegment::ClosePath,
        ];
    }
    let corner = |cx: f64, cy: f64, start: f64| PathSegment::Arc {
        x: cx,
        y: cy,
        radius: r,
        start,
        end: start + FRAC_PI_2,
        anticlockwise: false,
    };
    vec![
        PathSegment::MoveTo { x: x + r, y },
        PathSegment::LineTo { x: x + w - r, y },
        corner(x + w - r, y + r, -FRAC_PI_2),
        PathSegment::LineTo { x: x + w, y: y + h - r },
        corner(x + w - r, y + h - r, 0.0),
        PathSegment::LineTo { x: x + r, y: y + h },
        corner(x + r, y + h - r, FRAC_PI_2),
        PathSegment::LineTo { x, y: y + r },
        corner(x + r, y + r, PI),
        PathSegment::ClosePath,
    ]
}

/// Regular polygon inscribed in `rect`, first vertex at the top.
fn polygon(rect: Rect, sides: u32) -> Vec<PathSegment> {
    let center = rect.center();
    let (rx, ry) = (rect.width / 2.0, rect.height / 2.0);
    let mut segments = Vec::with_capacity(sides as usize + 1);
    for i in 0..sides {
        let angle = -FRAC_PI_2 + 2.0 * PI * i as f64 / sides as f64;
        let x = center.x + rx * angle.cos();
        let y = center.y + ry * angle.sin();
        segments.push(if i == 0 { PathSegment::MoveTo { x, y } } else { PathSegment::LineTo { x, y } });
    }
    segments.push(PathSegment::ClosePath);
    segments
}

fn trace_outline<S: DrawingSurface>(surface: &mut S, segments: &[PathSegment]) {
    surface.begin_path();
    for segment in segments {
        match *segment {
            PathSegment::MoveTo { x, y } => surface.move_to(x, y),
            PathSegment::LineTo { x, y } => surface.line_to(x, y),
            PathSegment::QuadraticCurveTo { cpx, cpy, x, y } => surface.quadratic_curve_to(cpx, cpy, x, y),
            PathSegment::BezierCurveTo { cp1x, cp1y, cp2x, cp2y, x, y } => {
                surface.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y)
            }
            PathSegment::Arc { x, y, radius, start, end, anticlockwise } => {
                surface.arc(x, y, radius, start, end, anticlockwise)
            }
            PathSegment::ClosePath => surface.close_path(),
        }
    }
}

fn execute<S: DrawingSurface>(plan: Plan, surface: &mut S) {
    let Plan { decor, shape } = plan;
    surface.save();
    surface.set_global_alpha(decor.opacity);
    if let Some(shadow) = decor.shadow {
        surface.set_shadow(shadow);
    }
    if let Some(transform) = decor.transform {
        surface.transform(transform);
    }

    match shape {
        Shape::Outline(segments) => {
            trace_outline(surface, &segments);
            if let Some(paint) = decor.fill {
                surface.set_fill_paint(paint);
                surface.fill();
            }
            if let Some((paint, style)) = decor.stroke {
                surface.set_stroke_paint(paint);
                surface.set_line_style(style);
                surface.stroke();
            }
        }
        Shape::Text(run) => {
            surface.set_font(&run.font);
            surface.set_text_align(run.align);
            surface.set_text_baseline(run.baseline);
            let (filled, stroked) = (decor.fill.is_some(), decor.stroke.is_some());
            if let Some(paint) = decor.fill {
                surface.set_fill_paint(paint);
            }
            if let Some((paint, style)) = decor.stroke {
                surface.set_stroke_paint(paint);
                surface.set_line_style(style);
            }
            for (i, line) in run.lines.iter().enumerate() {
                let y = run.position.y + run.line_height * i as f64;
                if filled {
                    surface.fill_text(line, run.position.x, y, run.max_width);
                }
                if stroked {
                    surface.stroke_text(line, run.position.x, y, run.max_width);
                }
            }
        }
        Shape::Image { image, rect, radius } => {
            let outline = rounded_rect(rect, radius);
            if radius > 0.0 {
                trace_outline(surface, &outline);
                surface.clip();
            }
            surface.draw_image(&image, rect.x, rect.y, rect.width, rect.height);
            if let Some((paint, style)) = decor.stroke {
                trace_outline(surface, &outline);
                surface.set_stroke_paint(paint);
                surface.set_line_style(style);
                surface.stroke();
            }
        }
        Shape::Clear(rect) => surface.clear_rect(rect.x, rect.y, rect.width, rect.height),
    }

    surface.restore();
}

#[cfg(test)]
mod tests {
    use super::*;
    use surface::Canvas2D;

    #[test]
    fn test_square_corners_without_radius() {
        let segments = rounded_rect(Rect::new(1.0, 2.0, 10.0, 5.0), 0.0);
        assert_eq!(segments.len(), 5);
        assert_eq!(segments[2], PathSegment::LineTo { x: 11.0, y: 7.0 });
    }

    #[test]
    fn test_radius_clamped_to_half_side() {
        let segments = rounded_rect(Rect::new(0.0, 0.0, 10.0, 4.0), 50.0);
        assert_eq!(segments[0], PathSegment::MoveTo { x: 2.0, y: 0.0 });
        assert!(matches!(segments[2], PathSegment::Arc { radius, .. } if radius == 2.0));
    }

    #[test]
    fn test_polygon_vertices() {
        let segments = polygon(Rect::new(0.0, 0.0, 20.0, 20.0), 4);
        assert_eq!(segments.len(), 5);
        match segments[0] {
            PathSegment::MoveTo { x, y } => {
                assert!((x - 10.0).abs() < 1e-9);
                assert!(y.abs() < 1e-9);
            }
            ref other => panic!("unexpected {:?}", other),
        }
        assert_eq!(segments[4], PathSegment::ClosePath);
    }

    #[test]
    fn test_unknown_color_is_black() {
        assert_eq!(parse_color("not-a-color"), Color::BLACK);
        assert_eq!(parse_color("#ff0000"), Color::RED);
    }

    #[test]
    fn test_transform_pivots_on_anchor() {
        let registry = LayerRegistry::new();
        let canvas = Canvas2D::new(4, 4);
        let config = RenderConfig::default();
        let r = Resolver::new(&registry, Size::new(100.0, 100.0), &canvas, &config);

        let t = resolve_transform(&TransformOps::rotate(90.0), &r, Point::new(10.0, 0.0)).unwrap();
        let p = t.transform_point(Point::new(20.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-9 && (p.y - 10.0).abs() < 1e-9);
        assert_eq!(t.transform_point(Point::new(10.0, 0.0)), Point::new(10.0, 0.0));

        let t = resolve_transform(&TransformOps::translate("10%", 5.0), &r, Point::ZERO).unwrap();
        assert_eq!(t.transform_point(Point::ZERO), Point::new(10.0, 5.0));
    }
}
