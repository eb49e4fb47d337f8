//! Device-space paths.
//!
//! Path calls arrive in user space; [`Path`] maps every point through the
//! transform current at call time, so stored commands are transform-free.
//! Arcs are converted to cubic segments on entry.

use common::geometry::{Point, Transform};
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt::Write;

/// Path command in device space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadraticCurveTo(Point, Point),
    BezierCurveTo(Point, Point, Point),
    ClosePath,
}

/// A flattened subpath.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// A path under construction.
#[derive(Clone, Debug, Default)]
pub struct Path {
    commands: Vec<PathCommand>,
    /// Current point in device space.
    current: Option<Point>,
    subpath_start: Option<Point>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.current = None;
        self.subpath_start = None;
    }

    pub fn move_to(&mut self, t: &Transform, x: f64, y: f64) {
        let p = t.transform_point(Point::new(x, y));
        self.commands.push(PathCommand::MoveTo(p));
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    pub fn line_to(&mut self, t: &Transform, x: f64, y: f64) {
        let p = t.transform_point(Point::new(x, y));
        self.ensure_subpath(p);
        self.commands.push(PathCommand::LineTo(p));
        self.current = Some(p);
    }

    pub fn quadratic_curve_to(&mut self, t: &Transform, cpx: f64, cpy: f64, x: f64, y: f64) {
        let cp = t.transform_point(Point::new(cpx, cpy));
        let p = t.transform_point(Point::new(x, y));
        self.ensure_subpath(cp);
        self.commands.push(PathCommand::QuadraticCurveTo(cp, p));
        self.current = Some(p);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn bezier_curve_to(
        &mut self,
        t: &Transform,
        cp1x: f64,
        cp1y: f64,
        cp2x: f64,
        cp2y: f64,
        x: f64,
        y: f64,
    ) {
        let cp1 = t.transform_point(Point::new(cp1x, cp1y));
        let cp2 = t.transform_point(Point::new(cp2x, cp2y));
        let p = t.transform_point(Point::new(x, y));
        self.ensure_subpath(cp1);
        self.commands.push(PathCommand::BezierCurveTo(cp1, cp2, p));
        self.current = Some(p);
    }

    /// Circular arc, approximated with one cubic per quarter turn.
    #[allow(clippy::too_many_arguments)]
    pub fn arc(
        &mut self,
        t: &Transform,
        cx: f64,
        cy: f64,
        radius: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    ) {
        let radius = radius.abs();
        let mut sweep = end - start;
        if anticlockwise {
            if sweep > 0.0 {
                sweep -= 2.0 * PI * (sweep / (2.0 * PI)).ceil();
            }
            sweep = sweep.max(-2.0 * PI);
        } else {
            if sweep < 0.0 {
                sweep += 2.0 * PI * (-sweep / (2.0 * PI)).ceil();
            }
            sweep = sweep.min(2.0 * PI);
        }

        let at = |angle: f64| Point::new(cx + radius * angle.cos(), cy + radius * angle.sin());
        let first = at(start);
        if self.current.is_some() {
            self.line_to(t, first.x, first.y);
        } else {
            self.move_to(t, first.x, first.y);
        }

        let segments = (sweep.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
        let step = sweep / segments as f64;
        let k = 4.0 / 3.0 * (step / 4.0).tan();
        for i in 0..segments {
            let a0 = start + step * i as f64;
            let a1 = a0 + step;
            let p0 = at(a0);
            let p3 = at(a1);
            let c1 = Point::new(p0.x - k * radius * a0.sin(), p0.y + k * radius * a0.cos());
            let c2 = Point::new(p3.x + k * radius * a1.sin(), p3.y - k * radius * a1.cos());
            self.bezier_curve_to(t, c1.x, c1.y, c2.x, c2.y, p3.x, p3.y);
        }
    }

    pub fn close_path(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.commands.push(PathCommand::ClosePath);
        self.current = self.subpath_start;
    }

    fn ensure_subpath(&mut self, p: Point) {
        if self.current.is_none() {
            self.commands.push(PathCommand::MoveTo(p));
            self.current = Some(p);
            self.subpath_start = Some(p);
        }
    }

    /// Flatten curves into polylines using `steps` samples per curve.
    pub fn flatten(&self, steps: usize) -> Vec<Polyline> {
        let steps = steps.max(1);
        let mut out = Vec::new();
        let mut current = Polyline { points: Vec::new(), closed: false };

        let push = |current: &mut Polyline, out: &mut Vec<Polyline>| {
            if current.points.len() > 1 {
                out.push(std::mem::replace(current, Polyline { points: Vec::new(), closed: false }));
            } else {
                current.points.clear();
                current.closed = false;
            }
        };

        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) => {
                    push(&mut current, &mut out);
                    current.points.push(p);
                }
                PathCommand::LineTo(p) => current.points.push(p),
                PathCommand::QuadraticCurveTo(c, p) => {
                    let p0 = current.points.last().copied().unwrap_or(c);
                    for i in 1..=steps {
                        let t = i as f64 / steps as f64;
                        current.points.push(quadratic_point(p0, c, p, t));
                    }
                }
                PathCommand::BezierCurveTo(c1, c2, p) => {
                    let p0 = current.points.last().copied().unwrap_or(c1);
                    for i in 1..=steps {
                        let t = i as f64 / steps as f64;
                        current.points.push(cubic_point(p0, c1, c2, p, t));
                    }
                }
                PathCommand::ClosePath => {
                    current.closed = true;
                    let start = current.points.first().copied();
                    push(&mut current, &mut out);
                    if let Some(start) = start {
                        current.points.push(start);
                    }
                }
            }
        }
        push(&mut current, &mut out);
        out
    }

    /// SVG path data for the stored commands.
    pub fn to_svg_data(&self, relative: bool) -> String {
        let mut d = String::new();
        let mut last = Point::ZERO;
        let mut start = Point::ZERO;
        for command in &self.commands {
            let (abs_cmd, rel_cmd, points): (char, char, Vec<Point>) = match *command {
                PathCommand::MoveTo(p) => ('M', 'm', vec![p]),
                PathCommand::LineTo(p) => ('L', 'l', vec![p]),
                PathCommand::QuadraticCurveTo(c, p) => ('Q', 'q', vec![c, p]),
                PathCommand::BezierCurveTo(c1, c2, p) => ('C', 'c', vec![c1, c2, p]),
                PathCommand::ClosePath => {
                    d.push_str(if relative { "z" } else { "Z" });
                    last = start;
                    continue;
                }
            };
            d.push(if relative { rel_cmd } else { abs_cmd });
            for p in &points {
                let q = if relative { *p - last } else { *p };
                let _ = write!(d, "{} {} ", fmt_num(q.x), fmt_num(q.y));
            }
            if let Some(end) = points.last() {
                last = *end;
            }
            if matches!(command, PathCommand::MoveTo(_)) {
                start = last;
            }
        }
        d.trim_end().to_string()
    }
}

fn fmt_num(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    format!("{}", rounded)
}

/// Point on a quadratic Bézier.
pub fn quadratic_point(p0: Point, p1: Point, p2: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    Point::new(
        mt * mt * p0.x + 2.0 * mt * t * p1.x + t * t * p2.x,
        mt * mt * p0.y + 2.0 * mt * t * p1.y + t * t * p2.y,
    )
}

/// Point on a cubic Bézier.
pub fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_applied_at_call_time() {
        let mut path = Path::new();
        path.move_to(&Transform::translation(10.0, 0.0), 0.0, 0.0);
        path.line_to(&Transform::identity(), 5.0, 5.0);
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo(Point::new(10.0, 0.0)),
                PathCommand::LineTo(Point::new(5.0, 5.0)),
            ]
        );
    }

    #[test]
    fn test_line_without_move_starts_subpath() {
        let mut path = Path::new();
        path.line_to(&Transform::identity(), 3.0, 4.0);
        assert!(matches!(path.commands()[0], PathCommand::MoveTo(_)));
    }

    #[test]
    fn test_flatten_closed_rect() {
        let t = Transform::identity();
        let mut path = Path::new();
        path.move_to(&t, 0.0, 0.0);
        path.line_to(&t, 10.0, 0.0);
        path.line_to(&t, 10.0, 10.0);
        path.close_path();
        let lines = path.flatten(8);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].closed);
        assert_eq!(lines[0].points.len(), 3);
    }

    #[test]
    fn test_full_circle_arc_ends_at_start() {
        let mut path = Path::new();
        path.arc(&Transform::identity(), 0.0, 0.0, 10.0, 0.0, 2.0 * PI, false);
        let lines = path.flatten(16);
        let points = &lines[0].points;
        let first = points[0];
        let last = points[points.len() - 1];
        assert!(first.distance(last) < 1e-9);
        assert!(points.iter().all(|p| (p.distance(Point::ZERO) - 10.0).abs() < 0.05));
    }

    #[test]
    fn test_svg_data() {
        let t = Transform::identity();
        let mut path = Path::new();
        path.move_to(&t, 1.0, 2.0);
        path.line_to(&t, 4.0, 6.0);
        path.close_path();
        assert_eq!(path.to_svg_data(false), "M1 2 L4 6 Z");
        assert_eq!(path.to_svg_data(true), "m1 2 l3 4 z");
    }
}
