//! Coverage masks for flattened paths.
//!
//! Coverage is sampled at pixel centers with the nonzero winding rule. Strokes
//! are turned into fill outlines: one quad per segment, a polygon per join or
//! cap, all oriented the same way so nonzero winding takes their union.

use crate::path::Polyline;
use crate::surface::{LineCap, LineJoin, LineStyle};
use common::geometry::Point;

/// Per-pixel coverage, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    pub bits: Vec<bool>,
}

impl Mask {
    pub fn empty(width: u32, height: u32) -> Self {
        Self { width, height, bits: vec![false; (width * height) as usize] }
    }

    pub fn full(width: u32, height: u32) -> Self {
        Self { width, height, bits: vec![true; (width * height) as usize] }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.bits[(y * self.width + x) as usize]
    }

    pub fn intersect(&mut self, other: &Mask) {
        for (a, b) in self.bits.iter_mut().zip(&other.bits) {
            *a = *a && *b;
        }
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }
}

/// Nonzero-winding fill of `polylines`, each treated as closed.
pub fn fill_mask(polylines: &[Polyline], width: u32, height: u32) -> Mask {
    let mut mask = Mask::empty(width, height);
    let edges: Vec<(Point, Point)> = polylines
        .iter()
        .filter(|line| line.points.len() > 2)
        .flat_map(|line| {
            let n = line.points.len();
            (0..n).map(move |i| (line.points[i], line.points[(i + 1) % n]))
        })
        .filter(|(a, b)| a.y != b.y)
        .collect();

    let mut crossings: Vec<(f64, i32)> = Vec::new();
    for row in 0..height {
        let y = row as f64 + 0.5;
        crossings.clear();
        for (a, b) in &edges {
            let (top, bottom, dir) = if a.y < b.y { (a, b, 1) } else { (b, a, -1) };
            if y >= top.y && y < bottom.y {
                let x = top.x + (y - top.y) / (bottom.y - top.y) * (bottom.x - top.x);
                crossings.push((x, dir));
            }
        }
        if crossings.is_empty() {
            continue;
        }
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut winding = 0;
        for pair in crossings.windows(2) {
            winding += pair[0].1;
            if winding == 0 {
                continue;
            }
            let start = (pair[0].0 - 0.5).ceil().max(0.0) as u32;
            let end = (pair[1].0 - 0.5).ceil().min(width as f64).max(0.0) as u32;
            for col in start..end {
                mask.bits[(row * width + col) as usize] = true;
            }
        }
    }
    mask
}

/// Outline polygons covering a stroke of `polylines`.
pub fn stroke_outline(polylines: &[Polyline], style: &LineStyle, scale: f64) -> Vec<Polyline> {
    let half = (style.width * scale).max(0.0) / 2.0;
    if half == 0.0 {
        return Vec::new();
    }

    let mut shapes = Vec::new();
    for line in polylines {
        let mut points = line.points.clone();
        if line.closed {
            if let Some(first) = points.first().copied() {
                points.push(first);
            }
        }

        for dash in apply_dash(&points, &style.dash, style.dash_offset * scale, scale) {
            for seg in dash.windows(2) {
                if let Some(quad) = segment_quad(seg[0], seg[1], half, style.cap, false) {
                    shapes.push(quad);
                }
            }
            if let (Some(first), Some(last)) = (dash.first(), dash.last()) {
                if !line.closed || style.dash.len() > 1 {
                    match style.cap {
                        LineCap::Butt => {}
                        LineCap::Round => {
                            shapes.push(disc(*first, half));
                            shapes.push(disc(*last, half));
                        }
                        LineCap::Square => {
                            if dash.len() >= 2 {
                                let n = dash.len();
                                shapes.extend(segment_quad(dash[0], dash[1], half, LineCap::Square, true));
                                shapes.extend(segment_quad(dash[n - 2], dash[n - 1], half, LineCap::Square, true));
                            }
                        }
                    }
                }
            }
            let interior = if line.closed && style.dash.len() <= 1 {
                &dash[..]
            } else if dash.len() > 2 {
                &dash[1..dash.len() - 1]
            } else {
                &[][..]
            };
            for joint in interior {
                match style.join {
                    LineJoin::Round | LineJoin::Miter => shapes.push(disc(*joint, half)),
                    LineJoin::Bevel => {}
                }
            }
        }
    }
    shapes.into_iter().map(oriented).collect()
}

fn segment_quad(a: Point, b: Point, half: f64, cap: LineCap, extend: bool) -> Option<Polyline> {
    let len = a.distance(b);
    if len == 0.0 {
        return None;
    }
    let dir = Point::new((b.x - a.x) / len, (b.y - a.y) / len);
    let normal = Point::new(-dir.y, dir.x) * half;
    let (a, b) = if extend && cap == LineCap::Square {
        (a - dir * half, b + dir * half)
    } else {
        (a, b)
    };
    Some(Polyline {
        points: vec![a + normal, b + normal, b - normal, a - normal],
        closed: true,
    })
}

fn disc(center: Point, radius: f64) -> Polyline {
    let steps = 16;
    let points = (0..steps)
        .map(|i| {
            let angle = i as f64 / steps as f64 * std::f64::consts::TAU;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect();
    Polyline { points, closed: true }
}

fn oriented(mut line: Polyline) -> Polyline {
    let n = line.points.len();
    let area: f64 = (0..n)
        .map(|i| {
            let (a, b) = (line.points[i], line.points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum();
    if area < 0.0 {
        line.points.reverse();
    }
    line
}

/// Split `points` into dash runs.
fn apply_dash(points: &[Point], dash: &[f64], offset: f64, scale: f64) -> Vec<Vec<Point>> {
    let pattern: Vec<f64> = dash.iter().map(|d| d.abs() * scale).collect();
    let total: f64 = pattern.iter().sum();
    if pattern.is_empty() || total <= 0.0 {
        return vec![points.to_vec()];
    }
    // An odd-length dash list repeats to even length.
    let pattern: Vec<f64> = if pattern.len() % 2 == 1 {
        pattern.iter().chain(pattern.iter()).copied().collect()
    } else {
        pattern
    };
    let total: f64 = pattern.iter().sum();

    let mut index = 0;
    let mut remaining = pattern[0];
    let mut skip = offset.rem_euclid(total);
    while skip > 0.0 {
        if skip >= remaining {
            skip -= remaining;
            index = (index + 1) % pattern.len();
            remaining = pattern[index];
        } else {
            remaining -= skip;
            skip = 0.0;
        }
    }

    let mut runs = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    for seg in points.windows(2) {
        let (mut a, b) = (seg[0], seg[1]);
        let mut seg_len = a.distance(b);
        while seg_len > 0.0 {
            let on = index % 2 == 0;
            if on && current.is_empty() {
                current.push(a);
            }
            let step = remaining.min(seg_len);
            let next = a.lerp(b, step / seg_len);
            if on {
                current.push(next);
            }
            remaining -= step;
            seg_len -= step;
            a = next;
            if remaining <= 0.0 {
                if on && current.len() > 1 {
                    runs.push(std::mem::take(&mut current));
                }
                current.clear();
                index = (index + 1) % pattern.len();
                remaining = pattern[index];
            }
        }
    }
    if current.len() > 1 {
        runs.push(current);
    }
    runs
}
