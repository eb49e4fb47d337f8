//! Sampled bounding boxes of lines and Bézier curves.

use common::error::{SceneError, SceneResult};
use common::geometry::{Point, Rect};
use surface::path::{cubic_point, quadratic_point};

/// Axis-aligned bounds of a curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
    pub center: Point,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    fn from_extremes(min: Point, max: Point) -> Self {
        Self {
            min,
            max,
            center: Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0),
            width: max.x - min.x,
            height: max.y - min.y,
        }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.min.x, self.min.y, self.width, self.height)
    }
}

/// Bounding box of a line (2 points), quadratic (3) or cubic (4) curve.
///
/// The curve is sampled at `samples + 1` evenly spaced parameters, so the
/// result can undershoot the exact extremes by less than one step.
pub fn bounding_box(points: &[Point], samples: usize) -> SceneResult<BoundingBox> {
    let at: Box<dyn Fn(f64) -> Point + '_> = match *points {
        [a, b] => Box::new(move |t| a.lerp(b, t)),
        [a, b, c] => Box::new(move |t| quadratic_point(a, b, c, t)),
        [a, b, c, d] => Box::new(move |t| cubic_point(a, b, c, d, t)),
        _ => {
            return Err(SceneError::validation(format!(
                "bounding box needs 2 to 4 points, got {}",
                points.len()
            )))
        }
    };

    let samples = samples.max(1);
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for i in 0..=samples {
        let p = at(i as f64 / samples as f64);
        min = Point::new(min.x.min(p.x), min.y.min(p.y));
        max = Point::new(max.x.max(p.x), max.y.max(p.y));
    }
    Ok(BoundingBox::from_extremes(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_bounds() {
        let points = [Point::new(0.0, 0.0), Point::new(50.0, 100.0), Point::new(100.0, 0.0)];
        let bbox = bounding_box(&points, 100).unwrap();
        assert_eq!(bbox.min.y, 0.0);
        assert!((bbox.max.y - 50.0).abs() < 1e-9);
        assert!((bbox.center.x - 50.0).abs() < 1e-9);
        assert!((bbox.center.y - 25.0).abs() < 1e-9);
        assert!((bbox.width - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_bounds() {
        let bbox = bounding_box(&[Point::new(10.0, 40.0), Point::new(30.0, 0.0)], 10).unwrap();
        assert_eq!(bbox.to_rect(), Rect::new(10.0, 0.0, 20.0, 40.0));
    }

    #[test]
    fn test_cubic_bounds_within_tolerance() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(0.0, 100.0),
            Point::new(100.0, 100.0),
            Point::new(100.0, 0.0),
        ];
        let bbox = bounding_box(&points, 100).unwrap();
        // Exact maximum is 75 at t = 0.5, which is sampled.
        assert!((bbox.max.y - 75.0).abs() < 1e-9);
        assert_eq!(bbox.width, 100.0);
    }

    #[test]
    fn test_unsupported_point_count() {
        assert!(bounding_box(&[Point::ZERO], 100).is_err());
        assert!(bounding_box(&[Point::ZERO; 5], 100).is_err());
    }
}
