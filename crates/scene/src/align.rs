//! Anchor alignment.
//!
//! Box-shaped layers (image, morph, clear) treat their position as an anchor
//! point on the box and shift it to the top-left corner. Every other kind
//! draws from its literal position.

use crate::layer::LayerKind;
use common::geometry::Point;
use serde::{Deserialize, Serialize};

/// Which point of a layer's box the position names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    StartTop,
    Start,
    StartBottom,
    CenterTop,
    #[default]
    Center,
    CenterBottom,
    EndTop,
    End,
    EndBottom,
    None,
}

impl Anchor {
    /// Fractions of width and height between the anchor and the top-left corner.
    fn factors(&self) -> (f64, f64) {
        match self {
            Anchor::StartTop => (0.0, 0.0),
            Anchor::Start => (0.0, 0.5),
            Anchor::StartBottom => (0.0, 1.0),
            Anchor::CenterTop => (0.5, 0.0),
            Anchor::Center => (0.5, 0.5),
            Anchor::CenterBottom => (0.5, 1.0),
            Anchor::EndTop => (1.0, 0.0),
            Anchor::End => (1.0, 0.5),
            Anchor::EndBottom => (1.0, 1.0),
            Anchor::None => (0.0, 0.0),
        }
    }
}

/// Top-left draw origin for a layer of `kind` anchored at `(x, y)`.
pub fn align(anchor: Anchor, kind: LayerKind, width: f64, height: f64, x: f64, y: f64) -> Point {
    if !kind.is_box() {
        return Point::new(x, y);
    }
    let (fx, fy) = anchor.factors();
    Point::new(x - width * fx, y - height * fy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_box() {
        let p = align(Anchor::Center, LayerKind::Morph, 200.0, 200.0, 300.0, 300.0);
        assert_eq!(p, Point::new(200.0, 200.0));
    }

    #[test]
    fn test_start_top_box() {
        let p = align(Anchor::StartTop, LayerKind::Image, 200.0, 200.0, 300.0, 300.0);
        assert_eq!(p, Point::new(300.0, 300.0));
    }

    #[test]
    fn test_line_never_shifts() {
        for kind in [LayerKind::Line, LayerKind::Quadratic, LayerKind::Text, LayerKind::Polygon] {
            let p = align(Anchor::Center, kind, 200.0, 200.0, 300.0, 300.0);
            assert_eq!(p, Point::new(300.0, 300.0));
        }
    }

    #[test]
    fn test_end_bottom_and_none() {
        let p = align(Anchor::EndBottom, LayerKind::Clear, 40.0, 20.0, 100.0, 100.0);
        assert_eq!(p, Point::new(60.0, 80.0));
        let p = align(Anchor::None, LayerKind::Clear, 40.0, 20.0, 100.0, 100.0);
        assert_eq!(p, Point::new(100.0, 100.0));
        let p = align(Anchor::Start, LayerKind::Morph, 40.0, 20.0, 100.0, 100.0);
        assert_eq!(p, Point::new(100.0, 90.0));
    }

    #[test]
    fn test_anchor_names() {
        let anchor: Anchor = serde_json::from_str("\"center-bottom\"").unwrap();
        assert_eq!(anchor, Anchor::CenterBottom);
        assert_eq!(serde_json::to_string(&Anchor::StartTop).unwrap(), "\"start-top\"");
    }
}
