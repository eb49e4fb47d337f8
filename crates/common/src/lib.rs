//! Common types shared by the surface and scene crates.

pub mod color;
pub mod geometry;
pub mod error;
pub mod units;

pub use color::Color;
pub use geometry::{Point, Size, Rect, Transform};
pub use error::{SceneError, SceneResult};
pub use units::{Axis, Length, LengthContext, LengthReference, ReferenceAttribute, ViewportKeyword};
