//! Drawing surfaces.
//!
//! This crate provides:
//! - The [`DrawingSurface`] interface the scene renderer draws through
//! - [`Canvas2D`], an in-memory RGBA surface with a vector command log
//! - Image decoding into [`RasterImage`]s

pub mod surface;
pub mod path;
pub mod raster;
pub mod canvas;
pub mod bitmap;

pub use self::canvas::Canvas2D;
pub use bitmap::{ImageLoader, RasterImage};
pub use path::{Path, PathCommand};
pub use surface::{
    ColorStop, CompositeOperation, DrawingSurface, GradientKind, GradientPaint, LineCap, LineJoin,
    LineStyle, Paint, PatternPaint, RasterFormat, Repetition, Shadow, TextAlign, TextBaseline,
    TextMetrics, VectorFlag,
};
