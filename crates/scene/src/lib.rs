//! Declarative 2D layer scenes.
//!
//! A [`Scene`] holds layers whose geometry may be given as numbers,
//! percentages, viewport keywords or references to other layers. The crate
//! provides:
//! - Symbolic length and cross-layer reference resolution
//! - A z-ordered layer registry with cross-group lookup
//! - The render orchestrator and static/animated export
//! - Lossless JSON documents for scenes

pub mod align;
pub mod animation;
pub mod bbox;
pub mod codec;
pub mod config;
mod draw;
pub mod hooks;
pub mod layer;
pub mod props;
pub mod quantize;
pub mod registry;
pub mod renderer;
pub mod resolve;
pub mod scene;
pub mod style;

pub use align::Anchor;
pub use animation::{AnimationEncoder, AnimationOptions};
pub use config::RenderConfig;
pub use hooks::{HookRegistry, RenderHook};
pub use layer::{
    BezierLayer, ClearLayer, Group, ImageLayer, Layer, LayerKind, LineLayer, MorphLayer, PathLayer,
    PolygonLayer, QuadraticLayer, TextLayer,
};
pub use registry::LayerRegistry;
pub use renderer::{Export, RenderStats, Renderer};
pub use scene::{ExportType, Scene, SceneOptions};
pub use style::{FillStyle, Gradient, ImageSource, Pattern, PatternSource};
