//! Scene layers.
//!
//! [`Layer`] is a closed set of kinds. Every drawable kind is a
//! [`LayerNode`] over its own props record; groups own a nested
//! [`LayerRegistry`]. Nodes are built by value with `with_*` setters, and
//! setters whose input has invariants validate eagerly (`try_with_*`).

use crate::align::Anchor;
use crate::props::{
    BaseProps, BezierProps, ClearProps, Font, HasBase, ImageProps, LineProps, MorphProps,
    Multiline, PathProps, PathSegment, PointProps, PolygonProps, QuadraticProps, ShadowStyle,
    SizeProps, StrokeStyle, TextProps, TransformOps,
};
use crate::registry::LayerRegistry;
use crate::style::{FillStyle, ImageSource};
use bitflags::bitflags;
use common::error::{SceneError, SceneResult};
use common::units::Length;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::sync::atomic::{AtomicU64, Ordering};
use surface::{CompositeOperation, TextAlign, TextBaseline};

static NEXT_LAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a process-unique layer id.
pub fn next_layer_id() -> String {
    format!("layer-{}", NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed))
}

fn default_visible() -> bool {
    true
}

fn check_opacity(id: &str, opacity: f64) -> SceneResult<()> {
    if !(0.0..=1.0).contains(&opacity) {
        return Err(SceneError::validation(format!(
            "opacity {} outside [0, 1] on layer {}",
            opacity, id
        )));
    }
    Ok(())
}

fn check_font_size(id: &str, size: f64) -> SceneResult<()> {
    if !size.is_finite() || size <= 0.0 {
        return Err(SceneError::validation(format!(
            "font size {} must be positive on layer {}",
            size, id
        )));
    }
    Ok(())
}

fn check_sides(id: &str, sides: u32) -> SceneResult<()> {
    if sides < 3 {
        return Err(SceneError::validation(format!(
            "polygon needs at least 3 sides, got {} on layer {}",
            sides, id
        )));
    }
    Ok(())
}

/// Layer kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Text,
    Image,
    Morph,
    Quadratic,
    Bezier,
    Line,
    Polygon,
    Path,
    Clear,
    Group,
}

impl LayerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Text => "text",
            LayerKind::Image => "image",
            LayerKind::Morph => "morph",
            LayerKind::Quadratic => "quadratic",
            LayerKind::Bezier => "bezier",
            LayerKind::Line => "line",
            LayerKind::Polygon => "polygon",
            LayerKind::Path => "path",
            LayerKind::Clear => "clear",
            LayerKind::Group => "group",
        }
    }

    /// Kinds whose position is an anchor on a declared box.
    pub fn is_box(&self) -> bool {
        matches!(self, LayerKind::Image | LayerKind::Morph | LayerKind::Clear)
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            LayerKind::Text
            | LayerKind::Morph
            | LayerKind::Polygon
            | LayerKind::Quadratic
            | LayerKind::Bezier => Capabilities::all(),
            LayerKind::Line => Capabilities::GEOMETRY | Capabilities::STROKE | Capabilities::DRAWABLE,
            LayerKind::Image => Capabilities::GEOMETRY | Capabilities::STROKE | Capabilities::DRAWABLE,
            LayerKind::Path => Capabilities::PAINT | Capabilities::STROKE | Capabilities::DRAWABLE,
            LayerKind::Clear => Capabilities::GEOMETRY | Capabilities::DRAWABLE,
            LayerKind::Group => Capabilities::DRAWABLE,
        }
    }
}

bitflags! {
    /// What a layer kind supports.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Has scalar geometry other layers can reference.
        const GEOMETRY = 1 << 0;
        /// Can be filled.
        const PAINT = 1 << 1;
        /// Can be stroked.
        const STROKE = 1 << 2;
        /// Produces output when rendered.
        const DRAWABLE = 1 << 3;
    }
}

/// Kinds with a declared box size.
pub trait HasDeclaredSize {
    fn declared_size(&self) -> &SizeProps;
}

/// Kinds whose extent comes from sampling their curve.
pub trait HasBoundingBox {
    /// Start point followed by control and end points.
    fn curve_points(&self) -> SmallVec<[(&Length, &Length); 4]>;
}

/// Kinds whose extent comes from text measurement.
pub trait HasMeasuredText {
    fn text(&self) -> &str;
    fn font(&self) -> &Font;
    fn max_width(&self) -> Option<&Length>;
    fn multiline(&self) -> &Multiline;
}

impl HasDeclaredSize for ImageProps {
    fn declared_size(&self) -> &SizeProps {
        &self.size
    }
}

impl HasDeclaredSize for MorphProps {
    fn declared_size(&self) -> &SizeProps {
        &self.size
    }
}

impl HasDeclaredSize for PolygonProps {
    fn declared_size(&self) -> &SizeProps {
        &self.size
    }
}

impl HasDeclaredSize for ClearProps {
    fn declared_size(&self) -> &SizeProps {
        &self.size
    }
}

impl HasBoundingBox for LineProps {
    fn curve_points(&self) -> SmallVec<[(&Length, &Length); 4]> {
        smallvec![(&self.base.x, &self.base.y), (&self.end.x, &self.end.y)]
    }
}

impl HasBoundingBox for QuadraticProps {
    fn curve_points(&self) -> SmallVec<[(&Length, &Length); 4]> {
        smallvec![
            (&self.base.x, &self.base.y),
            (&self.control.x, &self.control.y),
            (&self.end.x, &self.end.y),
        ]
    }
}

impl HasBoundingBox for BezierProps {
    fn curve_points(&self) -> SmallVec<[(&Length, &Length); 4]> {
        smallvec![
            (&self.base.x, &self.base.y),
            (&self.controls[0].x, &self.controls[0].y),
            (&self.controls[1].x, &self.controls[1].y),
            (&self.end.x, &self.end.y),
        ]
    }
}

impl HasMeasuredText for TextProps {
    fn text(&self) -> &str {
        &self.text
    }

    fn font(&self) -> &Font {
        &self.font
    }

    fn max_width(&self) -> Option<&Length> {
        self.max_width.as_ref()
    }

    fn multiline(&self) -> &Multiline {
        &self.multiline
    }
}

/// A drawable layer: identity, stacking and kind-specific props.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerNode<P> {
    #[serde(default = "next_layer_id")]
    pub id: String,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub props: P,
}

pub type TextLayer = LayerNode<TextProps>;
pub type ImageLayer = LayerNode<ImageProps>;
pub type MorphLayer = LayerNode<MorphProps>;
pub type QuadraticLayer = LayerNode<QuadraticProps>;
pub type BezierLayer = LayerNode<BezierProps>;
pub type LineLayer = LayerNode<LineProps>;
pub type PolygonLayer = LayerNode<PolygonProps>;
pub type PathLayer = LayerNode<PathProps>;
pub type ClearLayer = LayerNode<ClearProps>;

impl<P: HasBase> LayerNode<P> {
    fn with_props(props: P) -> Self {
        Self {
            id: next_layer_id(),
            z_index: 0,
            visible: true,
            props,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_position(mut self, x: impl Into<Length>, y: impl Into<Length>) -> Self {
        let base = self.props.base_mut();
        base.x = x.into();
        base.y = y.into();
        self
    }

    pub fn with_fill(mut self, fill: impl Into<FillStyle>) -> Self {
        self.props.base_mut().fill_style = Some(fill.into());
        self
    }

    pub fn with_stroke(mut self, stroke: StrokeStyle) -> Self {
        self.props.base_mut().stroke = Some(stroke);
        self
    }

    pub fn with_shadow(mut self, shadow: ShadowStyle) -> Self {
        self.props.base_mut().shadow = Some(shadow);
        self
    }

    pub fn with_composite(mut self, op: CompositeOperation) -> Self {
        self.props.base_mut().global_composite = op;
        self
    }

    pub fn with_transform(mut self, transform: TransformOps) -> Self {
        self.props.base_mut().transform = Some(transform);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.props.base_mut().filter = Some(filter.into());
        self
    }

    /// Set opacity; must lie in `[0, 1]`.
    pub fn try_with_opacity(mut self, opacity: f64) -> SceneResult<Self> {
        check_opacity(&self.id, opacity)?;
        self.props.base_mut().opacity = opacity;
        Ok(self)
    }

    pub fn base(&self) -> &BaseProps {
        self.props.base()
    }
}

impl TextLayer {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_props(TextProps {
            base: BaseProps::default(),
            text: text.into(),
            font: Font::default(),
            align: TextAlign::Start,
            baseline: TextBaseline::Alphabetic,
            max_width: None,
            multiline: Multiline::default(),
        })
    }

    pub fn with_font(mut self, font: Font) -> Self {
        self.props.font = font;
        self
    }

    /// Set font size; must be positive.
    pub fn try_with_font_size(mut self, size: f64) -> SceneResult<Self> {
        check_font_size(&self.id, size)?;
        self.props.font.size = size;
        Ok(self)
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.props.align = align;
        self
    }

    pub fn with_baseline(mut self, baseline: TextBaseline) -> Self {
        self.props.baseline = baseline;
        self
    }

    pub fn with_max_width(mut self, width: impl Into<Length>) -> Self {
        self.props.max_width = Some(width.into());
        self
    }

    /// Wrap at `max_width` with lines `spacing` font sizes apart.
    pub fn with_multiline(mut self, spacing: f64) -> Self {
        self.props.multiline = Multiline { enabled: true, spacing };
        self
    }
}

impl ImageLayer {
    pub fn new(src: ImageSource, width: impl Into<Length>, height: impl Into<Length>) -> Self {
        Self::with_props(ImageProps {
            base: BaseProps::default(),
            src,
            size: SizeProps::new(width, height),
            centring: Anchor::Center,
        })
    }

    pub fn with_centring(mut self, anchor: Anchor) -> Self {
        self.props.centring = anchor;
        self
    }

    pub fn with_radius(mut self, radius: impl Into<Length>) -> Self {
        self.props.size.radius = radius.into();
        self
    }
}

impl MorphLayer {
    pub fn new(width: impl Into<Length>, height: impl Into<Length>) -> Self {
        Self::with_props(MorphProps {
            base: BaseProps::default(),
            size: SizeProps::new(width, height),
            centring: Anchor::Center,
        })
    }

    pub fn with_centring(mut self, anchor: Anchor) -> Self {
        self.props.centring = anchor;
        self
    }

    pub fn with_radius(mut self, radius: impl Into<Length>) -> Self {
        self.props.size.radius = radius.into();
        self
    }
}

impl QuadraticLayer {
    pub fn new(control: PointProps, end: PointProps) -> Self {
        Self::with_props(QuadraticProps { base: BaseProps::default(), control, end })
    }
}

impl BezierLayer {
    pub fn new(controls: [PointProps; 2], end: PointProps) -> Self {
        Self::with_props(BezierProps { base: BaseProps::default(), controls, end })
    }
}

impl LineLayer {
    pub fn new(end: PointProps) -> Self {
        Self::with_props(LineProps { base: BaseProps::default(), end })
    }
}

impl PolygonLayer {
    pub fn try_new(sides: u32, width: impl Into<Length>, height: impl Into<Length>) -> SceneResult<Self> {
        Self::with_props(PolygonProps {
            base: BaseProps::default(),
            size: SizeProps::new(width, height),
            sides: 3,
        })
        .try_with_sides(sides)
    }

    /// Set side count; at least 3.
    pub fn try_with_sides(mut self, sides: u32) -> SceneResult<Self> {
        check_sides(&self.id, sides)?;
        self.props.sides = sides;
        Ok(self)
    }
}

impl PathLayer {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self::with_props(PathProps { base: BaseProps::default(), segments })
    }
}

impl ClearLayer {
    pub fn new(width: impl Into<Length>, height: impl Into<Length>) -> Self {
        Self::with_props(ClearProps {
            base: BaseProps::default(),
            size: SizeProps::new(width, height),
            centring: Anchor::Center,
        })
    }

    pub fn with_centring(mut self, anchor: Anchor) -> Self {
        self.props.centring = anchor;
        self
    }
}

/// A named, stacked container of layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default = "next_layer_id")]
    pub id: String,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub layers: LayerRegistry,
}

impl Group {
    pub fn new() -> Self {
        Self {
            id: next_layer_id(),
            z_index: 0,
            visible: true,
            layers: LayerRegistry::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Add children; fails on a duplicate id within the group.
    pub fn with_layers<I, L>(mut self, layers: I) -> SceneResult<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Option<Layer>>,
    {
        self.layers.add(layers)?;
        Ok(self)
    }
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

/// Any layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Layer {
    Text(TextLayer),
    Image(ImageLayer),
    Morph(MorphLayer),
    Quadratic(QuadraticLayer),
    Bezier(BezierLayer),
    Line(LineLayer),
    Polygon(PolygonLayer),
    Path(PathLayer),
    Clear(ClearLayer),
    Group(Group),
}

macro_rules! dispatch {
    ($layer:expr, $node:ident => $body:expr, $group:ident => $group_body:expr) => {
        match $layer {
            Layer::Text($node) => $body,
            Layer::Image($node) => $body,
            Layer::Morph($node) => $body,
            Layer::Quadratic($node) => $body,
            Layer::Bezier($node) => $body,
            Layer::Line($node) => $body,
            Layer::Polygon($node) => $body,
            Layer::Path($node) => $body,
            Layer::Clear($node) => $body,
            Layer::Group($group) => $group_body,
        }
    };
}

impl Layer {
    pub fn id(&self) -> &str {
        dispatch!(self, node => &node.id, group => &group.id)
    }

    pub fn z_index(&self) -> i32 {
        dispatch!(self, node => node.z_index, group => group.z_index)
    }

    pub fn set_z_index(&mut self, z_index: i32) {
        dispatch!(self, node => node.z_index = z_index, group => group.z_index = z_index)
    }

    pub fn visible(&self) -> bool {
        dispatch!(self, node => node.visible, group => group.visible)
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Text(_) => LayerKind::Text,
            Layer::Image(_) => LayerKind::Image,
            Layer::Morph(_) => LayerKind::Morph,
            Layer::Quadratic(_) => LayerKind::Quadratic,
            Layer::Bezier(_) => LayerKind::Bezier,
            Layer::Line(_) => LayerKind::Line,
            Layer::Polygon(_) => LayerKind::Polygon,
            Layer::Path(_) => LayerKind::Path,
            Layer::Clear(_) => LayerKind::Clear,
            Layer::Group(_) => LayerKind::Group,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.kind().capabilities()
    }

    /// Shared props; `None` for groups.
    pub fn base(&self) -> Option<&BaseProps> {
        dispatch!(self, node => Some(node.props.base()), _group => None)
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Layer::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Re-check the invariants the `try_with_*` setters enforce, recursing
    /// into groups. Layers that did not come through the builders (decoded
    /// documents) go through this before use.
    pub fn validate(&self) -> SceneResult<()> {
        match self {
            Layer::Group(group) => group.layers.iter().try_for_each(Layer::validate),
            Layer::Text(node) => {
                check_opacity(&node.id, node.props.base.opacity)?;
                check_font_size(&node.id, node.props.font.size)
            }
            Layer::Polygon(node) => {
                check_opacity(&node.id, node.props.base.opacity)?;
                check_sides(&node.id, node.props.sides)
            }
            other => dispatch!(
                other,
                node => check_opacity(&node.id, node.props.base().opacity),
                _group => Ok(())
            ),
        }
    }

    /// Number of non-group layers, counting into groups.
    pub fn leaf_count(&self) -> usize {
        match self {
            Layer::Group(group) => group.layers.iter().map(Layer::leaf_count).sum(),
            _ => 1,
        }
    }

    /// Multiply absolute lengths by `ratio`, recursing into groups.
    pub fn scale(&mut self, ratio: f64) {
        dispatch!(self, node => node.props.scale(ratio), group => group.layers.scale(ratio))
    }
}

macro_rules! impl_into_layer {
    ($($node:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$node> for Layer {
                fn from(node: $node) -> Self {
                    Layer::$variant(node)
                }
            }

            impl From<$node> for Option<Layer> {
                fn from(node: $node) -> Self {
                    Some(Layer::$variant(node))
                }
            }
        )*
    };
}

impl_into_layer!(
    TextLayer => Text,
    ImageLayer => Image,
    MorphLayer => Morph,
    QuadraticLayer => Quadratic,
    BezierLayer => Bezier,
    LineLayer => Line,
    PolygonLayer => Polygon,
    PathLayer => Path,
    ClearLayer => Clear,
    Group => Group,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = MorphLayer::new(10.0, 10.0);
        let b = MorphLayer::new(10.0, 10.0);
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("layer-"));
    }

    #[test]
    fn test_builder_chain() {
        let layer = MorphLayer::new(100.0, "50%")
            .with_id("box")
            .with_z_index(3)
            .with_position("50%", 20.0)
            .with_fill("#00ff00")
            .with_radius(8.0)
            .try_with_opacity(0.5)
            .unwrap();
        assert_eq!(layer.id, "box");
        assert_eq!(layer.z_index, 3);
        assert_eq!(layer.props.base.opacity, 0.5);
        assert_eq!(layer.props.size.radius, Length::Number(8.0));
        assert_eq!(layer.props.base.fill_style, Some(FillStyle::color("#00ff00")));
    }

    #[test]
    fn test_eager_validation() {
        assert!(MorphLayer::new(1.0, 1.0).try_with_opacity(1.5).is_err());
        assert!(PolygonLayer::try_new(2, 10.0, 10.0).is_err());
        assert_eq!(PolygonLayer::try_new(6, 10.0, 10.0).unwrap().props.sides, 6);
        assert!(TextLayer::new("x").try_with_font_size(0.0).is_err());
        assert!(TextLayer::new("x").try_with_font_size(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_unbuilt_layers() {
        let mut polygon = PolygonLayer::try_new(4, 10.0, 10.0).unwrap();
        polygon.props.sides = 2;
        let mut text = TextLayer::new("x");
        text.props.font.size = -1.0;
        let mut morph = MorphLayer::new(1.0, 1.0);
        morph.props.base.opacity = 2.0;

        for layer in [Layer::from(polygon), Layer::from(text), Layer::from(morph.clone())] {
            assert!(layer.validate().unwrap_err().is_validation());
        }

        let nested = Group::new().with_layers(vec![Layer::from(morph)]).unwrap();
        assert!(Layer::from(nested).validate().is_err());
        assert!(Layer::from(MorphLayer::new(1.0, 1.0)).validate().is_ok());
    }

    #[test]
    fn test_leaf_count() {
        let inner = Group::new().with_layers(vec![Layer::from(MorphLayer::new(1.0, 1.0))]).unwrap();
        let outer = Group::new()
            .with_layers(vec![Layer::from(inner), Layer::from(Group::new()), Layer::from(LineLayer::new(PointProps::new(1.0, 1.0)))])
            .unwrap();
        assert_eq!(Layer::from(outer).leaf_count(), 2);
        assert_eq!(Layer::from(Group::new()).leaf_count(), 0);
    }

    #[test]
    fn test_capabilities() {
        assert!(LayerKind::Line.capabilities().contains(Capabilities::STROKE));
        assert!(!LayerKind::Line.capabilities().contains(Capabilities::PAINT));
        assert!(!LayerKind::Path.capabilities().contains(Capabilities::GEOMETRY));
        assert_eq!(LayerKind::Group.capabilities(), Capabilities::DRAWABLE);
    }

    #[test]
    fn test_layer_document_form() {
        let layer: Layer = LineLayer::new(PointProps::new(10.0, "vh"))
            .with_id("l")
            .with_position(1.0, 2.0)
            .into();
        let value = serde_json::to_value(&layer).unwrap();
        assert_eq!(value["type"], "line");
        assert_eq!(value["id"], "l");
        assert_eq!(value["zIndex"], 0);
        assert_eq!(value["visible"], true);
        assert_eq!(value["props"]["endPoint"]["y"], "vh");

        let back: Layer = serde_json::from_value(value).unwrap();
        assert_eq!(back, layer);
        assert_eq!(back.kind(), LayerKind::Line);
    }

    #[test]
    fn test_group_scale_recurses() {
        let mut layer: Layer = Group::new()
            .with_layers([MorphLayer::new(10.0, 10.0).with_id("m")])
            .unwrap()
            .into();
        layer.scale(3.0);
        let group = layer.as_group().unwrap();
        match group.layers.get("m") {
            Some(Layer::Morph(m)) => assert_eq!(m.props.size.width, Length::Number(30.0)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_curve_points() {
        let q = QuadraticLayer::new(PointProps::new(1.0, 2.0), PointProps::new(3.0, 4.0));
        assert_eq!(q.props.curve_points().len(), 3);
        let b = BezierLayer::new([PointProps::default(), PointProps::default()], PointProps::default());
        assert_eq!(b.props.curve_points().len(), 4);
    }
}
