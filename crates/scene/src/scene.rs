//! The scene: viewport, output settings and the top-level layers.

use crate::animation::AnimationOptions;
use crate::codec::{self, Document};
use crate::layer::Layer;
use crate::registry::LayerRegistry;
use common::error::{SceneError, SceneResult};
use common::geometry::Size;
use serde::{Deserialize, Serialize};
use surface::VectorFlag;

/// Output a scene is exported as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    /// Raw RGBA bytes.
    Buffer,
    Png,
    Jpeg,
    Svg,
    /// Animated GIF; animated scenes only.
    Gif,
    /// The drawing surface itself.
    Surface,
}

/// Viewport and export settings.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneOptions {
    pub width: u32,
    pub height: u32,
    pub animated: bool,
    pub export_type: ExportType,
    pub flag: VectorFlag,
}

impl SceneOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            animated: false,
            export_type: ExportType::Png,
            flag: VectorFlag::None,
        }
    }

    pub fn viewport(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

/// A renderable scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Document", into = "Document")]
pub struct Scene {
    pub options: SceneOptions,
    pub animation: AnimationOptions,
    layers: LayerRegistry,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_parts(SceneOptions::new(width, height), AnimationOptions::default(), LayerRegistry::new())
    }

    pub(crate) fn from_parts(options: SceneOptions, animation: AnimationOptions, layers: LayerRegistry) -> Self {
        Self { options, animation, layers }
    }

    pub fn with_export(mut self, export_type: ExportType) -> Self {
        self.options.export_type = export_type;
        self
    }

    pub fn with_flag(mut self, flag: VectorFlag) -> Self {
        self.options.flag = flag;
        self
    }

    /// Make the scene animated with `animation`, exported as GIF.
    pub fn with_animation(mut self, animation: AnimationOptions) -> Self {
        self.options.animated = true;
        self.options.export_type = ExportType::Gif;
        self.animation = animation;
        self
    }

    /// Add top-level layers; fails on a duplicate id.
    pub fn try_with_layers<I, L>(mut self, layers: I) -> SceneResult<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Option<Layer>>,
    {
        self.layers.add(layers)?;
        Ok(self)
    }

    pub fn add<I, L>(&mut self, layers: I) -> SceneResult<()>
    where
        I: IntoIterator<Item = L>,
        L: Into<Option<Layer>>,
    {
        self.layers.add(layers)
    }

    pub fn remove<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.layers.remove(ids)
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    /// Mutable access to the layers; call [`LayerRegistry::sort`] after
    /// changing a z-index.
    pub fn layers_mut(&mut self) -> &mut LayerRegistry {
        &mut self.layers
    }

    pub fn width(&self) -> u32 {
        self.options.width
    }

    pub fn height(&self) -> u32 {
        self.options.height
    }

    pub fn viewport(&self) -> Size {
        self.options.viewport()
    }

    /// Scale the viewport and every absolute length by `ratio`.
    pub fn resize(&mut self, ratio: f64) -> SceneResult<()> {
        if !(ratio.is_finite() && ratio > 0.0) {
            return Err(SceneError::validation(format!("resize ratio {} must be positive", ratio)));
        }
        let width = (self.options.width as f64 * ratio).round();
        let height = (self.options.height as f64 * ratio).round();
        if width < 1.0 || height < 1.0 || width > u32::MAX as f64 || height > u32::MAX as f64 {
            return Err(SceneError::validation(format!("resized viewport {}x{} is out of range", width, height)));
        }
        self.options.width = width as u32;
        self.options.height = height as u32;

        let mut layers = std::mem::take(&mut self.layers).into_vec();
        for layer in &mut layers {
            layer.scale(ratio);
        }
        self.layers = LayerRegistry::from_vec(layers)?;
        tracing::debug!(ratio, width = self.options.width, height = self.options.height, "scene resized");
        Ok(())
    }

    pub fn to_json(&self, pretty: bool) -> SceneResult<String> {
        codec::to_json_string(self, pretty)
    }

    pub fn from_json(json: &str) -> SceneResult<Self> {
        codec::from_json_str(json)
    }
}

impl TryFrom<Document> for Scene {
    type Error = SceneError;

    fn try_from(document: Document) -> SceneResult<Self> {
        codec::decode(document)
    }
}

impl From<Scene> for Document {
    fn from(scene: Scene) -> Self {
        codec::encode(&scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LineLayer, MorphLayer, TextLayer};
    use crate::props::PointProps;
    use common::units::Length;

    #[test]
    fn test_new_scene() {
        let scene = Scene::new(800, 600);
        assert_eq!(scene.viewport(), Size::new(800.0, 600.0));
        assert_eq!(scene.options.export_type, ExportType::Png);
        assert!(!scene.options.animated);
        assert!(scene.layers().is_empty());
    }

    #[test]
    fn test_with_animation() {
        let scene = Scene::new(10, 10).with_animation(AnimationOptions::default().with_frame_rate(5));
        assert!(scene.options.animated);
        assert_eq!(scene.options.export_type, ExportType::Gif);
        assert_eq!(scene.animation.frame_rate, 5);
    }

    #[test]
    fn test_add_remove() {
        let mut scene = Scene::new(100, 100)
            .try_with_layers([MorphLayer::new(1.0, 1.0).with_id("a").with_z_index(2)])
            .unwrap();
        scene.add([MorphLayer::new(1.0, 1.0).with_id("b")]).unwrap();
        assert!(scene.add([MorphLayer::new(1.0, 1.0).with_id("a")]).is_err());
        assert_eq!(scene.layers().ids().collect::<Vec<_>>(), vec!["b", "a"]);
        scene.remove(["b"]);
        assert!(scene.get("b").is_none());
        assert!(scene.get("a").is_some());
    }

    #[test]
    fn test_resize() {
        let mut scene = Scene::new(100, 50)
            .try_with_layers(vec![
                Layer::from(MorphLayer::new(10.0, "50%").with_id("m").with_position("5px", 4.0)),
                Layer::from(LineLayer::new(PointProps::new(20.0, "vh")).with_id("l")),
                Layer::from(TextLayer::new("hi").with_id("t")),
            ])
            .unwrap();
        scene.resize(2.0).unwrap();

        assert_eq!((scene.width(), scene.height()), (200, 100));
        match scene.get("m") {
            Some(Layer::Morph(m)) => {
                assert_eq!(m.props.size.width, Length::Number(20.0));
                assert_eq!(m.props.size.height, Length::percent(50.0));
                assert_eq!(m.props.base.x, Length::px(10.0));
                assert_eq!(m.props.base.y, Length::Number(8.0));
            }
            other => panic!("unexpected {:?}", other),
        }
        match scene.get("l") {
            Some(Layer::Line(l)) => assert_eq!(l.props.end.x, Length::Number(40.0)),
            other => panic!("unexpected {:?}", other),
        }
        match scene.get("t") {
            Some(Layer::Text(t)) => assert_eq!(t.props.font.size, 32.0),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(scene.layers().len(), 3);
    }

    #[test]
    fn test_resize_rejects_bad_ratio() {
        let mut scene = Scene::new(10, 10);
        assert!(scene.resize(0.0).is_err());
        assert!(scene.resize(f64::NAN).is_err());
        assert!(scene.resize(0.01).is_err());
    }
}
