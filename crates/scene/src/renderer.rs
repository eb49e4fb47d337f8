//! Render orchestration and export.

use crate::animation::AnimationEncoder;
use crate::config::RenderConfig;
use crate::draw::Painter;
use crate::hooks::HookRegistry;
use crate::scene::{ExportType, Scene};
use common::error::{SceneError, SceneResult};
use surface::{Canvas2D, DrawingSurface, ImageLoader, RasterFormat};

/// Result of exporting a scene.
#[derive(Debug)]
pub enum Export<S> {
    /// The surface the scene was drawn on.
    Surface(S),
    /// Raw RGBA bytes.
    Buffer(Vec<u8>),
    Png(Vec<u8>),
    Jpeg(Vec<u8>),
    Svg(String),
    Gif(Vec<u8>),
}

impl<S> Export<S> {
    /// Encoded bytes, for every export but a surface.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Export::Surface(_) => None,
            Export::Buffer(bytes) | Export::Png(bytes) | Export::Jpeg(bytes) | Export::Gif(bytes) => Some(bytes),
            Export::Svg(document) => Some(document.into_bytes()),
        }
    }
}

/// Statistics of the last render pass.
#[derive(Clone, Debug, Default)]
pub struct RenderStats {
    /// Top-level layers drawn.
    pub layers_drawn: u32,
    /// Top-level layers skipped as hidden.
    pub layers_skipped: u32,
    /// Animation frames written.
    pub frames: u32,
    /// Pass time in milliseconds.
    pub render_time_ms: f32,
}

/// Draws scenes onto drawing surfaces.
#[derive(Debug)]
pub struct Renderer {
    config: RenderConfig,
    images: ImageLoader,
    hooks: HookRegistry,
    stats: RenderStats,
}

impl Renderer {
    pub fn new() -> Self {
        Self::with_config(RenderConfig::default())
    }

    pub fn with_config(config: RenderConfig) -> Self {
        let images = ImageLoader::new().with_max_dimensions(config.max_image_width, config.max_image_height);
        Self {
            config,
            images,
            hooks: HookRegistry::new(),
            stats: RenderStats::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    /// Decoded image cache shared by every pass of this renderer.
    pub fn images(&self) -> &ImageLoader {
        &self.images
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Draw every visible layer of `scene` in z-order.
    pub fn render<S: DrawingSurface>(&mut self, scene: &Scene, surface: &mut S) -> SceneResult<()> {
        self.pass(scene, surface, None)
    }

    /// Draw an animated scene, one GIF frame per top-level layer.
    pub fn render_animation<S: DrawingSurface>(&mut self, scene: &Scene, surface: &mut S) -> SceneResult<Vec<u8>> {
        let mut encoder = AnimationEncoder::new(
            surface.width(),
            surface.height(),
            &scene.animation,
            &self.config,
        )?;
        self.pass(scene, surface, Some(&mut encoder))?;
        encoder.finish()
    }

    fn pass<S: DrawingSurface>(
        &mut self,
        scene: &Scene,
        surface: &mut S,
        mut encoder: Option<&mut AnimationEncoder>,
    ) -> SceneResult<()> {
        let start = std::time::Instant::now();
        self.stats = RenderStats::default();
        if surface.width() != scene.width() || surface.height() != scene.height() {
            tracing::debug!(
                surface_width = surface.width(),
                surface_height = surface.height(),
                scene_width = scene.width(),
                scene_height = scene.height(),
                "surface and scene sizes differ"
            );
        }
        tracing::debug!(layers = scene.layers().len(), animated = encoder.is_some(), "render pass started");

        self.hooks.before_render(scene)?;

        let painter = Painter::new(scene, &self.config, &self.images);
        for layer in scene.layers().iter() {
            if !layer.visible() {
                self.stats.layers_skipped += 1;
                continue;
            }
            painter.draw(layer, surface)?;
            self.stats.layers_drawn += 1;
            self.hooks.after_layer(layer, &*surface)?;

            if let Some(encoder) = encoder.as_deref_mut() {
                encoder.push_frame(surface.snapshot())?;
                self.stats.frames += 1;
                if scene.animation.utils.clear {
                    surface.clear();
                }
            }
        }

        self.hooks.after_render(scene, &*surface)?;

        self.stats.render_time_ms = start.elapsed().as_secs_f32() * 1000.0;
        tracing::debug!(
            drawn = self.stats.layers_drawn,
            skipped = self.stats.layers_skipped,
            frames = self.stats.frames,
            time_ms = self.stats.render_time_ms,
            "render pass finished"
        );
        Ok(())
    }

    /// Render `scene` onto `surface` and export it as the scene's export type.
    pub fn export<S: DrawingSurface>(&mut self, scene: &Scene, mut surface: S) -> SceneResult<Export<S>> {
        let export_type = scene.options.export_type;
        match (scene.options.animated, export_type) {
            (true, ExportType::Gif) => {}
            (true, other) => {
                return Err(SceneError::unsupported(format!(
                    "animated scenes export as gif, not {:?}",
                    other
                )))
            }
            (false, ExportType::Gif) => {
                return Err(SceneError::unsupported("gif export needs an animated scene"));
            }
            (false, _) => {}
        }

        if export_type == ExportType::Gif {
            let bytes = self.render_animation(scene, &mut surface)?;
            tracing::debug!(bytes = bytes.len(), "scene exported as gif");
            return Ok(Export::Gif(bytes));
        }

        self.render(scene, &mut surface)?;
        let export = match export_type {
            ExportType::Surface => Export::Surface(surface),
            ExportType::Buffer => Export::Buffer(surface.encode_raster(RasterFormat::Rgba)?),
            ExportType::Png => Export::Png(surface.encode_raster(RasterFormat::Png)?),
            ExportType::Jpeg => Export::Jpeg(surface.encode_raster(RasterFormat::Jpeg)?),
            ExportType::Svg => Export::Svg(surface.encode_vector(scene.options.flag)?),
            ExportType::Gif => return Err(SceneError::unsupported("gif export needs an animated scene")),
        };
        tracing::debug!(export = ?export_type, "scene exported");
        Ok(export)
    }

    /// Export onto a fresh [`Canvas2D`] of the scene's size.
    pub fn export_canvas(&mut self, scene: &Scene) -> SceneResult<Export<Canvas2D>> {
        self.export(scene, Canvas2D::new(scene.width(), scene.height()))
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::Anchor;
    use crate::animation::AnimationOptions;
    use crate::hooks::RenderHook;
    use crate::layer::{ClearLayer, ImageLayer, Layer, LineLayer, MorphLayer, TextLayer};
    use crate::props::{PointProps, TransformOps};
    use crate::style::{Gradient, GradientPoint, ImageSource, Pattern, PatternSource};
    use common::color::Color;
    use common::geometry::Point;
    use common::units::{Length, ReferenceAttribute};
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;
    use surface::canvas::VectorItem;
    use surface::{RasterImage, Repetition};

    const RED: &str = "#ff0000";

    fn draw(scene: &Scene) -> Canvas2D {
        let mut canvas = Canvas2D::new(scene.width(), scene.height());
        Renderer::new().render(scene, &mut canvas).unwrap();
        canvas
    }

    fn scene_with<I: IntoIterator<Item = Layer>>(width: u32, height: u32, layers: I) -> Scene {
        Scene::new(width, height).try_with_layers(layers).unwrap()
    }

    #[test]
    fn test_morph_centered_on_position() {
        let scene = scene_with(100, 100, [MorphLayer::new(20.0, 20.0).with_position(50.0, 50.0).with_fill(RED).into()]);
        let canvas = draw(&scene);
        assert_eq!(canvas.pixel(40, 40), Color::RED);
        assert_eq!(canvas.pixel(59, 59), Color::RED);
        assert_eq!(canvas.pixel(39, 39), Color::TRANSPARENT);
        assert_eq!(canvas.pixel(60, 60), Color::TRANSPARENT);
        assert_eq!(canvas.save_depth(), 0);
    }

    #[test]
    fn test_start_top_anchor() {
        let morph = MorphLayer::new(20.0, 20.0)
            .with_position(10.0, 10.0)
            .with_centring(Anchor::StartTop)
            .with_fill(RED);
        let canvas = draw(&scene_with(50, 50, [morph.into()]));
        assert_eq!(canvas.pixel(10, 10), Color::RED);
        assert_eq!(canvas.pixel(29, 29), Color::RED);
        assert_eq!(canvas.pixel(9, 9), Color::TRANSPARENT);
    }

    #[test]
    fn test_default_fill_is_black() {
        let canvas = draw(&scene_with(20, 20, [MorphLayer::new(10.0, 10.0).with_position(10.0, 10.0).into()]));
        assert_eq!(canvas.pixel(10, 10), Color::BLACK);
    }

    #[test]
    fn test_hidden_layer_not_drawn() {
        let morph = MorphLayer::new(20.0, 20.0).with_position(10.0, 10.0).with_fill(RED).with_visible(false);
        let scene = scene_with(20, 20, [morph.into()]);
        let mut canvas = Canvas2D::new(20, 20);
        let mut renderer = Renderer::new();
        renderer.render(&scene, &mut canvas).unwrap();
        assert_eq!(canvas.pixel(10, 10), Color::TRANSPARENT);
        assert!(canvas.vector_items().is_empty());
        assert_eq!(renderer.stats().layers_skipped, 1);
        assert_eq!(renderer.stats().layers_drawn, 0);
    }

    #[test]
    fn test_clear_layer_erases() {
        let scene = scene_with(
            100,
            100,
            [
                MorphLayer::new("100%", "100%").with_id("bg").with_position(50.0, 50.0).with_fill(RED).into(),
                ClearLayer::new(20.0, 20.0).with_id("hole").with_position(50.0, 50.0).with_z_index(1).into(),
            ],
        );
        let canvas = draw(&scene);
        assert_eq!(canvas.pixel(50, 50), Color::TRANSPARENT);
        assert_eq!(canvas.pixel(5, 5), Color::RED);
    }

    #[test]
    fn test_line_strokes_by_default() {
        let line = LineLayer::new(PointProps::new(90.0, 10.5)).with_position(10.0, 10.5);
        let canvas = draw(&scene_with(100, 20, [line.into()]));
        let items = canvas.vector_items();
        assert_eq!(items.len(), 1);
        assert!(matches!(
            &items[0],
            VectorItem::Stroke { color, width, .. } if *color == Color::BLACK && *width == 1.0
        ));
        assert_eq!(canvas.pixel(50, 10).a, 255);
        assert_eq!(canvas.pixel(50, 15), Color::TRANSPARENT);
    }

    #[test]
    fn test_text_lines_logged() {
        let text = TextLayer::new("aa bb cc")
            .with_position(10.0, 20.0)
            .try_with_font_size(10.0)
            .unwrap()
            .with_max_width(40.0)
            .with_multiline(2.0);
        let canvas = draw(&scene_with(100, 100, [text.into()]));
        let runs: Vec<(String, Point)> = canvas
            .vector_items()
            .iter()
            .filter_map(|item| match item {
                VectorItem::Text { text, position, .. } => Some((text.clone(), *position)),
                _ => None,
            })
            .collect();
        assert_eq!(
            runs,
            vec![
                ("aa bb".to_string(), Point::new(10.0, 20.0)),
                ("cc".to_string(), Point::new(10.0, 40.0)),
            ]
        );
    }

    #[test]
    fn test_opacity_scales_alpha() {
        let morph = MorphLayer::new(10.0, 10.0)
            .with_position(5.0, 5.0)
            .with_fill(RED)
            .try_with_opacity(0.5)
            .unwrap();
        let canvas = draw(&scene_with(10, 10, [morph.into()]));
        let alpha = canvas.pixel(5, 5).a as i32;
        assert!((alpha - 128).abs() <= 1, "alpha {}", alpha);
    }

    #[test]
    fn test_linear_gradient_across_box() {
        let gradient = Gradient::linear(GradientPoint::new(0.0, 0.0), GradientPoint::new("100%", 0.0))
            .add_stop(0.0, "#000000")
            .add_stop(1.0, "#ffffff");
        let morph = MorphLayer::new(100.0, 10.0)
            .with_position(0.0, 0.0)
            .with_centring(Anchor::StartTop)
            .with_fill(gradient);
        let canvas = draw(&scene_with(100, 10, [morph.into()]));
        assert!(canvas.pixel(0, 5).r < 10);
        assert!(canvas.pixel(99, 5).r > 245);
        let mid = canvas.pixel(50, 5).r as i32;
        assert!((mid - 128).abs() <= 3, "mid {}", mid);
    }

    fn pattern_scene() -> Scene {
        scene_with(
            8,
            8,
            [MorphLayer::new(8.0, 8.0).with_position(0.0, 0.0).with_centring(Anchor::StartTop).with_fill("#0000ff").into()],
        )
    }

    fn pattern_filled() -> Scene {
        let morph = MorphLayer::new(20.0, 20.0)
            .with_position(0.0, 0.0)
            .with_centring(Anchor::StartTop)
            .with_fill(Pattern::new(PatternSource::Scene(Box::new(pattern_scene())), Repetition::Repeat));
        scene_with(20, 20, [morph.into()])
    }

    #[test]
    fn test_pattern_scene_fill() {
        let canvas = draw(&pattern_filled());
        assert_eq!(canvas.pixel(10, 10), Color::BLUE);
        assert_eq!(canvas.pixel(19, 3), Color::BLUE);
    }

    #[test]
    fn test_pattern_depth_limit() {
        let mut renderer = Renderer::with_config(RenderConfig::default().with_max_pattern_depth(0));
        let mut canvas = Canvas2D::new(20, 20);
        let err = renderer.render(&pattern_filled(), &mut canvas).unwrap_err();
        assert!(matches!(err, SceneError::Render(_)));
    }

    #[test]
    fn test_translate_transform() {
        let morph = MorphLayer::new(20.0, 10.0)
            .with_position(0.0, 0.0)
            .with_centring(Anchor::StartTop)
            .with_fill(RED)
            .with_transform(TransformOps::translate(30.0, 0.0));
        let canvas = draw(&scene_with(60, 10, [morph.into()]));
        assert_eq!(canvas.pixel(35, 5), Color::RED);
        assert_eq!(canvas.pixel(5, 5), Color::TRANSPARENT);
    }

    #[test]
    fn test_rotation_about_anchor() {
        let morph = MorphLayer::new(40.0, 10.0)
            .with_position(50.0, 50.0)
            .with_fill(RED)
            .with_transform(TransformOps::rotate(90.0));
        let canvas = draw(&scene_with(100, 100, [morph.into()]));
        assert_eq!(canvas.pixel(50, 35), Color::RED);
        assert_eq!(canvas.pixel(50, 64), Color::RED);
        assert_eq!(canvas.pixel(35, 50), Color::TRANSPARENT);
    }

    #[test]
    fn test_reference_layout() {
        let a = MorphLayer::new(30.0, 10.0)
            .with_id("a")
            .with_position(0.0, 0.0)
            .with_centring(Anchor::StartTop)
            .with_fill(RED);
        let b = MorphLayer::new(10.0, 10.0)
            .with_id("b")
            .with_position(Length::reference("a", ReferenceAttribute::Width, 5.0), 0.0)
            .with_centring(Anchor::StartTop)
            .with_fill("#0000ff");
        let canvas = draw(&scene_with(60, 10, [a.into(), b.into()]));
        assert_eq!(canvas.pixel(29, 5), Color::RED);
        assert_eq!(canvas.pixel(32, 5), Color::TRANSPARENT);
        assert_eq!(canvas.pixel(37, 5), Color::BLUE);
    }

    #[test]
    fn test_inline_image() {
        let mut image = RasterImage::new(2, 2);
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            image.set_pixel(x, y, Color::RED);
        }
        let png = surface::bitmap::encode_png(&image).unwrap();
        let layer = ImageLayer::new(ImageSource::Inline(png), 20.0, 20.0)
            .with_position(0.0, 0.0)
            .with_centring(Anchor::StartTop);
        let canvas = draw(&scene_with(30, 30, [layer.into()]));
        assert_eq!(canvas.pixel(10, 10), Color::RED);
        assert_eq!(canvas.pixel(25, 25), Color::TRANSPARENT);
    }

    #[test]
    fn test_missing_image_aborts_pass() {
        let layer = ImageLayer::new(ImageSource::path("/nonexistent/image.png"), 10.0, 10.0);
        let mut canvas = Canvas2D::new(10, 10);
        assert!(Renderer::new().render(&scene_with(10, 10, [layer.into()]), &mut canvas).is_err());
    }

    fn animated(clear: bool) -> Scene {
        let layers = [(0.0, "#ff0000"), (20.0, "#0000ff"), (40.0, "#ffffff")]
            .into_iter()
            .enumerate()
            .map(|(i, (x, color))| {
                Layer::from(
                    MorphLayer::new(10.0, 10.0)
                        .with_position(x, 0.0)
                        .with_centring(Anchor::StartTop)
                        .with_fill(color)
                        .with_z_index(i as i32),
                )
            });
        scene_with(60, 10, layers).with_animation(AnimationOptions::default().with_clear(clear).with_buffer_size(2))
    }

    fn decode_frames(bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(Cursor::new(bytes)).unwrap();
        let mut frames = Vec::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            frames.push(frame.buffer.to_vec());
        }
        frames
    }

    fn alpha_at(frame: &[u8], x: usize, y: usize) -> u8 {
        frame[(y * 60 + x) * 4 + 3]
    }

    #[test]
    fn test_animation_frame_per_layer() {
        let bytes = match Renderer::new().export_canvas(&animated(false)).unwrap() {
            Export::Gif(bytes) => bytes,
            other => panic!("unexpected {:?}", other),
        };
        let frames = decode_frames(&bytes);
        assert_eq!(frames.len(), 3);
        assert_eq!(alpha_at(&frames[2], 5, 5), 255);
        assert_eq!(alpha_at(&frames[2], 45, 5), 255);
    }

    #[test]
    fn test_animation_buffer_evicts_oldest() {
        let mut renderer = Renderer::new();
        let mut canvas = Canvas2D::new(60, 10);
        let bytes = renderer.render_animation(&animated(true), &mut canvas).unwrap();
        assert_eq!(renderer.stats().frames, 3);

        let frames = decode_frames(&bytes);
        assert_eq!(frames.len(), 3);
        assert_eq!(alpha_at(&frames[1], 5, 5), 255);
        assert_eq!(alpha_at(&frames[2], 5, 5), 0);
        assert_eq!(alpha_at(&frames[2], 25, 5), 255);
        assert_eq!(alpha_at(&frames[2], 45, 5), 255);
    }

    #[test]
    fn test_export_kinds() {
        let base = scene_with(10, 10, [MorphLayer::new(4.0, 4.0).with_position(5.0, 5.0).with_fill(RED).into()]);
        let mut renderer = Renderer::new();

        match renderer.export_canvas(&base.clone().with_export(ExportType::Png)).unwrap() {
            Export::Png(bytes) => assert_eq!(&bytes[..4], b"\x89PNG"),
            other => panic!("unexpected {:?}", other),
        }
        match renderer.export_canvas(&base.clone().with_export(ExportType::Buffer)).unwrap() {
            Export::Buffer(bytes) => assert_eq!(bytes.len(), 10 * 10 * 4),
            other => panic!("unexpected {:?}", other),
        }
        match renderer.export_canvas(&base.clone().with_export(ExportType::Svg)).unwrap() {
            Export::Svg(document) => assert!(document.contains("<svg")),
            other => panic!("unexpected {:?}", other),
        }
        match renderer.export_canvas(&base.clone().with_export(ExportType::Surface)).unwrap() {
            Export::Surface(canvas) => assert_eq!(canvas.pixel(5, 5), Color::RED),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_export_rules() {
        let base = scene_with(10, 10, [MorphLayer::new(4.0, 4.0).into()]);
        let mut renderer = Renderer::new();

        let err = renderer.export_canvas(&base.clone().with_export(ExportType::Gif)).unwrap_err();
        assert!(matches!(err, SceneError::UnsupportedExport(_)));

        let animated_png = base.with_animation(AnimationOptions::default()).with_export(ExportType::Png);
        let err = renderer.export_canvas(&animated_png).unwrap_err();
        assert!(matches!(err, SceneError::UnsupportedExport(_)));
    }

    struct Recorder {
        events: Rc<RefCell<Vec<String>>>,
        fail_before: bool,
    }

    impl RenderHook for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn before_render(&mut self, _scene: &Scene) -> SceneResult<()> {
            if self.fail_before {
                return Err(SceneError::render("refused"));
            }
            self.events.borrow_mut().push("before".to_string());
            Ok(())
        }

        fn after_layer(&mut self, layer: &Layer, _surface: &dyn DrawingSurface) -> SceneResult<()> {
            self.events.borrow_mut().push(format!("layer:{}", layer.id()));
            Ok(())
        }

        fn after_render(&mut self, _scene: &Scene, _surface: &dyn DrawingSurface) -> SceneResult<()> {
            self.events.borrow_mut().push("after".to_string());
            Ok(())
        }
    }

    #[test]
    fn test_hooks_notified_in_order() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let hooks = HookRegistry::new().with_hook(Box::new(Recorder { events: events.clone(), fail_before: false }));
        let scene = scene_with(
            10,
            10,
            [
                MorphLayer::new(2.0, 2.0).with_id("a").into(),
                MorphLayer::new(2.0, 2.0).with_id("b").with_z_index(1).into(),
            ],
        );
        let mut canvas = Canvas2D::new(10, 10);
        Renderer::new().with_hooks(hooks).render(&scene, &mut canvas).unwrap();
        assert_eq!(*events.borrow(), vec!["before", "layer:a", "layer:b", "after"]);
    }

    #[test]
    fn test_hook_error_aborts_pass() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let hooks = HookRegistry::new().with_hook(Box::new(Recorder { events: events.clone(), fail_before: true }));
        let scene = scene_with(10, 10, [MorphLayer::new(10.0, 10.0).with_position(5.0, 5.0).into()]);
        let mut canvas = Canvas2D::new(10, 10);
        assert!(Renderer::new().with_hooks(hooks).render(&scene, &mut canvas).is_err());
        assert_eq!(canvas.pixel(5, 5), Color::TRANSPARENT);
        assert!(events.borrow().is_empty());
    }
}
