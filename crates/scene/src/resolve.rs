//! Length and cross-layer reference resolution.
//!
//! [`Resolver`] turns symbolic lengths into numbers for one scene. Plain
//! lengths resolve through [`Length::resolve`]; references look their source
//! layer up in the registry (one level into groups) and read its position or
//! extent. A reference chain that comes back to a layer already being
//! resolved fails with [`SceneError::CyclicReference`].

use crate::bbox::bounding_box;
use crate::config::RenderConfig;
use crate::layer::{HasBoundingBox, HasDeclaredSize, HasMeasuredText, Layer};
use crate::registry::LayerRegistry;
use common::error::{SceneError, SceneResult};
use common::geometry::{Point, Size};
use common::units::{Axis, Length, LengthContext, LengthReference, ReferenceAttribute};
use indexmap::IndexMap;
use std::collections::HashSet;
use surface::DrawingSurface;

/// Layer ids on the current reference chain.
type Visiting = HashSet<String>;

/// Resolves lengths against one registry and viewport.
pub struct Resolver<'a> {
    registry: &'a LayerRegistry,
    viewport: Size,
    surface: &'a dyn DrawingSurface,
    config: &'a RenderConfig,
}

impl<'a> Resolver<'a> {
    /// `surface` answers text measurement queries.
    pub fn new(
        registry: &'a LayerRegistry,
        viewport: Size,
        surface: &'a dyn DrawingSurface,
        config: &'a RenderConfig,
    ) -> Self {
        Self { registry, viewport, surface, config }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn config(&self) -> &RenderConfig {
        self.config
    }

    pub fn resolve(&self, length: &Length, ctx: &LengthContext) -> SceneResult<f64> {
        self.resolve_with(length, ctx, &mut Visiting::new())
    }

    /// Resolve against the viewport along `axis`.
    pub fn resolve_along(&self, length: &Length, axis: Axis) -> SceneResult<f64> {
        self.resolve(length, &LengthContext::new(self.viewport, axis))
    }

    /// Resolve an `(x, y)` pair against the viewport.
    pub fn resolve_point(&self, x: &Length, y: &Length) -> SceneResult<Point> {
        Ok(Point::new(
            self.resolve_along(x, Axis::Horizontal)?,
            self.resolve_along(y, Axis::Vertical)?,
        ))
    }

    pub fn resolve_reference(&self, reference: &LengthReference) -> SceneResult<f64> {
        self.reference_with(reference, &mut Visiting::new())
    }

    /// Resolve every entry of `batch`, each as its own top-level resolution.
    pub fn resolve_batch(&self, batch: &LengthBatch<'_>) -> SceneResult<ResolvedBatch> {
        let mut values = IndexMap::with_capacity(batch.entries.len());
        for entry in &batch.entries {
            let ctx = LengthContext {
                viewport: self.viewport,
                local: entry.local,
                axis: entry.axis,
            };
            values.insert(entry.name.clone(), self.resolve(entry.length, &ctx)?);
        }
        Ok(ResolvedBatch { values })
    }

    /// Lines a text layer is drawn as, wrapped at its max width when multiline.
    pub fn text_lines<T: HasMeasuredText>(&self, text: &T) -> SceneResult<Vec<String>> {
        self.lines_with(text, &mut Visiting::new())
    }

    /// CSS font shorthand for a text layer.
    pub fn font_css<T: HasMeasuredText>(&self, text: &T) -> String {
        text.font().to_css(&self.config.default_font)
    }

    fn resolve_with(&self, length: &Length, ctx: &LengthContext, visiting: &mut Visiting) -> SceneResult<f64> {
        match length {
            Length::Reference(reference) => self.reference_with(reference, visiting),
            other => Ok(other.resolve(ctx)),
        }
    }

    fn reference_with(&self, reference: &LengthReference, visiting: &mut Visiting) -> SceneResult<f64> {
        let source = match self.registry.get_cross(&reference.source) {
            Some(Layer::Group(_)) | Some(Layer::Path(_)) => {
                tracing::trace!(source = %reference.source, "reference source has no scalar geometry");
                return Ok(0.0);
            }
            Some(layer) => layer,
            None => {
                tracing::trace!(source = %reference.source, "reference source not found");
                return Ok(0.0);
            }
        };

        if !visiting.insert(reference.source.clone()) {
            return Err(SceneError::cyclic(&reference.source));
        }
        let value = self.attribute_of(source, reference.attribute, visiting);
        visiting.remove(&reference.source);

        let offset_ctx = LengthContext::new(self.viewport, reference.attribute.axis());
        Ok(value? + self.resolve_with(&reference.offset, &offset_ctx, visiting)?)
    }

    fn attribute_of(&self, layer: &Layer, attribute: ReferenceAttribute, visiting: &mut Visiting) -> SceneResult<f64> {
        match attribute {
            ReferenceAttribute::X | ReferenceAttribute::Y => {
                let Some(base) = layer.base() else {
                    return Ok(0.0);
                };
                let length = if attribute == ReferenceAttribute::X { &base.x } else { &base.y };
                let ctx = LengthContext::new(self.viewport, attribute.axis());
                self.resolve_with(length, &ctx, visiting)
            }
            ReferenceAttribute::Width | ReferenceAttribute::Height => match layer {
                Layer::Text(node) => self.text_extent(&node.props, attribute, visiting),
                Layer::Image(node) => self.declared_extent(&node.props, attribute, visiting),
                Layer::Morph(node) => self.declared_extent(&node.props, attribute, visiting),
                Layer::Polygon(node) => self.declared_extent(&node.props, attribute, visiting),
                Layer::Clear(node) => self.declared_extent(&node.props, attribute, visiting),
                Layer::Line(node) => self.curve_extent(&node.props, attribute, visiting),
                Layer::Quadratic(node) => self.curve_extent(&node.props, attribute, visiting),
                Layer::Bezier(node) => self.curve_extent(&node.props, attribute, visiting),
                Layer::Path(_) | Layer::Group(_) => Ok(0.0),
            },
        }
    }

    fn declared_extent<T: HasDeclaredSize>(
        &self,
        props: &T,
        attribute: ReferenceAttribute,
        visiting: &mut Visiting,
    ) -> SceneResult<f64> {
        let size = props.declared_size();
        let length = if attribute == ReferenceAttribute::Width { &size.width } else { &size.height };
        let ctx = LengthContext::new(self.viewport, attribute.axis());
        self.resolve_with(length, &ctx, visiting)
    }

    fn curve_extent<T: HasBoundingBox>(
        &self,
        props: &T,
        attribute: ReferenceAttribute,
        visiting: &mut Visiting,
    ) -> SceneResult<f64> {
        let horizontal = LengthContext::horizontal(self.viewport);
        let vertical = LengthContext::vertical(self.viewport);
        let mut points = Vec::with_capacity(4);
        for (x, y) in props.curve_points() {
            points.push(Point::new(
                self.resolve_with(x, &horizontal, visiting)?,
                self.resolve_with(y, &vertical, visiting)?,
            ));
        }
        let bbox = bounding_box(&points, self.config.sample_density)?;
        Ok(if attribute == ReferenceAttribute::Width { bbox.width } else { bbox.height })
    }

    fn text_extent<T: HasMeasuredText>(
        &self,
        text: &T,
        attribute: ReferenceAttribute,
        visiting: &mut Visiting,
    ) -> SceneResult<f64> {
        let font = self.font_css(text);
        let lines = self.lines_with(text, visiting)?;
        if attribute == ReferenceAttribute::Width {
            return Ok(lines
                .iter()
                .map(|line| self.surface.measure_text(line, &font).width)
                .fold(0.0, f64::max));
        }
        let metrics = self.surface.measure_text(text.text(), &font);
        let line_height = text.font().size * text.multiline().spacing;
        Ok(metrics.height() + line_height * lines.len().saturating_sub(1) as f64)
    }

    fn lines_with<T: HasMeasuredText>(&self, text: &T, visiting: &mut Visiting) -> SceneResult<Vec<String>> {
        if !text.multiline().enabled {
            return Ok(vec![text.text().to_string()]);
        }
        let max_width = match text.max_width() {
            Some(width) => Some(self.resolve_with(width, &LengthContext::horizontal(self.viewport), visiting)?),
            None => None,
        };
        let font = self.font_css(text);

        let mut lines = Vec::new();
        for paragraph in text.text().split('\n') {
            let Some(limit) = max_width else {
                lines.push(paragraph.to_string());
                continue;
            };
            let mut current = String::new();
            for word in paragraph.split_whitespace() {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{} {}", current, word)
                };
                if !current.is_empty() && self.surface.measure_text(&candidate, &font).width > limit {
                    lines.push(std::mem::replace(&mut current, word.to_string()));
                } else {
                    current = candidate;
                }
            }
            lines.push(current);
        }
        Ok(lines)
    }
}

struct BatchEntry<'l> {
    name: String,
    length: &'l Length,
    axis: Axis,
    local: Option<Size>,
}

/// Named lengths resolved together before drawing.
#[derive(Default)]
pub struct LengthBatch<'l> {
    entries: Vec<BatchEntry<'l>>,
}

impl<'l> LengthBatch<'l> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry measured against the viewport.
    pub fn add(mut self, name: &str, length: &'l Length, axis: Axis) -> Self {
        self.entries.push(BatchEntry { name: name.to_string(), length, axis, local: None });
        self
    }

    /// Add an entry whose percentages and keywords use `local`.
    pub fn add_local(mut self, name: &str, length: &'l Length, axis: Axis, local: Size) -> Self {
        self.entries.push(BatchEntry { name: name.to_string(), length, axis, local: Some(local) });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Values of a resolved [`LengthBatch`], in entry order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedBatch {
    values: IndexMap<String, f64>,
}

impl ResolvedBatch {
    /// Value for `name`; 0 for names not in the batch.
    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn into_inner(self) -> IndexMap<String, f64> {
        self.values
    }
}
