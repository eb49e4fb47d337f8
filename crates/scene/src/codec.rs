//! Document encoding of scenes.
//!
//! A document is `{ options, animation, layers }` with camelCase fields.
//! Groups appear as `{ "type": "group", "layers": [...] }`; a bare nested
//! array in a layer list is also accepted and becomes a group with a
//! generated id.

use crate::animation::AnimationOptions;
use crate::layer::{Group, Layer};
use crate::registry::LayerRegistry;
use crate::scene::{ExportType, Scene, SceneOptions};
use common::error::{SceneError, SceneResult};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use surface::VectorFlag;

/// Document form of [`SceneOptions`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOptions {
    pub width: i64,
    pub height: i64,
    #[serde(default)]
    pub animated: bool,
    pub export_type: Option<ExportType>,
    pub flag: Option<VectorFlag>,
}

/// One entry of a document layer list.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LayerEntry {
    Layer(Layer),
    /// Bare array of entries.
    Nested(Vec<LayerEntry>),
}

impl LayerEntry {
    /// Build the layer; a nested array becomes an anonymous group.
    pub fn into_layer(self) -> SceneResult<Layer> {
        match self {
            LayerEntry::Layer(layer) => Ok(layer),
            LayerEntry::Nested(entries) => {
                let children = entries
                    .into_iter()
                    .map(LayerEntry::into_layer)
                    .collect::<SceneResult<Vec<_>>>()?;
                let group = Group {
                    layers: LayerRegistry::from_vec(children)?,
                    ..Group::new()
                };
                tracing::trace!(id = %group.id, "anonymous group from nested array");
                Ok(Layer::Group(group))
            }
        }
    }
}

impl<'de> Deserialize<'de> for LayerEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<LayerEntry>, _>>()
                .map(LayerEntry::Nested)
                .map_err(de::Error::custom),
            value => serde_json::from_value::<Layer>(value)
                .map(LayerEntry::Layer)
                .map_err(de::Error::custom),
        }
    }
}

/// Serialized scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub options: DocumentOptions,
    #[serde(default)]
    pub animation: AnimationOptions,
    pub layers: Vec<LayerEntry>,
}

pub fn encode(scene: &Scene) -> Document {
    let options = &scene.options;
    Document {
        options: DocumentOptions {
            width: options.width as i64,
            height: options.height as i64,
            animated: options.animated,
            export_type: Some(options.export_type),
            flag: Some(options.flag),
        },
        animation: scene.animation.clone(),
        layers: scene.layers().iter().cloned().map(LayerEntry::Layer).collect(),
    }
}

/// Check document options and that there is something to draw.
pub fn validate(document: &Document) -> SceneResult<()> {
    let options = &document.options;
    for (name, value) in [("width", options.width), ("height", options.height)] {
        if value <= 0 || value > u32::MAX as i64 {
            return Err(SceneError::validation(format!("{} must be a positive integer, got {}", name, value)));
        }
    }
    if options.export_type.is_none() {
        return Err(SceneError::validation("missing export type"));
    }
    if options.flag.is_none() {
        return Err(SceneError::validation("missing export flag"));
    }
    if document.layers.is_empty() {
        return Err(SceneError::validation("document has no layers"));
    }
    Ok(())
}

pub fn decode(document: Document) -> SceneResult<Scene> {
    validate(&document)?;
    let Document { options, animation, layers } = document;

    let layers = layers
        .into_iter()
        .map(LayerEntry::into_layer)
        .collect::<SceneResult<Vec<_>>>()?;
    if layers.iter().map(Layer::leaf_count).sum::<usize>() == 0 {
        return Err(SceneError::validation("document has no drawable layers"));
    }
    layers.iter().try_for_each(Layer::validate)?;
    let registry = LayerRegistry::from_vec(layers)?;

    let options = SceneOptions {
        width: options.width as u32,
        height: options.height as u32,
        animated: options.animated,
        export_type: options.export_type.unwrap_or(ExportType::Png),
        flag: options.flag.unwrap_or_default(),
    };
    tracing::debug!(layers = registry.len(), width = options.width, height = options.height, "scene decoded");
    Ok(Scene::from_parts(options, animation, registry))
}

pub fn to_json_string(scene: &Scene, pretty: bool) -> SceneResult<String> {
    let document = encode(scene);
    let json = if pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    };
    json.map_err(|e| SceneError::encoding(e.to_string()))
}

/// Parse a document; malformed input is a validation error.
pub fn from_json_str(json: &str) -> SceneResult<Scene> {
    let document: Document = serde_json::from_str(json).map_err(|e| SceneError::validation(e.to_string()))?;
    decode(document)
}
