//! Layer registry.
//!
//! An id-keyed collection kept in paint order: ascending `zIndex`, ties in
//! insertion order. Every structural mutation re-sorts.

use crate::codec::LayerEntry;
use crate::layer::Layer;
use common::error::{SceneError, SceneResult};
use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Id-keyed, z-ordered layers of one scene or group.
#[derive(Clone, Debug, Default)]
pub struct LayerRegistry {
    layers: IndexMap<String, Layer>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list; fails on the first duplicate id.
    pub fn from_vec(layers: Vec<Layer>) -> SceneResult<Self> {
        let mut registry = Self::new();
        registry.add(layers)?;
        Ok(registry)
    }

    /// Insert layers, skipping `None` entries.
    ///
    /// A duplicate id stops the insert with [`SceneError::DuplicateId`];
    /// layers inserted before it stay in the registry.
    pub fn add<I, L>(&mut self, layers: I) -> SceneResult<()>
    where
        I: IntoIterator<Item = L>,
        L: Into<Option<Layer>>,
    {
        let mut result = Ok(());
        for layer in layers.into_iter().filter_map(Into::into) {
            if self.layers.contains_key(layer.id()) {
                result = Err(SceneError::duplicate(layer.id()));
                break;
            }
            tracing::trace!(id = layer.id(), kind = layer.kind().as_str(), "layer added");
            self.layers.insert(layer.id().to_string(), layer);
        }
        self.sort();
        result
    }

    /// Remove layers by id; unknown ids are ignored.
    pub fn remove<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            if self.layers.shift_remove(id.as_ref()).is_some() {
                tracing::trace!(id = id.as_ref(), "layer removed");
            }
        }
        self.sort();
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.get_mut(id)
    }

    /// Look up `id` here, then among the direct children of every group.
    ///
    /// Groups nested inside groups are not searched.
    pub fn get_cross(&self, id: &str) -> Option<&Layer> {
        self.layers.get(id).or_else(|| {
            self.layers
                .values()
                .filter_map(Layer::as_group)
                .find_map(|group| group.layers.get(id))
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    /// Stable sort by `zIndex`.
    pub fn sort(&mut self) {
        self.layers.sort_by(|_, a, _, b| a.z_index().cmp(&b.z_index()));
    }

    /// Layers in paint order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        self.layers.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<Layer> {
        self.layers.values().cloned().collect()
    }

    pub fn into_vec(self) -> Vec<Layer> {
        self.layers.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Multiply absolute lengths of every layer by `ratio`.
    pub fn scale(&mut self, ratio: f64) {
        for layer in self.layers.values_mut() {
            layer.scale(ratio);
        }
    }
}

impl PartialEq for LayerRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.layers.iter().eq(other.layers.iter())
    }
}

impl Serialize for LayerRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.layers.values())
    }
}

impl<'de> Deserialize<'de> for LayerRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<LayerEntry>::deserialize(deserializer)?;
        entries
            .into_iter()
            .map(LayerEntry::into_layer)
            .collect::<SceneResult<Vec<_>>>()
            .and_then(LayerRegistry::from_vec)
            .map_err(de::Error::custom)
    }
}
