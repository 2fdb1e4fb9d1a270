//! Sync batches.
//!
//! A batch maps a model name to the list of per-instance changes for that
//! model. Batches are produced by sync sources (or by a registry collecting
//! its dirty instances) and consumed by the sync coordinator.

use crate::InstanceId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A set of changes grouped by model name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncBatch {
    models: BTreeMap<String, ModelChanges>,
}

impl SyncBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a change for `model`, creating its entry if needed.
    pub fn push(&mut self, model: impl Into<String>, item: ChangeItem) {
        self.models.entry(model.into()).or_default().items.push(item);
    }

    /// Builder form of [`SyncBatch::push`].
    #[must_use]
    pub fn with_item(mut self, model: impl Into<String>, item: ChangeItem) -> Self {
        self.push(model, item);
        self
    }

    /// Returns the changes for a model.
    pub fn get(&self, model: &str) -> Option<&ModelChanges> {
        self.models.get(model)
    }

    /// Model names present in the batch, in sorted order.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Iterates over `(model name, changes)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelChanges)> {
        self.models.iter().map(|(name, changes)| (name.as_str(), changes))
    }

    /// Returns true when the batch names no models.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Total number of items across all models.
    pub fn item_count(&self) -> usize {
        self.models.values().map(|c| c.items.len()).sum()
    }

    /// Parses a batch from its JSON form.
    pub fn from_json(json: &str) -> crate::SyncResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the batch to JSON.
    pub fn to_json(&self) -> crate::SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The change list for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelChanges {
    pub items: Vec<ChangeItem>,
}

/// A change payload for a single instance.
///
/// `id` is the instance identity when the producer knows it. Consumers that
/// match on an attribute value instead may leave it empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<InstanceId>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ChangeItem {
    /// A change with no instance identity.
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self { id: None, attributes }
    }

    /// A change addressed to a specific instance.
    pub fn for_instance(id: InstanceId, attributes: Map<String, Value>) -> Self {
        Self {
            id: Some(id),
            attributes,
        }
    }

    /// Builds a change from a JSON object. Non-object values yield an empty
    /// attribute map.
    pub fn from_value(id: Option<InstanceId>, value: Value) -> Self {
        let attributes = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { id, attributes }
    }

    /// Returns an attribute value carried by this change.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}
