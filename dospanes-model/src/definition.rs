use crate::prototype::Prototype;
use crate::{AttributeTable, ModelInstance, ModelResult};
use dospanes_types::{ChangeItem, InstanceId, SyncSource, SyncTarget};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tracing::debug;

/// A registered model: its prototype, its store of built instances, and the
/// sync endpoints it exchanges updates with.
///
/// Definitions are created by [`crate::ModelRegistry::model`] and shared as
/// `Arc<ModelDefinition>`.
pub struct ModelDefinition {
    prototype: Arc<Prototype>,
    store: RwLock<Vec<ModelInstance>>,
    sync_sources: Vec<Arc<dyn SyncSource>>,
    sync_targets: Vec<Arc<dyn SyncTarget>>,
}

impl ModelDefinition {
    pub(crate) fn new(
        prototype: Prototype,
        sync_sources: Vec<Arc<dyn SyncSource>>,
        sync_targets: Vec<Arc<dyn SyncTarget>>,
    ) -> Self {
        Self {
            prototype: Arc::new(prototype),
            store: RwLock::new(Vec::new()),
            sync_sources,
            sync_targets,
        }
    }

    pub fn name(&self) -> &str {
        &self.prototype.model_name
    }

    pub fn resource_path(&self) -> Option<&str> {
        self.prototype.resource_path.as_deref()
    }

    pub fn attributes(&self) -> &AttributeTable {
        &self.prototype.attributes
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.prototype.attributes.keys().map(String::as_str)
    }

    /// Returns `Some(true)` for computed attributes, `Some(false)` for stored
    /// ones and `None` for names outside the schema.
    pub fn is_computed(&self, name: &str) -> Option<bool> {
        self.prototype.attributes.get(name).map(|d| d.is_computed())
    }

    /// Fails unless `name` is a stored attribute of this model.
    pub fn check_writable(&self, name: &str) -> ModelResult<()> {
        self.prototype.check_writable(name)
    }

    /// Defaults of every stored attribute.
    pub fn stored_defaults(&self) -> Map<String, Value> {
        self.prototype.seed(&Map::new())
    }

    pub fn sync_sources(&self) -> &[Arc<dyn SyncSource>] {
        &self.sync_sources
    }

    pub fn sync_targets(&self) -> &[Arc<dyn SyncTarget>] {
        &self.sync_targets
    }

    // ── Instance factory ─────────────────────────────────────────

    /// Builds an instance and appends it to the store.
    ///
    /// Stored attributes take their value from `input` when it has a key of
    /// that name and their default otherwise. Input that is not a JSON object
    /// is treated as empty.
    pub fn build(&self, input: Value) -> ModelInstance {
        self.build_with_id(InstanceId::new(), input)
    }

    /// Like [`ModelDefinition::build`] with a caller-chosen identity, so
    /// replicas of the same instance can share an id.
    pub fn build_with_id(&self, id: InstanceId, input: Value) -> ModelInstance {
        let input = match input {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let instance = ModelInstance::new(id, self.prototype.clone(), self.prototype.seed(&input));

        self.store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(instance.clone());
        debug!("Built {} instance {}", self.name(), id);
        instance
    }

    // ── Store ────────────────────────────────────────────────────

    /// Snapshot of the store, in creation order.
    pub fn store(&self) -> Vec<ModelInstance> {
        self.read_store().clone()
    }

    pub fn store_len(&self) -> usize {
        self.read_store().len()
    }

    pub fn find(&self, id: InstanceId) -> Option<ModelInstance> {
        self.read_store().iter().find(|i| i.id() == id).cloned()
    }

    /// First instance whose stored attribute `name` equals `value`.
    pub fn find_by(&self, name: &str, value: &Value) -> Option<ModelInstance> {
        self.read_store()
            .iter()
            .find(|i| i.get(name).as_ref() == Some(value))
            .cloned()
    }

    /// Change items for every dirty instance, addressed by instance id.
    pub fn dirty_changes(&self) -> Vec<ChangeItem> {
        self.read_store()
            .iter()
            .filter(|i| i.is_dirty())
            .map(|i| ChangeItem::for_instance(i.id(), i.attributes()))
            .collect()
    }

    fn read_store(&self) -> RwLockReadGuard<'_, Vec<ModelInstance>> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ModelDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDefinition")
            .field("name", &self.prototype.model_name)
            .field("attributes", &self.prototype.attributes)
            .field("resource_path", &self.prototype.resource_path)
            .field("store_len", &self.store_len())
            .finish()
    }
}
