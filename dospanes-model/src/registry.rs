//! Name-keyed registry of model definitions.
//!
//! A name is defined once. Declaring it again returns the existing
//! definition and ignores the new schema; a differing attribute shape is
//! logged, or rejected under [`RegistryConfig::strict_redeclaration`].

use crate::attribute::same_table_shape;
use crate::prototype::Prototype;
use crate::{ModelDefinition, ModelError, ModelResult, ModelSchema, NoopPersistence, Persistence};
use dospanes_types::{SyncBatch, SyncSource, SyncTarget};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

/// Configuration for a model registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Reject re-declarations whose attributes differ from the registered ones.
    #[serde(default)]
    pub strict_redeclaration: bool,
}

/// Owns every model definition of an application.
pub struct ModelRegistry {
    config: RegistryConfig,
    models: RwLock<HashMap<String, Arc<ModelDefinition>>>,
    default_sync_sources: Vec<Arc<dyn SyncSource>>,
    default_sync_targets: Vec<Arc<dyn SyncTarget>>,
    persistence: Arc<dyn Persistence>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    /// Creates an empty registry whose models save through [`NoopPersistence`].
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            models: RwLock::new(HashMap::new()),
            default_sync_sources: Vec::new(),
            default_sync_targets: Vec::new(),
            persistence: Arc::new(NoopPersistence),
        }
    }

    /// Sets the persistence seam used by models defined after this call.
    #[must_use]
    pub fn with_persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
        self.persistence = persistence;
        self
    }

    /// Adds a source every model defined after this call starts with.
    #[must_use]
    pub fn with_default_sync_source(mut self, source: Arc<dyn SyncSource>) -> Self {
        self.default_sync_sources.push(source);
        self
    }

    /// Adds a target every model defined after this call starts with.
    #[must_use]
    pub fn with_default_sync_target(mut self, target: Arc<dyn SyncTarget>) -> Self {
        self.default_sync_targets.push(target);
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Defines a model, or returns the one already registered under `name`.
    ///
    /// `name` is rendered with `Display`, so `42` registers as `"42"`.
    pub fn model(&self, name: impl Display, schema: ModelSchema) -> ModelResult<Arc<ModelDefinition>> {
        let name = name.to_string();
        if name.is_empty() {
            return Err(ModelError::InvalidName);
        }

        let mut models = self.write();
        if let Some(existing) = models.get(&name) {
            if !same_table_shape(existing.attributes(), &schema.attributes) {
                if self.config.strict_redeclaration {
                    return Err(ModelError::SchemaMismatch(name));
                }
                warn!("Model {} re-declared with a different schema; keeping the original", name);
            }
            return Ok(existing.clone());
        }

        let sync_sources = self
            .default_sync_sources
            .iter()
            .cloned()
            .chain(schema.sync_sources)
            .collect();
        let sync_targets = self
            .default_sync_targets
            .iter()
            .cloned()
            .chain(schema.sync_targets)
            .collect();
        let prototype = Prototype {
            model_name: name.clone(),
            attributes: schema.attributes,
            methods: schema.methods,
            resource_path: schema.resource_path,
            persistence: self.persistence.clone(),
        };

        let definition = Arc::new(ModelDefinition::new(prototype, sync_sources, sync_targets));
        info!(
            "Defined model {} ({} attributes)",
            name,
            definition.attributes().len()
        );
        models.insert(name, definition.clone());
        Ok(definition)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModelDefinition>> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Registered model names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Forgets a model. Handles already given out keep working; the next
    /// `model` call with this name defines it afresh.
    pub fn remove(&self, name: &str) -> Option<Arc<ModelDefinition>> {
        self.write().remove(name)
    }

    /// Collects the stored attributes of every dirty instance into a batch.
    pub fn dirty_batch(&self) -> SyncBatch {
        let mut batch = SyncBatch::new();
        for (name, definition) in self.read().iter() {
            for item in definition.dirty_changes() {
                batch.push(name.clone(), item);
            }
        }
        batch
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ModelDefinition>>> {
        self.models.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<ModelDefinition>>> {
        self.models.write().unwrap_or_else(PoisonError::into_inner)
    }
}
