//! Batch applicator - merges sync batches into model stores.
//!
//! Merging happens in two passes. The first resolves every item to an
//! instance and the values it will write; the second writes them. Under
//! [`ItemErrorPolicy::FailBatch`] a bad item aborts during the first pass,
//! so a rejected batch leaves every store untouched.
//!
//! Merged values do not mark instances dirty: they describe state that
//! already exists elsewhere.

use crate::config::{Identity, ItemErrorPolicy, MergeStrategy, SyncConfig};
use dospanes_model::{ModelDefinition, ModelError, ModelInstance, ModelRegistry};
use dospanes_types::{ChangeItem, SyncBatch, SyncError, SyncResult};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Outcome of applying a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Items written into an instance.
    pub applied: usize,
    /// Items with no matching instance, or dropped under `Skip`.
    pub skipped: usize,
}

/// Applies sync batches to the models of a registry.
#[derive(Debug, Clone, Default)]
pub struct BatchApplicator {
    config: SyncConfig,
}

impl BatchApplicator {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Merges `batch` into the stores of `registry`.
    pub fn apply(&self, batch: &SyncBatch, registry: &ModelRegistry) -> SyncResult<ApplyReport> {
        let mut report = ApplyReport::default();
        let mut planned: Vec<(ModelInstance, Map<String, Value>)> = Vec::new();

        for (model_name, changes) in batch.iter() {
            let Some(definition) = registry.get(model_name) else {
                self.reject(SyncError::UnknownModel(model_name.to_string()))?;
                report.skipped += changes.items.len();
                continue;
            };

            for item in &changes.items {
                match self.prepare(&definition, item) {
                    Ok(Some(write)) => planned.push(write),
                    Ok(None) => {
                        debug!("No {} instance matches item {:?}; skipping", model_name, item.id);
                        report.skipped += 1;
                    }
                    Err(e) => {
                        self.reject(e)?;
                        report.skipped += 1;
                    }
                }
            }
        }

        for (instance, values) in planned {
            instance
                .merge_remote(&values)
                .map_err(|e| merge_error(instance.model_name(), e))?;
            report.applied += 1;
        }

        debug!(
            "Applied sync batch: {} applied, {} skipped",
            report.applied, report.skipped
        );
        Ok(report)
    }

    /// Resolves an item to the instance it targets and the values to write.
    /// `Ok(None)` means no instance matches.
    fn prepare(
        &self,
        definition: &ModelDefinition,
        item: &ChangeItem,
    ) -> SyncResult<Option<(ModelInstance, Map<String, Value>)>> {
        let model = definition.name();
        for name in item.attributes.keys() {
            definition
                .check_writable(name)
                .map_err(|e| merge_error(model, e))?;
        }

        let instance = match &self.config.identity {
            Identity::InstanceId => {
                let id = item.id.ok_or_else(|| SyncError::Merge {
                    model: model.to_string(),
                    reason: "item has no instance id".to_string(),
                })?;
                definition.find(id)
            }
            Identity::Attribute(key) => {
                let value = item.get(key).ok_or_else(|| SyncError::Merge {
                    model: model.to_string(),
                    reason: format!("item has no value for identity attribute {key}"),
                })?;
                definition.find_by(key, value)
            }
        };
        let Some(instance) = instance else {
            return Ok(None);
        };

        let values = match self.config.merge_strategy {
            MergeStrategy::Patch => item.attributes.clone(),
            MergeStrategy::Replace => {
                let mut values = definition.stored_defaults();
                values.extend(item.attributes.clone());
                values
            }
        };
        Ok(Some((instance, values)))
    }

    /// Applies the item error policy: `Err` aborts the batch, `Ok` skips.
    fn reject(&self, error: SyncError) -> SyncResult<()> {
        match self.config.item_errors {
            ItemErrorPolicy::FailBatch => Err(error),
            ItemErrorPolicy::Skip => {
                warn!("Skipping sync item: {}", error);
                Ok(())
            }
        }
    }
}

fn merge_error(model: &str, error: ModelError) -> SyncError {
    SyncError::Merge {
        model: model.to_string(),
        reason: error.to_string(),
    }
}
