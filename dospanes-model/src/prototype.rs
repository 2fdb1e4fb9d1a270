//! The per-model template every instance points at.

use crate::schema::Method;
use crate::{AttributeDescriptor, AttributeTable, ModelError, ModelResult, Persistence};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared, immutable description of how a model's instances behave.
pub(crate) struct Prototype {
    pub(crate) model_name: String,
    pub(crate) attributes: AttributeTable,
    pub(crate) methods: BTreeMap<String, Method>,
    pub(crate) resource_path: Option<String>,
    pub(crate) persistence: Arc<dyn Persistence>,
}

impl Prototype {
    pub(crate) fn descriptor(&self, name: &str) -> ModelResult<&AttributeDescriptor> {
        self.attributes
            .get(name)
            .ok_or_else(|| ModelError::UnknownAttribute {
                model: self.model_name.clone(),
                attribute: name.to_string(),
            })
    }

    /// Fails unless `name` is a stored attribute.
    pub(crate) fn check_writable(&self, name: &str) -> ModelResult<()> {
        if self.descriptor(name)?.is_computed() {
            return Err(ModelError::ReadOnlyAttribute {
                model: self.model_name.clone(),
                attribute: name.to_string(),
            });
        }
        Ok(())
    }

    /// Seeds stored attributes from `input`, falling back to defaults.
    /// Keys of `input` that are not stored attributes are ignored.
    pub(crate) fn seed(&self, input: &Map<String, Value>) -> Map<String, Value> {
        self.attributes
            .iter()
            .filter_map(|(name, descriptor)| {
                let default_value = descriptor.default_value()?;
                let value = input.get(name).unwrap_or(default_value).clone();
                Some((name.clone(), value))
            })
            .collect()
    }
}
