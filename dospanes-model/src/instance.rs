//! Model instances and their dirty tracking.
//!
//! An instance holds values for stored attributes only. Computed attributes
//! are evaluated against the instance on every read. Any write through
//! [`ModelInstance::set`] marks the instance dirty; a successful
//! [`ModelInstance::save`] marks it clean again.

use crate::prototype::Prototype;
use crate::{AttributeDescriptor, ModelError, ModelResult, PersistRequest};
use dospanes_types::InstanceId;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// A handle to one built instance. Clones share the same state.
#[derive(Clone)]
pub struct ModelInstance {
    inner: Arc<InstanceState>,
}

struct InstanceState {
    id: InstanceId,
    prototype: Arc<Prototype>,
    attributes: RwLock<Map<String, Value>>,
    dirty: AtomicBool,
}

impl ModelInstance {
    pub(crate) fn new(id: InstanceId, prototype: Arc<Prototype>, attributes: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(InstanceState {
                id,
                prototype,
                attributes: RwLock::new(attributes),
                dirty: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    pub fn model_name(&self) -> &str {
        &self.inner.prototype.model_name
    }

    /// Returns true if both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Attribute access ─────────────────────────────────────────

    /// Reads an attribute. Computed attributes are evaluated now.
    /// Returns `None` if the schema has no such attribute.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.inner.prototype.attributes.get(name)? {
            AttributeDescriptor::Stored { .. } => {
                Some(self.read().get(name).cloned().unwrap_or(Value::Null))
            }
            AttributeDescriptor::Computed { getter } => Some(getter(self)),
        }
    }

    /// Reads a string attribute.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|v| v.as_str().map(str::to_owned))
    }

    /// Reads a numeric attribute.
    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.as_f64())
    }

    /// Reads a boolean attribute.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|v| v.as_bool())
    }

    /// Writes a stored attribute and marks the instance dirty.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        self.inner.prototype.check_writable(name)?;
        self.write().insert(name.to_string(), value.into());
        self.inner.dirty.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Snapshot of the stored attributes.
    pub fn attributes(&self) -> Map<String, Value> {
        self.read().clone()
    }

    /// Snapshot of every attribute, computed ones included.
    pub fn properties(&self) -> Map<String, Value> {
        let mut properties = self.attributes();
        for (name, descriptor) in &self.inner.prototype.attributes {
            if let AttributeDescriptor::Computed { getter } = descriptor {
                properties.insert(name.clone(), getter(self));
            }
        }
        properties
    }

    /// Writes values that came from elsewhere (a sync batch) without
    /// marking the instance dirty. Every key must be a stored attribute;
    /// nothing is written if one is not.
    pub fn merge_remote(&self, values: &Map<String, Value>) -> ModelResult<()> {
        for name in values.keys() {
            self.inner.prototype.check_writable(name)?;
        }
        let mut attributes = self.write();
        for (name, value) in values {
            attributes.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    // ── Dirty tracking & persistence ─────────────────────────────

    /// Whether a stored attribute changed since construction or the last save.
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::SeqCst)
    }

    /// Hands the stored attributes to the model's persistence seam.
    /// On success the instance is clean and the saved attributes are returned.
    /// On failure the dirty flag is left untouched.
    pub async fn save(&self) -> ModelResult<Map<String, Value>> {
        let attributes = self.attributes();
        let prototype = &self.inner.prototype;
        let request = PersistRequest {
            model_name: prototype.model_name.clone(),
            resource_path: prototype.resource_path.clone(),
            instance_id: self.inner.id,
            attributes: attributes.clone(),
        };

        prototype.persistence.persist(request).await?;
        self.inner.dirty.store(false, Ordering::SeqCst);
        debug!("Saved {} instance {}", prototype.model_name, self.inner.id);
        Ok(attributes)
    }

    // ── Methods ──────────────────────────────────────────────────

    /// Invokes a schema-declared method with this instance as context.
    pub fn call(&self, method: &str, args: &[Value]) -> ModelResult<Value> {
        let prototype = &self.inner.prototype;
        let f = prototype
            .methods
            .get(method)
            .ok_or_else(|| ModelError::UnknownMethod {
                model: prototype.model_name.clone(),
                method: method.to_string(),
            })?;
        Ok(f(self, args))
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.inner.prototype.methods.contains_key(method)
    }

    fn read(&self) -> RwLockReadGuard<'_, Map<String, Value>> {
        self.inner
            .attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Map<String, Value>> {
        self.inner
            .attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelInstance")
            .field("id", &self.inner.id)
            .field("model", &self.inner.prototype.model_name)
            .field("attributes", &*self.read())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
