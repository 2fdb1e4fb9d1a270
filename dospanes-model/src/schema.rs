use crate::{resolve_attributes, AttributeDescriptor, AttributeTable, ModelInstance, ModelResult};
use dospanes_types::{SyncSource, SyncTarget};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An instance method: receives the instance and call arguments.
pub type Method = Arc<dyn Fn(&ModelInstance, &[Value]) -> Value + Send + Sync>;

/// Declarative description of a model.
///
/// ```
/// use dospanes_model::{AttributeDescriptor, ModelSchema};
/// use serde_json::json;
///
/// let schema = ModelSchema::new()
///     .attribute("firstName", AttributeDescriptor::text())
///     .attribute("lastName", AttributeDescriptor::text())
///     .attribute(
///         "fullName",
///         AttributeDescriptor::computed(|user| {
///             let first = user.get_str("firstName").unwrap_or_default();
///             let last = user.get_str("lastName").unwrap_or_default();
///             json!(format!("{first} {last}"))
///         }),
///     );
/// assert_eq!(schema.attributes().len(), 3);
/// ```
#[derive(Clone, Default)]
pub struct ModelSchema {
    pub(crate) attributes: AttributeTable,
    pub(crate) methods: BTreeMap<String, Method>,
    pub(crate) resource_path: Option<String>,
    pub(crate) sync_sources: Vec<Arc<dyn SyncSource>>,
    pub(crate) sync_targets: Vec<Arc<dyn SyncTarget>>,
}

impl ModelSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an attribute. A later declaration of the same name wins.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, descriptor: AttributeDescriptor) -> Self {
        self.attributes.insert(name.into(), descriptor);
        self
    }

    /// Declares an instance method callable through [`ModelInstance::call`].
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&ModelInstance, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    #[must_use]
    pub fn resource_path(mut self, path: impl Into<String>) -> Self {
        self.resource_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn sync_source(mut self, source: Arc<dyn SyncSource>) -> Self {
        self.sync_sources.push(source);
        self
    }

    #[must_use]
    pub fn sync_target(mut self, target: Arc<dyn SyncTarget>) -> Self {
        self.sync_targets.push(target);
        self
    }

    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    /// Builds a schema from its JSON form:
    /// `{"attributes": {"name": {"defaultValue": ...}}, "resourcePath": "/users"}`.
    ///
    /// Missing or malformed sections are treated as empty.
    pub fn from_value(value: &Value) -> Self {
        let attributes = value
            .get("attributes")
            .and_then(Value::as_object)
            .map(resolve_attributes)
            .unwrap_or_default();
        let resource_path = value
            .get("resourcePath")
            .and_then(Value::as_str)
            .map(str::to_owned);

        Self {
            attributes,
            resource_path,
            ..Self::default()
        }
    }

    /// Parses a JSON string and builds a schema from it.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }
}
