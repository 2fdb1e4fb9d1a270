use crate::ModelInstance;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Derives a value from the instance it is read on.
pub type Getter = Arc<dyn Fn(&ModelInstance) -> Value + Send + Sync>;

/// Resolved attributes of a model, keyed by attribute name.
pub type AttributeTable = BTreeMap<String, AttributeDescriptor>;

/// One schema attribute.
///
/// A stored attribute has backing storage seeded from its default and can be
/// written. A computed attribute is evaluated on every read and cannot be
/// written.
#[derive(Clone)]
pub enum AttributeDescriptor {
    Stored { default_value: Value },
    Computed { getter: Getter },
}

/// Whether an attribute has storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Stored,
    Computed,
}

impl AttributeDescriptor {
    /// A stored attribute with an arbitrary default.
    pub fn stored(default_value: impl Into<Value>) -> Self {
        Self::Stored {
            default_value: default_value.into(),
        }
    }

    /// Shorthand for a text attribute (defaults to `""`).
    pub fn text() -> Self {
        Self::stored("")
    }

    /// Shorthand for a numeric attribute (defaults to `0`).
    pub fn number() -> Self {
        Self::stored(0)
    }

    /// Shorthand for a boolean attribute (defaults to `false`).
    pub fn boolean() -> Self {
        Self::stored(false)
    }

    /// A computed attribute. `getter` receives the owning instance, so it can
    /// read any other attribute of it.
    pub fn computed<F>(getter: F) -> Self
    where
        F: Fn(&ModelInstance) -> Value + Send + Sync + 'static,
    {
        Self::Computed {
            getter: Arc::new(getter),
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Stored { .. } => AttributeKind::Stored,
            Self::Computed { .. } => AttributeKind::Computed,
        }
    }

    pub fn is_computed(&self) -> bool {
        self.kind() == AttributeKind::Computed
    }

    /// The default of a stored attribute; `None` for computed ones.
    pub fn default_value(&self) -> Option<&Value> {
        match self {
            Self::Stored { default_value } => Some(default_value),
            Self::Computed { .. } => None,
        }
    }

    /// Two descriptors describe the same shape when they have the same kind
    /// and, for stored attributes, the same default. Computed attributes only
    /// compare by kind: each declaration builds its own getter closure.
    pub(crate) fn same_shape(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Stored { default_value: a }, Self::Stored { default_value: b }) => a == b,
            (Self::Computed { .. }, Self::Computed { .. }) => true,
            _ => false,
        }
    }
}

impl Default for AttributeDescriptor {
    /// A stored attribute with a `null` default.
    fn default() -> Self {
        Self::stored(Value::Null)
    }
}

impl fmt::Debug for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored { default_value } => f
                .debug_struct("Stored")
                .field("default_value", default_value)
                .finish(),
            Self::Computed { .. } => f.write_str("Computed"),
        }
    }
}

/// Compares two attribute tables by name and shape.
pub(crate) fn same_table_shape(a: &AttributeTable, b: &AttributeTable) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|((name_a, desc_a), (name_b, desc_b))| name_a == name_b && desc_a.same_shape(desc_b))
}
