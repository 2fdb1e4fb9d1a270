//! Resolution of raw (JSON) attribute descriptors.
//!
//! An entry carrying `defaultValue` becomes a stored attribute with that
//! default. Anything else (a missing key, a non-object entry) still resolves
//! to a stored attribute with a `null` default. Computed attributes need a
//! getter and can only be declared through [`crate::ModelSchema::attribute`].

use crate::{AttributeDescriptor, AttributeTable};
use serde_json::{Map, Value};
use tracing::debug;

const DEFAULT_VALUE_KEY: &str = "defaultValue";

/// Resolves a single raw descriptor.
pub fn resolve_descriptor(raw: &Value) -> AttributeDescriptor {
    match raw.get(DEFAULT_VALUE_KEY) {
        Some(default_value) => AttributeDescriptor::stored(default_value.clone()),
        None => AttributeDescriptor::default(),
    }
}

/// Resolves every entry of a raw `attributes` object.
pub fn resolve_attributes(raw: &Map<String, Value>) -> AttributeTable {
    raw.iter()
        .map(|(name, entry)| {
            if entry.get(DEFAULT_VALUE_KEY).is_none() {
                debug!("Attribute {} has no defaultValue, defaulting to null", name);
            }
            (name.clone(), resolve_descriptor(entry))
        })
        .collect()
}
