//! Runtime model definitions for DosPanes.
//!
//! Turns a declarative schema into a model that builds tracked instances:
//! - [`AttributeDescriptor`]: a stored attribute (default value) or a computed one (getter)
//! - [`ModelSchema`]: the attributes, methods, resource path and sync endpoints of a model
//! - [`ModelRegistry`]: name-keyed, idempotent registry of [`ModelDefinition`]s
//! - [`ModelDefinition`]: builds [`ModelInstance`]s and keeps them in its store
//! - [`ModelInstance`]: attribute access, dirty tracking and `save()`
//! - [`Persistence`]: the seam `save()` hands attributes to
//!
//! Sync batches and the source/target contract come from `dospanes-types`;
//! merging batches into stores lives in `dospanes-sync`.

mod attribute;
mod definition;
mod error;
mod instance;
mod persistence;
mod prototype;
mod registry;
mod resolver;
mod schema;

pub use attribute::{AttributeDescriptor, AttributeKind, AttributeTable, Getter};
pub use definition::ModelDefinition;
pub use error::{ModelError, ModelResult};
pub use instance::ModelInstance;
pub use persistence::{NoopPersistence, PersistRequest, Persistence};
pub use registry::{ModelRegistry, RegistryConfig};
pub use resolver::{resolve_attributes, resolve_descriptor};
pub use schema::{Method, ModelSchema};
