//! Sync coordination for DosPanes models.
//!
//! # Architecture
//!
//! A [`SyncCoordinator`] owns an ordered list of update handlers and a
//! reference to the [`ModelRegistry`](dospanes_model::ModelRegistry) whose
//! stores it merges into.
//!
//! - **Targets** are handlers: [`SyncCoordinator::publish`] hands a batch to
//!   every one of them, in registration order, and resolves once all succeed.
//! - **Sources** push into the coordinator: [`SyncCoordinator::add_sync_source`]
//!   registers a handler on the source that merges whatever it sends.
//! - **Merging** is done by the [`BatchApplicator`] according to [`SyncConfig`]:
//!   how an item finds its instance, whether missing attributes are reset,
//!   and whether a bad item fails the whole batch.
//!
//! # Example
//!
//! ```
//! use dospanes_model::{AttributeDescriptor, ModelRegistry, ModelSchema};
//! use dospanes_sync::SyncCoordinator;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(ModelRegistry::new());
//! registry
//!     .model("User", ModelSchema::new().attribute("name", AttributeDescriptor::text()))
//!     .unwrap();
//!
//! let coordinator = SyncCoordinator::new(registry);
//! assert_eq!(coordinator.handler_count(), 0);
//! ```

pub mod applicator;
mod config;
mod coordinator;
pub mod mock;

pub use applicator::{ApplyReport, BatchApplicator};
pub use config::{Identity, ItemErrorPolicy, MergeStrategy, SyncConfig};
pub use coordinator::{Subscription, SyncCoordinator};

pub use dospanes_types::{
    handler_fn, ChangeItem, InstanceId, ModelChanges, SyncBatch, SyncError, SyncResult,
    SyncSource, SyncTarget,
};
