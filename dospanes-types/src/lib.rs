//! Shared type definitions for DosPanes.
//!
//! This crate defines the types that both the model layer and the sync
//! coordinator depend on:
//! - Instance identifiers (UUID v7)
//! - Sync batches (model name -> per-instance change payloads)
//! - The sync source/target contract and its error type
//!
//! Nothing here knows about schemas or stores. Those belong to
//! `dospanes-model`; the merge of batches into stores belongs to
//! `dospanes-sync`.

mod batch;
mod endpoint;
mod error;
mod ids;

pub use batch::{ChangeItem, ModelChanges, SyncBatch};
pub use endpoint::{handler_fn, HandlerFn, SyncSource, SyncTarget};
pub use error::{SyncError, SyncResult};
pub use ids::InstanceId;
