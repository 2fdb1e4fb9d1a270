//! The sync source/target contract.
//!
//! A target receives batches. A source accepts handlers and invokes them on
//! its own updates. The coordinator is both: it registers itself as a
//! handler on sources and fans batches out to targets.

use crate::{SyncBatch, SyncResult};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Anything that can receive a sync batch.
///
/// Implementations resolve with the batch they accepted (possibly rewritten)
/// or fail through the returned `Result`.
#[async_trait]
pub trait SyncTarget: Send + Sync {
    async fn sync(&self, batch: SyncBatch) -> SyncResult<SyncBatch>;
}

/// A collaborator that pushes its updates into registered handlers.
pub trait SyncSource: Send + Sync {
    /// Registers `handler` to be invoked whenever this source has updates.
    fn on_update(&self, handler: Arc<dyn SyncTarget>);
}

/// Adapts an async closure into a [`SyncTarget`].
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> SyncTarget for HandlerFn<F>
where
    F: Fn(SyncBatch) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SyncResult<SyncBatch>> + Send + 'static,
{
    async fn sync(&self, batch: SyncBatch) -> SyncResult<SyncBatch> {
        (self.f)(batch).await
    }
}

/// Wraps `f` as a shareable handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn SyncTarget>
where
    F: Fn(SyncBatch) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SyncResult<SyncBatch>> + Send + 'static,
{
    Arc::new(HandlerFn { f })
}
