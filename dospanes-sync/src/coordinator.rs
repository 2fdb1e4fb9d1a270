//! The sync coordinator - handler registry, broadcast and merge.
//!
//! The coordinator is cheap to clone; clones share one handler list. Sources
//! hold only a weak reference back to it, so a source stored inside a model
//! definition never keeps the coordinator alive. Once the coordinator is gone
//! or the source's subscription is removed, the source's handler passes
//! batches through untouched.

use crate::applicator::BatchApplicator;
use crate::config::SyncConfig;
use async_trait::async_trait;
use dospanes_model::{ModelDefinition, ModelRegistry};
use dospanes_types::{SyncBatch, SyncResult, SyncSource, SyncTarget};
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::{debug, info};

/// Handle for one registered handler, used to unsubscribe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

struct Registration {
    subscription: Subscription,
    handler: Arc<dyn SyncTarget>,
}

struct CoordinatorState {
    registry: Arc<ModelRegistry>,
    applicator: BatchApplicator,
    handlers: RwLock<Vec<Registration>>,
    sources: RwLock<HashSet<Subscription>>,
    next_subscription: AtomicU64,
}

impl CoordinatorState {
    fn next_subscription(&self) -> Subscription {
        Subscription(self.next_subscription.fetch_add(1, Ordering::Relaxed))
    }

    fn source_attached(&self, subscription: Subscription) -> bool {
        self.sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&subscription)
    }

    fn detach_source(&self, subscription: Subscription) -> bool {
        self.sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&subscription)
    }

    fn merge(&self, batch: SyncBatch) -> SyncResult<SyncBatch> {
        self.applicator.apply(&batch, &self.registry)?;
        Ok(batch)
    }
}

/// Routes batches between a registry's models and external sources/targets.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<CoordinatorState>,
}

impl SyncCoordinator {
    /// Creates a coordinator with the default merge configuration.
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self::with_config(registry, SyncConfig::default())
    }

    pub fn with_config(registry: Arc<ModelRegistry>, config: SyncConfig) -> Self {
        Self {
            inner: Arc::new(CoordinatorState {
                registry,
                applicator: BatchApplicator::new(config),
                handlers: RwLock::new(Vec::new()),
                sources: RwLock::new(HashSet::new()),
                next_subscription: AtomicU64::new(1),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.inner.registry
    }

    pub fn config(&self) -> &SyncConfig {
        self.inner.applicator.config()
    }

    // ── Registration ─────────────────────────────────────────────

    /// Lets `source` push its updates into this coordinator's models.
    ///
    /// Passing the returned handle to [`unsubscribe`](Self::unsubscribe)
    /// detaches the source: its handler stays registered on the source but
    /// resolves with each batch unchanged.
    pub fn add_sync_source(&self, source: &dyn SyncSource) -> Subscription {
        let subscription = self.inner.next_subscription();
        self.inner
            .sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(subscription);
        source.on_update(Arc::new(SourceHandler {
            coordinator: Arc::downgrade(&self.inner),
            subscription,
        }));
        info!("Registered sync source {:?}", subscription);
        subscription
    }

    /// Registers `target` to receive every published batch.
    pub fn add_sync_target(&self, target: Arc<dyn SyncTarget>) -> Subscription {
        let subscription = self.register(target);
        info!("Registered sync target {:?}", subscription);
        subscription
    }

    /// Appends handlers, in order.
    pub fn on_update<I>(&self, handlers: I) -> Vec<Subscription>
    where
        I: IntoIterator<Item = Arc<dyn SyncTarget>>,
    {
        handlers.into_iter().map(|h| self.register(h)).collect()
    }

    /// Registers every source and target declared on `definition`, sources
    /// first.
    pub fn connect(&self, definition: &ModelDefinition) -> Vec<Subscription> {
        let sources = definition
            .sync_sources()
            .iter()
            .map(|source| self.add_sync_source(source.as_ref()));
        let targets = definition
            .sync_targets()
            .iter()
            .map(|target| self.add_sync_target(target.clone()));
        sources.chain(targets).collect()
    }

    /// Removes the first registration of `target`. Returns false, and does
    /// nothing else, if it was never registered.
    pub fn remove_sync_target(&self, target: &Arc<dyn SyncTarget>) -> bool {
        let mut handlers = self.write_handlers();
        let position = handlers
            .iter()
            .position(|r| same_handler(&r.handler, target));
        match position {
            Some(index) => {
                let removed = handlers.remove(index);
                info!("Removed sync target {:?}", removed.subscription);
                true
            }
            None => false,
        }
    }

    /// Removes one registration by its handle, whether a handler or a
    /// source.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        if self.inner.detach_source(subscription) {
            info!("Detached sync source {:?}", subscription);
            return true;
        }
        let mut handlers = self.write_handlers();
        let before = handlers.len();
        handlers.retain(|r| r.subscription != subscription);
        before != handlers.len()
    }

    /// Drops every registered handler.
    pub fn clear_sync_targets(&self) {
        self.write_handlers().clear();
        info!("Cleared sync targets");
    }

    pub fn handler_count(&self) -> usize {
        self.read_handlers().len()
    }

    // ── Broadcast ────────────────────────────────────────────────

    /// Notifies every handler with an empty batch.
    pub async fn notify_sync_targets(&self) -> SyncResult<Vec<SyncBatch>> {
        self.publish(SyncBatch::new()).await
    }

    /// Hands `batch` to every handler, started in registration order.
    /// Resolves with their results in that order once all succeed, or with
    /// the first failure.
    pub async fn publish(&self, batch: SyncBatch) -> SyncResult<Vec<SyncBatch>> {
        let handlers: Vec<Arc<dyn SyncTarget>> = self
            .read_handlers()
            .iter()
            .map(|r| r.handler.clone())
            .collect();
        debug!(
            "Publishing batch with {} items to {} handlers",
            batch.item_count(),
            handlers.len()
        );

        try_join_all(handlers.iter().map(|h| h.sync(batch.clone()))).await
    }

    // ── Merge ────────────────────────────────────────────────────

    /// Merges an incoming batch into the registry's stores and resolves with
    /// the batch.
    pub async fn sync(&self, batch: SyncBatch) -> SyncResult<SyncBatch> {
        self.inner.merge(batch)
    }

    fn register(&self, handler: Arc<dyn SyncTarget>) -> Subscription {
        let subscription = self.inner.next_subscription();
        self.write_handlers().push(Registration {
            subscription,
            handler,
        });
        subscription
    }

    fn read_handlers(&self) -> RwLockReadGuard<'_, Vec<Registration>> {
        self.inner
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_handlers(&self) -> RwLockWriteGuard<'_, Vec<Registration>> {
        self.inner
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SyncTarget for SyncCoordinator {
    async fn sync(&self, batch: SyncBatch) -> SyncResult<SyncBatch> {
        self.inner.merge(batch)
    }
}

/// The handler a source invokes. Holds the coordinator weakly.
struct SourceHandler {
    coordinator: Weak<CoordinatorState>,
    subscription: Subscription,
}

#[async_trait]
impl SyncTarget for SourceHandler {
    async fn sync(&self, batch: SyncBatch) -> SyncResult<SyncBatch> {
        match self.coordinator.upgrade() {
            Some(coordinator) if coordinator.source_attached(self.subscription) => {
                coordinator.merge(batch)
            }
            _ => {
                debug!("Sync source {:?} is detached; passing batch through", self.subscription);
                Ok(batch)
            }
        }
    }
}

// Compares data pointers only; vtable pointers of the same type may differ.
fn same_handler(a: &Arc<dyn SyncTarget>, b: &Arc<dyn SyncTarget>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
