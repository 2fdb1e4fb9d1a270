//! In-memory sources and targets for testing.

use async_trait::async_trait;
use dospanes_types::{SyncBatch, SyncError, SyncResult, SyncSource, SyncTarget};
use std::sync::{Arc, Mutex, PoisonError};

/// A source whose updates are triggered by hand with [`MockSource::emit`].
#[derive(Default)]
pub struct MockSource {
    handlers: Mutex<Vec<Arc<dyn SyncTarget>>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handlers registered on this source.
    pub fn handler_count(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Pushes `batch` to every registered handler, in order, stopping at the
    /// first failure.
    pub async fn emit(&self, batch: SyncBatch) -> SyncResult<Vec<SyncBatch>> {
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let mut results = Vec::with_capacity(handlers.len());
        for handler in handlers {
            results.push(handler.sync(batch.clone()).await?);
        }
        Ok(results)
    }
}

impl SyncSource for MockSource {
    fn on_update(&self, handler: Arc<dyn SyncTarget>) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }
}

/// A target that remembers every batch it receives.
#[derive(Default)]
pub struct RecordingTarget {
    received: Mutex<Vec<SyncBatch>>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches received so far, oldest first.
    pub fn received(&self) -> Vec<SyncBatch> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl SyncTarget for RecordingTarget {
    async fn sync(&self, batch: SyncBatch) -> SyncResult<SyncBatch> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(batch.clone());
        Ok(batch)
    }
}

/// A target that rejects every batch.
pub struct FailingTarget {
    reason: String,
}

impl FailingTarget {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SyncTarget for FailingTarget {
    async fn sync(&self, _batch: SyncBatch) -> SyncResult<SyncBatch> {
        Err(SyncError::Handler(self.reason.clone()))
    }
}
