//! In-memory `SnapshotStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use sediment_core::error::DomainError;
use sediment_core::snapshot::{Snapshot, SnapshotStore};
use sediment_core::stream::StreamId;

/// A key-value snapshot store backed by a map.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshots: Mutex<HashMap<StreamId, Snapshot>>,
}

impl InMemorySnapshotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored snapshot version for a stream, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn stored_version(&self, stream_id: &StreamId) -> Option<i64> {
        self.snapshots
            .lock()
            .unwrap()
            .get(stream_id)
            .map(|s| s.version)
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, snapshot: Snapshot) -> Result<(), DomainError> {
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.stream_id.clone(), snapshot);
        Ok(())
    }

    async fn load(&self, stream_id: &StreamId) -> Result<Option<Snapshot>, DomainError> {
        Ok(self.snapshots.lock().unwrap().get(stream_id).cloned())
    }

    async fn delete(&self, stream_id: &StreamId) -> Result<(), DomainError> {
        self.snapshots.lock().unwrap().remove(stream_id);
        Ok(())
    }
}

/// A snapshot store that always fails with `StoreUnavailable`. Snapshot
/// failures must never fail a command; this fake proves it.
#[derive(Debug, Default)]
pub struct FailingSnapshotStore;

#[async_trait]
impl SnapshotStore for FailingSnapshotStore {
    async fn save(&self, _snapshot: Snapshot) -> Result<(), DomainError> {
        Err(DomainError::StoreUnavailable("connection refused".into()))
    }

    async fn load(&self, _stream_id: &StreamId) -> Result<Option<Snapshot>, DomainError> {
        Err(DomainError::StoreUnavailable("connection refused".into()))
    }

    async fn delete(&self, _stream_id: &StreamId) -> Result<(), DomainError> {
        Err(DomainError::StoreUnavailable("connection refused".into()))
    }
}
