//! Persistence binding: one aggregate's view of its backing stores.

use std::sync::Arc;

use sediment_core::aggregate::Aggregate;
use sediment_core::envelope::EventEnvelope;
use sediment_core::error::DomainError;
use sediment_core::snapshot::{Snapshot, SnapshotStore};
use sediment_core::store::{EventStore, ExpectedVersion};
use sediment_core::stream::StreamId;

use crate::retry;

/// Binds an event store and an optional snapshot store into the
/// persistence surface a domain object works against. Cloning is cheap;
/// bindings are shared by all objects a factory creates unless a caller
/// supplies a different one per aggregate.
#[derive(Clone)]
pub struct PersistenceBinding {
    event_store: Arc<dyn EventStore>,
    snapshot_store: Option<Arc<dyn SnapshotStore>>,
}

impl PersistenceBinding {
    /// Creates a binding with snapshotting disabled. The kernel is fully
    /// correct without snapshots, just slower to hydrate.
    #[must_use]
    pub fn new(event_store: Arc<dyn EventStore>) -> Self {
        Self {
            event_store,
            snapshot_store: None,
        }
    }

    /// Creates a binding with a snapshot store.
    #[must_use]
    pub fn with_snapshots(
        event_store: Arc<dyn EventStore>,
        snapshot_store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            event_store,
            snapshot_store: Some(snapshot_store),
        }
    }

    /// Loads the snapshot-seeded starting point for hydration: state and
    /// the version it is at, or the empty state at version 0.
    ///
    /// Best-effort by contract: a missing, unreadable, or corrupt
    /// snapshot falls back to full replay. A corrupt snapshot is also
    /// deleted so the next load does not trip over it again.
    pub(crate) async fn load_snapshot<A: Aggregate>(&self, stream_id: &StreamId) -> (A, i64) {
        let Some(snapshot_store) = &self.snapshot_store else {
            return (A::default(), 0);
        };

        let snapshot = match snapshot_store.load(stream_id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return (A::default(), 0),
            Err(err) => {
                tracing::warn!(stream = %stream_id, error = %err, "snapshot load failed, replaying from zero");
                return (A::default(), 0);
            }
        };

        match serde_json::from_value::<A>(snapshot.state.clone()) {
            Ok(state) => (state, snapshot.version),
            Err(err) => {
                tracing::warn!(
                    stream = %stream_id,
                    version = snapshot.version,
                    error = %err,
                    "corrupt snapshot discarded, replaying from zero"
                );
                if let Err(delete_err) = snapshot_store.delete(stream_id).await {
                    tracing::warn!(stream = %stream_id, error = %delete_err, "failed to delete corrupt snapshot");
                }
                (A::default(), 0)
            }
        }
    }

    /// Saves a snapshot of `state` at `version`. Best-effort: failures
    /// are logged and swallowed, never failing the command that
    /// triggered the save.
    pub(crate) async fn save_snapshot<A: Aggregate>(
        &self,
        stream_id: &StreamId,
        version: i64,
        state: &A,
    ) {
        let Some(snapshot_store) = &self.snapshot_store else {
            return;
        };

        let serialized = match serde_json::to_value(state) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(stream = %stream_id, error = %err, "snapshot serialization failed");
                return;
            }
        };

        let snapshot = Snapshot {
            stream_id: stream_id.clone(),
            version,
            state: serialized,
        };

        if let Err(err) = snapshot_store.save(snapshot).await {
            tracing::warn!(stream = %stream_id, version, error = %err, "snapshot save failed");
        } else {
            tracing::debug!(stream = %stream_id, version, "snapshot saved");
        }
    }

    /// Reads the stream forward from `from_version`, retrying transient
    /// store failures.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` once retries are exhausted.
    pub(crate) async fn read_events(
        &self,
        stream_id: &StreamId,
        from_version: i64,
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        retry::with_backoff("read_stream", || {
            self.event_store.read_stream(stream_id, from_version)
        })
        .await
    }

    /// Appends a commit with an expected-version guard, retrying
    /// transient store failures. The envelopes carry one commit id, so
    /// an I/O retry that raced its own earlier success is a no-op.
    ///
    /// # Errors
    ///
    /// `ConcurrencyConflict` if the guard fails; `StoreUnavailable` once
    /// retries are exhausted.
    pub(crate) async fn append_events(
        &self,
        stream_id: &StreamId,
        expected: ExpectedVersion,
        events: &[EventEnvelope],
    ) -> Result<i64, DomainError> {
        retry::with_backoff("append", || {
            self.event_store.append(stream_id, expected, events.to_vec())
        })
        .await
    }
}
