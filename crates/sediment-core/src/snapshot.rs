//! Snapshot store abstraction.
//!
//! Snapshots are a pure replay-cost optimization: taking or discarding
//! one must never change observable aggregate behavior. The kernel is
//! fully correct, just slower, with snapshotting disabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::stream::StreamId;

/// Point-in-time serialized aggregate state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The stream this snapshot materializes.
    pub stream_id: StreamId,
    /// Number of events folded into `state`. Replay resumes from here.
    pub version: i64,
    /// Serialized aggregate state at `version`.
    pub state: serde_json::Value,
}

/// Optional key-value backing for snapshots.
///
/// Best-effort on both sides: a failed save must never fail a command,
/// and a failed or corrupt load must fall back to full replay.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Stores a snapshot, replacing any existing one for the stream.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` on I/O failure; callers treat this as a
    /// non-fatal condition.
    async fn save(&self, snapshot: Snapshot) -> Result<(), DomainError>;

    /// Loads the latest snapshot for a stream, if any.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` on I/O failure.
    async fn load(&self, stream_id: &StreamId) -> Result<Option<Snapshot>, DomainError>;

    /// Deletes the snapshot for a stream. Used after a corrupt snapshot
    /// has been bypassed so it is not retried on every load.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` on I/O failure.
    async fn delete(&self, stream_id: &StreamId) -> Result<(), DomainError>;
}
