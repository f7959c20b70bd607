//! Kernel error types.

use thiserror::Error;

use crate::stream::StreamId;

/// Top-level error type for the event-sourcing kernel.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Optimistic concurrency conflict at append time.
    ///
    /// Carries the stream's actual version so the caller can rehydrate
    /// and retry against fresh state.
    #[error("concurrency conflict on stream {stream_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The stream that had the conflict.
        stream_id: StreamId,
        /// The version the caller expected.
        expected: i64,
        /// The version the stream actually had.
        actual: i64,
    },

    /// Command rejected by aggregate business rules. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Transient I/O failure from the backing store.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The factory or bus cannot construct the requested aggregate type.
    /// A configuration-level bug, never retried.
    #[error("unsupported aggregate type: {0}")]
    UnsupportedType(String),

    /// An event in a stream carries a type tag no decoder knows.
    /// Replay fails loudly rather than silently skipping history.
    #[error("unknown event type {event_type:?} at position {stream_position} of stream {stream_id}")]
    UnknownEventType {
        /// The stream holding the event.
        stream_id: StreamId,
        /// The position of the undecodable event.
        stream_position: i64,
        /// The unrecognized type tag.
        event_type: String,
    },

    /// A snapshot could not be deserialized. Recovered locally by
    /// discarding the snapshot and replaying from version 0.
    #[error("corrupt snapshot for stream {stream_id} at version {version}")]
    SnapshotCorrupt {
        /// The stream whose snapshot is unreadable.
        stream_id: StreamId,
        /// The version the snapshot claims to be at.
        version: i64,
    },

    /// Event payload or state serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true for failures that are worth retrying at the
    /// store-client layer (transient I/O, not logic errors).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
