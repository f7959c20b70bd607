//! Persisted event envelopes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::EventMetadata;
use crate::stream::StreamId;

/// One persisted event, immutable once appended.
///
/// Ordering within a stream is the sole source of truth for aggregate
/// state; `stream_position` is 0-based and gapless within its stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// The stream this event belongs to.
    pub stream_id: StreamId,
    /// 0-based, gapless position within the stream.
    pub stream_position: i64,
    /// Event type tag for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Tracing and attribution metadata.
    pub metadata: EventMetadata,
    /// Idempotency token shared by all events of one commit.
    pub commit_id: Uuid,
}

/// An envelope read back through `read_all`, with its position in the
/// store-wide order. Cross-stream ordering is only meaningful for
/// projections; aggregate state never depends on it.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedEvent {
    /// Monotonic position in the store-wide log.
    pub global_position: i64,
    /// The persisted event.
    pub envelope: EventEnvelope,
}
