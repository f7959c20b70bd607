//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Metadata attached to every persisted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Causation ID linking this event to the command/event that caused it.
    pub causation_id: Uuid,
    /// The subject that issued the causing command, if known.
    pub actor: Option<String>,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// Trait implemented by every domain event type.
///
/// Events are plain serde values; the type tag routes deserialization when
/// a stream holds many event kinds. Implementations are usually enums with
/// one variant per event kind.
pub trait EventPayload:
    Serialize + DeserializeOwned + Send + Sync + std::fmt::Debug + Clone
{
    /// Returns the event type tag (used for serialization routing).
    fn event_type(&self) -> &'static str;

    /// Returns every type tag this payload can decode. Replay checks an
    /// envelope's tag against this set before deserializing so an
    /// unknown tag fails loudly instead of as a generic parse error.
    fn event_types() -> &'static [&'static str];
}
