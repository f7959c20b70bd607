//! Event stream codec.
//!
//! Converts domain events to and from persisted envelopes. Encoding
//! assigns contiguous stream positions and stamps metadata; decoding
//! routes on the envelope's type tag and fails loudly on tags no decoder
//! knows.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::envelope::EventEnvelope;
use crate::error::DomainError;
use crate::event::{EventMetadata, EventPayload};
use crate::stream::StreamId;

/// Inputs shared by every envelope of one commit.
#[derive(Debug, Clone)]
pub struct EncodeContext {
    /// Idempotency token for the whole commit.
    pub commit_id: Uuid,
    /// Correlation ID stamped on every event.
    pub correlation_id: Uuid,
    /// Causation ID stamped on every event.
    pub causation_id: Uuid,
    /// Acting subject, if known.
    pub actor: Option<String>,
    /// Timestamp stamped on every event.
    pub occurred_at: DateTime<Utc>,
}

/// Encodes raised events into envelopes positioned directly after
/// `base_version` (the aggregate's version before the commit).
///
/// # Errors
///
/// `Serialization` if a payload cannot be serialized.
#[allow(clippy::cast_possible_wrap)]
pub fn encode_all<E: EventPayload>(
    stream_id: &StreamId,
    base_version: i64,
    ctx: &EncodeContext,
    events: &[E],
) -> Result<Vec<EventEnvelope>, DomainError> {
    let mut envelopes = Vec::with_capacity(events.len());

    for (offset, event) in events.iter().enumerate() {
        let payload = serde_json::to_value(event)?;

        envelopes.push(EventEnvelope {
            stream_id: stream_id.clone(),
            stream_position: base_version + offset as i64,
            event_type: event.event_type().to_owned(),
            payload,
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                correlation_id: ctx.correlation_id,
                causation_id: ctx.causation_id,
                actor: ctx.actor.clone(),
                occurred_at: ctx.occurred_at,
            },
            commit_id: ctx.commit_id,
        });
    }

    Ok(envelopes)
}

/// Decodes one envelope back into a domain event.
///
/// # Errors
///
/// `UnknownEventType` if the envelope's tag is not one of `E`'s known
/// tags; `Serialization` if a known tag's payload is malformed.
pub fn decode<E: EventPayload>(envelope: &EventEnvelope) -> Result<E, DomainError> {
    if !E::event_types().contains(&envelope.event_type.as_str()) {
        return Err(DomainError::UnknownEventType {
            stream_id: envelope.stream_id.clone(),
            stream_position: envelope.stream_position,
            event_type: envelope.event_type.clone(),
        });
    }

    Ok(serde_json::from_value(envelope.payload.clone())?)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum TestEvent {
        Opened { balance: i64 },
        Closed,
    }

    impl EventPayload for TestEvent {
        fn event_type(&self) -> &'static str {
            match self {
                Self::Opened { .. } => "opened",
                Self::Closed => "closed",
            }
        }

        fn event_types() -> &'static [&'static str] {
            &["opened", "closed"]
        }
    }

    fn encode_ctx() -> EncodeContext {
        EncodeContext {
            commit_id: Uuid::new_v4(),
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            actor: Some("tester".to_owned()),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_encode_assigns_contiguous_positions_after_base_version() {
        let stream = StreamId::new("account-1");
        let events = vec![TestEvent::Opened { balance: 10 }, TestEvent::Closed];

        let envelopes = encode_all(&stream, 4, &encode_ctx(), &events).unwrap();

        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[0].stream_position, 4);
        assert_eq!(envelopes[1].stream_position, 5);
        assert_eq!(envelopes[0].event_type, "opened");
        assert_eq!(envelopes[1].event_type, "closed");
    }

    #[test]
    fn test_encode_shares_commit_id_and_metadata_across_the_commit() {
        let stream = StreamId::new("account-1");
        let ctx = encode_ctx();
        let events = vec![TestEvent::Opened { balance: 10 }, TestEvent::Closed];

        let envelopes = encode_all(&stream, 0, &ctx, &events).unwrap();

        assert_eq!(envelopes[0].commit_id, ctx.commit_id);
        assert_eq!(envelopes[1].commit_id, ctx.commit_id);
        assert_eq!(envelopes[0].metadata.correlation_id, ctx.correlation_id);
        assert_eq!(envelopes[1].metadata.causation_id, ctx.causation_id);
        assert_eq!(envelopes[0].metadata.actor.as_deref(), Some("tester"));
        // Event ids are unique per event, not per commit.
        assert_ne!(envelopes[0].metadata.event_id, envelopes[1].metadata.event_id);
    }

    #[test]
    fn test_decode_round_trips_a_known_event() {
        let stream = StreamId::new("account-1");
        let events = vec![TestEvent::Opened { balance: 10 }];
        let envelopes = encode_all(&stream, 0, &encode_ctx(), &events).unwrap();

        let decoded: TestEvent = decode(&envelopes[0]).unwrap();

        assert_eq!(decoded, TestEvent::Opened { balance: 10 });
    }

    #[test]
    fn test_decode_fails_loudly_on_unknown_tag() {
        let stream = StreamId::new("account-1");
        let events = vec![TestEvent::Closed];
        let mut envelopes = encode_all(&stream, 7, &encode_ctx(), &events).unwrap();
        envelopes[0].event_type = "reopened".to_owned();

        let err = decode::<TestEvent>(&envelopes[0]).unwrap_err();

        match err {
            DomainError::UnknownEventType {
                stream_id,
                stream_position,
                event_type,
            } => {
                assert_eq!(stream_id, stream);
                assert_eq!(stream_position, 7);
                assert_eq!(event_type, "reopened");
            }
            other => panic!("expected UnknownEventType, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_reports_malformed_known_payload_as_serialization_error() {
        let stream = StreamId::new("account-1");
        let events = vec![TestEvent::Opened { balance: 10 }];
        let mut envelopes = encode_all(&stream, 0, &encode_ctx(), &events).unwrap();
        envelopes[0].payload = serde_json::json!({ "type": "opened", "balance": "ten" });

        let err = decode::<TestEvent>(&envelopes[0]).unwrap_err();

        assert!(matches!(err, DomainError::Serialization(_)));
    }
}
