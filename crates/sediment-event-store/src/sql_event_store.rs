//! SQL implementation of the `EventStore` trait.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use sediment_core::envelope::{CommittedEvent, EventEnvelope};
use sediment_core::error::DomainError;
use sediment_core::event::EventMetadata;
use sediment_core::store::{EventStore, ExpectedVersion};
use sediment_core::stream::StreamId;

/// SQL-backed event store.
///
/// Appends run in a transaction: the idempotency lookup, the version
/// check, the event inserts, and the commit record all land or none do.
#[derive(Debug, Clone)]
pub struct SqlEventStore {
    pool: SqlitePool,
}

impl SqlEventStore {
    /// Creates a store over an existing pool. The schema must already be
    /// applied (see [`crate::schema::apply`]).
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn transient(err: sqlx::Error) -> DomainError {
    DomainError::StoreUnavailable(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn row_to_envelope(
    stream_id: StreamId,
    stream_position: i64,
    event_type: String,
    payload: String,
    metadata: String,
    commit_id: String,
) -> Result<EventEnvelope, DomainError> {
    let payload: serde_json::Value = serde_json::from_str(&payload)?;
    let metadata: EventMetadata = serde_json::from_str(&metadata)?;
    let commit_id = Uuid::parse_str(&commit_id)
        .map_err(|e| DomainError::StoreUnavailable(format!("unreadable commit id: {e}")))?;

    Ok(EventEnvelope {
        stream_id,
        stream_position,
        event_type,
        payload,
        metadata,
        commit_id,
    })
}

#[async_trait]
impl EventStore for SqlEventStore {
    #[allow(clippy::cast_possible_wrap)]
    async fn append(
        &self,
        stream_id: &StreamId,
        expected: ExpectedVersion,
        events: Vec<EventEnvelope>,
    ) -> Result<i64, DomainError> {
        let mut tx = self.pool.begin().await.map_err(transient)?;

        // A replay carries the same envelopes, so the first event's
        // position identifies the logical commit along with the commit
        // id. The same id re-encoded against a later version is a fresh
        // commit and appends normally.
        if let Some(first) = events.first() {
            let recorded: Option<(i64, i64)> = sqlx::query_as(
                "SELECT base_version, new_version FROM stream_commits
                 WHERE stream_id = ?1 AND commit_id = ?2",
            )
            .bind(stream_id.as_str())
            .bind(first.commit_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(transient)?;

            if let Some((base_version, new_version)) = recorded
                && base_version == first.stream_position
            {
                tracing::debug!(
                    stream = %stream_id,
                    commit_id = %first.commit_id,
                    new_version,
                    "duplicate commit replay, no-op"
                );
                return Ok(new_version);
            }
        }

        let actual: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE stream_id = ?1")
            .bind(stream_id.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(transient)?;

        if !expected.matches(actual) {
            return Err(DomainError::ConcurrencyConflict {
                stream_id: stream_id.clone(),
                expected: expected.as_i64(),
                actual,
            });
        }

        for (offset, envelope) in events.iter().enumerate() {
            let insert = sqlx::query(
                "INSERT INTO events (stream_id, stream_position, event_type, payload, metadata, commit_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(stream_id.as_str())
            .bind(actual + offset as i64)
            .bind(&envelope.event_type)
            .bind(serde_json::to_string(&envelope.payload)?)
            .bind(serde_json::to_string(&envelope.metadata)?)
            .bind(envelope.commit_id.to_string())
            .execute(&mut *tx)
            .await;

            if let Err(err) = insert {
                if is_unique_violation(&err) {
                    // A racing writer took this position between our
                    // version check and the insert. Roll back and report
                    // the stream's real version.
                    drop(tx);
                    let current: i64 =
                        sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE stream_id = ?1")
                            .bind(stream_id.as_str())
                            .fetch_one(&self.pool)
                            .await
                            .map_err(transient)?;
                    return Err(DomainError::ConcurrencyConflict {
                        stream_id: stream_id.clone(),
                        expected: expected.as_i64(),
                        actual: current,
                    });
                }
                return Err(transient(err));
            }
        }

        let new_version = actual + events.len() as i64;

        if let Some(first) = events.first() {
            sqlx::query(
                "INSERT INTO stream_commits (stream_id, commit_id, base_version, new_version)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (stream_id, commit_id) DO UPDATE
                 SET base_version = excluded.base_version,
                     new_version = excluded.new_version",
            )
            .bind(stream_id.as_str())
            .bind(first.commit_id.to_string())
            .bind(first.stream_position)
            .bind(new_version)
            .execute(&mut *tx)
            .await
            .map_err(transient)?;
        }

        tx.commit().await.map_err(transient)?;

        tracing::debug!(stream = %stream_id, new_version, events = new_version - actual, "commit appended");
        Ok(new_version)
    }

    async fn read_stream(
        &self,
        stream_id: &StreamId,
        from_version: i64,
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let rows: Vec<(i64, String, String, String, String)> = sqlx::query_as(
            "SELECT stream_position, event_type, payload, metadata, commit_id
             FROM events
             WHERE stream_id = ?1 AND stream_position >= ?2
             ORDER BY stream_position",
        )
        .bind(stream_id.as_str())
        .bind(from_version)
        .fetch_all(&self.pool)
        .await
        .map_err(transient)?;

        rows.into_iter()
            .map(|(position, event_type, payload, metadata, commit_id)| {
                row_to_envelope(
                    stream_id.clone(),
                    position,
                    event_type,
                    payload,
                    metadata,
                    commit_id,
                )
            })
            .collect()
    }

    async fn read_all(&self, from_position: i64) -> Result<Vec<CommittedEvent>, DomainError> {
        let rows: Vec<(i64, String, i64, String, String, String, String)> = sqlx::query_as(
            "SELECT global_position, stream_id, stream_position, event_type, payload, metadata, commit_id
             FROM events
             WHERE global_position >= ?1
             ORDER BY global_position",
        )
        .bind(from_position)
        .fetch_all(&self.pool)
        .await
        .map_err(transient)?;

        rows.into_iter()
            .map(
                |(global, stream, position, event_type, payload, metadata, commit_id)| {
                    Ok(CommittedEvent {
                        global_position: global,
                        envelope: row_to_envelope(
                            StreamId::new(stream),
                            position,
                            event_type,
                            payload,
                            metadata,
                            commit_id,
                        )?,
                    })
                },
            )
            .collect()
    }
}
