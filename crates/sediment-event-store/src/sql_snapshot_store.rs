//! SQL implementation of the `SnapshotStore` trait.

use async_trait::async_trait;
use sqlx::SqlitePool;

use sediment_core::error::DomainError;
use sediment_core::snapshot::{Snapshot, SnapshotStore};
use sediment_core::stream::StreamId;

/// SQL-backed snapshot store. One row per stream, newest snapshot wins.
#[derive(Debug, Clone)]
pub struct SqlSnapshotStore {
    pool: SqlitePool,
}

impl SqlSnapshotStore {
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

#[async_trait]
impl SnapshotStore for SqlSnapshotStore {
    async fn save(&self, snapshot: Snapshot) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO snapshots (stream_id, version, state) VALUES (?1, ?2, ?3)
             ON CONFLICT (stream_id) DO UPDATE SET version = excluded.version, state = excluded.state",
        )
        .bind(snapshot.stream_id.as_str())
        .bind(snapshot.version)
        .bind(serde_json::to_string(&snapshot.state)?)
        .execute(&self.pool)
        .await
        .map_err(transient)?;

        Ok(())
    }

    async fn load(&self, stream_id: &StreamId) -> Result<Option<Snapshot>, DomainError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT version, state FROM snapshots WHERE stream_id = ?1")
                .bind(stream_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(transient)?;

        row.map(|(version, state)| {
            Ok(Snapshot {
                stream_id: stream_id.clone(),
                version,
                state: serde_json::from_str(&state)?,
            })
        })
        .transpose()
    }

    async fn delete(&self, stream_id: &StreamId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM snapshots WHERE stream_id = ?1")
            .bind(stream_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(transient)?;

        Ok(())
    }
}
