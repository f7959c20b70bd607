//! Event store database schema.

use sediment_core::error::DomainError;
use sqlx::SqlitePool;

/// SQL to create the events table. `global_position` is the store-wide
/// order for projections; `(stream_id, stream_position)` is unique so a
/// racing writer that slipped past the version check still cannot fork
/// a stream.
pub const CREATE_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS events (
    global_position INTEGER PRIMARY KEY AUTOINCREMENT,
    stream_id       TEXT NOT NULL,
    stream_position INTEGER NOT NULL,
    event_type      TEXT NOT NULL,
    payload         TEXT NOT NULL,
    metadata        TEXT NOT NULL,
    commit_id       TEXT NOT NULL,
    UNIQUE (stream_id, stream_position)
);

CREATE INDEX IF NOT EXISTS idx_events_stream
    ON events (stream_id, stream_position);
";

/// SQL to create the commit-id idempotency table. One row per commit,
/// recording the version the commit was encoded against and the version
/// it produced, so a replayed append can be recognized (same base) and
/// report the original result.
pub const CREATE_STREAM_COMMITS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS stream_commits (
    stream_id    TEXT NOT NULL,
    commit_id    TEXT NOT NULL,
    base_version INTEGER NOT NULL,
    new_version  INTEGER NOT NULL,
    PRIMARY KEY (stream_id, commit_id)
);
";

/// SQL to create the snapshots table. At most one snapshot per stream.
pub const CREATE_SNAPSHOTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS snapshots (
    stream_id TEXT PRIMARY KEY,
    version   INTEGER NOT NULL,
    state     TEXT NOT NULL
);
";

/// Applies the full schema to a pool. Idempotent.
///
/// # Errors
///
/// `StoreUnavailable` if the database rejects the DDL.
pub async fn apply(pool: &SqlitePool) -> Result<(), DomainError> {
    for statement in [
        CREATE_EVENTS_TABLE,
        CREATE_STREAM_COMMITS_TABLE,
        CREATE_SNAPSHOTS_TABLE,
    ] {
        sqlx::raw_sql(statement)
            .execute(pool)
            .await
            .map_err(|e| DomainError::StoreUnavailable(e.to_string()))?;
    }
    Ok(())
}
