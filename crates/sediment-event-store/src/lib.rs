//! Sediment Event Store — SQL implementations of the storage contracts.
//!
//! Backed by SQLite through `sqlx`, so the full contract — transactional
//! all-or-nothing append, expected-version checks, commit-id idempotency
//! — runs in-process. The schema is plain SQL; porting to a server
//! database is a connection-string and type-mapping change.

pub mod schema;
pub mod sql_event_store;
pub mod sql_snapshot_store;

pub use sql_event_store::SqlEventStore;
pub use sql_snapshot_store::SqlSnapshotStore;
