//! In-memory `EventStore` implementations for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use sediment_core::envelope::{CommittedEvent, EventEnvelope};
use sediment_core::error::DomainError;
use sediment_core::store::{EventStore, ExpectedVersion};
use sediment_core::stream::StreamId;

#[derive(Debug, Default)]
struct StreamData {
    events: Vec<EventEnvelope>,
    /// Commit id -> (version the commit was encoded against, version it
    /// produced). The base scopes the token to one logical commit.
    commits: HashMap<Uuid, (i64, i64)>,
}

#[derive(Debug, Default)]
struct Inner {
    streams: HashMap<StreamId, StreamData>,
    /// Store-wide log; index is the global position.
    log: Vec<EventEnvelope>,
}

/// A full-contract in-memory event store: atomic conditional append,
/// commit-id idempotency, ordered stream reads, and a store-wide log.
///
/// The mutex is held only for synchronous map work, never across an
/// await point.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: Mutex<Inner>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current version (event count) of a stream.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn stream_version(&self, stream_id: &StreamId) -> i64 {
        let inner = self.inner.lock().unwrap();
        inner
            .streams
            .get(stream_id)
            .map_or(0, |s| s.events.len() as i64)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    #[allow(clippy::cast_possible_wrap)]
    async fn append(
        &self,
        stream_id: &StreamId,
        expected: ExpectedVersion,
        events: Vec<EventEnvelope>,
    ) -> Result<i64, DomainError> {
        let mut inner = self.inner.lock().unwrap();
        let stream = inner.streams.entry(stream_id.clone()).or_default();
        let actual = stream.events.len() as i64;

        // A replayed commit already won whatever race it was in. The
        // same commit id re-encoded against a later version is a fresh
        // commit, not a replay, so it falls through to a normal append.
        if let Some(first) = events.first()
            && let Some(&(base_version, new_version)) = stream.commits.get(&first.commit_id)
            && base_version == first.stream_position
        {
            return Ok(new_version);
        }

        if !expected.matches(actual) {
            return Err(DomainError::ConcurrencyConflict {
                stream_id: stream_id.clone(),
                expected: expected.as_i64(),
                actual,
            });
        }

        let new_version = actual + events.len() as i64;
        if let Some(first) = events.first() {
            stream
                .commits
                .insert(first.commit_id, (first.stream_position, new_version));
        }

        let mut committed = Vec::with_capacity(events.len());
        for (offset, mut envelope) in events.into_iter().enumerate() {
            // The store owns final positions; under an Exact expectation
            // these equal the encoder's.
            envelope.stream_position = actual + offset as i64;
            stream.events.push(envelope.clone());
            committed.push(envelope);
        }
        inner.log.extend(committed);

        Ok(new_version)
    }

    async fn read_stream(
        &self,
        stream_id: &StreamId,
        from_version: i64,
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.streams.get(stream_id).map_or_else(Vec::new, |s| {
            s.events
                .iter()
                .filter(|e| e.stream_position >= from_version)
                .cloned()
                .collect()
        }))
    }

    async fn read_all(&self, from_position: i64) -> Result<Vec<CommittedEvent>, DomainError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .log
            .iter()
            .enumerate()
            .map(|(position, envelope)| CommittedEvent {
                global_position: position as i64,
                envelope: envelope.clone(),
            })
            .filter(|c| c.global_position >= from_position)
            .collect())
    }
}

/// An event store that always fails with `StoreUnavailable`.
#[derive(Debug, Default)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn append(
        &self,
        _stream_id: &StreamId,
        _expected: ExpectedVersion,
        _events: Vec<EventEnvelope>,
    ) -> Result<i64, DomainError> {
        Err(DomainError::StoreUnavailable("connection refused".into()))
    }

    async fn read_stream(
        &self,
        _stream_id: &StreamId,
        _from_version: i64,
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        Err(DomainError::StoreUnavailable("connection refused".into()))
    }

    async fn read_all(&self, _from_position: i64) -> Result<Vec<CommittedEvent>, DomainError> {
        Err(DomainError::StoreUnavailable("connection refused".into()))
    }
}

/// A store that fails the next N calls with `StoreUnavailable`, then
/// delegates. Failures happen before any write, so a failed append
/// leaves the wrapped store untouched.
#[derive(Debug)]
pub struct FlakyEventStore<S> {
    inner: Arc<S>,
    failures_remaining: Mutex<u32>,
}

impl<S: EventStore> FlakyEventStore<S> {
    /// Wraps `inner`, failing the next `failures` calls.
    #[must_use]
    pub fn new(inner: Arc<S>, failures: u32) -> Self {
        Self {
            inner,
            failures_remaining: Mutex::new(failures),
        }
    }

    fn should_fail(&self) -> bool {
        let mut remaining = self.failures_remaining.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl<S: EventStore> EventStore for FlakyEventStore<S> {
    async fn append(
        &self,
        stream_id: &StreamId,
        expected: ExpectedVersion,
        events: Vec<EventEnvelope>,
    ) -> Result<i64, DomainError> {
        if self.should_fail() {
            return Err(DomainError::StoreUnavailable("simulated outage".into()));
        }
        self.inner.append(stream_id, expected, events).await
    }

    async fn read_stream(
        &self,
        stream_id: &StreamId,
        from_version: i64,
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        if self.should_fail() {
            return Err(DomainError::StoreUnavailable("simulated outage".into()));
        }
        self.inner.read_stream(stream_id, from_version).await
    }

    async fn read_all(&self, from_position: i64) -> Result<Vec<CommittedEvent>, DomainError> {
        if self.should_fail() {
            return Err(DomainError::StoreUnavailable("simulated outage".into()));
        }
        self.inner.read_all(from_position).await
    }
}
