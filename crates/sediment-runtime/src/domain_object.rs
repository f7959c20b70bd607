//! Domain object: a live, version-consistent aggregate instance.

use std::sync::Arc;

use uuid::Uuid;

use sediment_core::aggregate::Aggregate;
use sediment_core::clock::Clock;
use sediment_core::codec::{self, EncodeContext};
use sediment_core::command::{CommandContext, CommandOutcome};
use sediment_core::error::DomainError;
use sediment_core::store::ExpectedVersion;
use sediment_core::stream::StreamId;

use crate::persistence::PersistenceBinding;

/// When to persist a snapshot after a successful commit.
///
/// Purely a replay-cost tunable: every policy yields identical
/// observable behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotPolicy {
    /// Never snapshot.
    Never,
    /// Snapshot whenever a commit reaches or crosses a multiple of `n`.
    EveryN(u32),
}

impl SnapshotPolicy {
    /// Whether a commit that moved the stream from `old_version` to
    /// `new_version` should trigger a snapshot.
    #[must_use]
    pub fn should_snapshot(self, old_version: i64, new_version: i64) -> bool {
        match self {
            Self::Never => false,
            Self::EveryN(n) => {
                let n = i64::from(n);
                n > 0 && old_version / n < new_version / n
            }
        }
    }
}

/// An aggregate instance bound to its stream: hydrates from snapshot
/// plus events, applies one command at a time, and commits raised events
/// under an expected-version guard.
///
/// Domain objects are per-request values, never shared across tasks.
/// Durable truth lives in the store; an object may be dropped and
/// recreated at any point.
pub struct DomainObject<A: Aggregate> {
    id: Uuid,
    stream_id: StreamId,
    persistence: PersistenceBinding,
    snapshot_policy: SnapshotPolicy,
    clock: Arc<dyn Clock>,
    state: A,
    version: i64,
}

impl<A: Aggregate> DomainObject<A> {
    /// Full rehydrate-and-retry attempts after the initial one when an
    /// append loses an optimistic-concurrency race.
    pub const MAX_CONFLICT_RETRIES: u32 = 5;

    /// Creates an unhydrated object at version 0 with empty state.
    #[must_use]
    pub fn new(
        id: Uuid,
        persistence: PersistenceBinding,
        snapshot_policy: SnapshotPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id,
            stream_id: StreamId::for_aggregate(A::kind(), id),
            persistence,
            snapshot_policy,
            clock,
            state: A::default(),
            version: 0,
        }
    }

    /// Returns the aggregate identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the stream this object is bound to.
    #[must_use]
    pub fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    /// Returns the number of events folded into the current state.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns the current in-memory state.
    #[must_use]
    pub fn state(&self) -> &A {
        &self.state
    }

    /// Brings state up to date with the stream: seeds from a snapshot on
    /// first hydration, then replays events from the current version
    /// forward. Calling this again after a lost race catches up with
    /// just the events committed by the winners.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the stream cannot be read;
    /// `UnknownEventType`/`Serialization` if replay hits an undecodable
    /// event.
    pub async fn hydrate(&mut self) -> Result<(), DomainError> {
        if self.version == 0 {
            let (state, version) = self.persistence.load_snapshot::<A>(&self.stream_id).await;
            self.state = state;
            self.version = version;
        }

        let envelopes = self
            .persistence
            .read_events(&self.stream_id, self.version)
            .await?;

        for envelope in &envelopes {
            let event = codec::decode::<A::Event>(envelope)?;
            self.state.apply(&event);
            self.version += 1;
        }

        tracing::debug!(stream = %self.stream_id, version = self.version, "hydrated");
        Ok(())
    }

    /// Applies one command: hydrate, validate, append raised events with
    /// an expected-version guard, and retry the whole cycle on lost
    /// races up to [`Self::MAX_CONFLICT_RETRIES`] times.
    ///
    /// Everything before the append is pure in-memory work, so an
    /// execution dropped before that point has no side effects.
    ///
    /// # Errors
    ///
    /// `Validation` verbatim from the aggregate; `ConcurrencyConflict`
    /// when the caller pinned a version that no longer holds, or when
    /// retries are exhausted; `StoreUnavailable` when the store stays
    /// down past the I/O retry budget.
    pub async fn execute(
        &mut self,
        command: &A::Command,
        ctx: &CommandContext,
    ) -> Result<CommandOutcome, DomainError> {
        let mut conflicts = 0;

        loop {
            self.hydrate().await?;

            if let Some(pinned) = ctx.expected_version
                && pinned != self.version
            {
                // The caller asked for an explicit check; their stale
                // view is not ours to retry away.
                return Err(DomainError::ConcurrencyConflict {
                    stream_id: self.stream_id.clone(),
                    expected: pinned,
                    actual: self.version,
                });
            }

            let events = self.state.handle(command)?;
            if events.is_empty() {
                return Ok(CommandOutcome {
                    stream_id: self.stream_id.clone(),
                    new_version: self.version,
                    events: vec![],
                });
            }

            let encode_ctx = EncodeContext {
                commit_id: Uuid::new_v4(),
                correlation_id: ctx.correlation_id,
                causation_id: ctx.causation_id,
                actor: ctx.actor.clone(),
                occurred_at: self.clock.now(),
            };
            let envelopes = codec::encode_all(&self.stream_id, self.version, &encode_ctx, &events)?;

            match self
                .persistence
                .append_events(&self.stream_id, ExpectedVersion::Exact(self.version), &envelopes)
                .await
            {
                Ok(new_version) => {
                    let old_version = self.version;
                    for event in &events {
                        self.state.apply(event);
                    }
                    self.version = new_version;

                    if self.snapshot_policy.should_snapshot(old_version, new_version) {
                        self.persistence
                            .save_snapshot(&self.stream_id, new_version, &self.state)
                            .await;
                    }

                    tracing::debug!(
                        stream = %self.stream_id,
                        new_version,
                        events = envelopes.len(),
                        "command committed"
                    );
                    return Ok(CommandOutcome {
                        stream_id: self.stream_id.clone(),
                        new_version,
                        events: envelopes,
                    });
                }
                Err(DomainError::ConcurrencyConflict { actual, .. })
                    if conflicts < Self::MAX_CONFLICT_RETRIES =>
                {
                    conflicts += 1;
                    tracing::debug!(
                        stream = %self.stream_id,
                        observed = self.version,
                        actual,
                        retry = conflicts,
                        "lost optimistic race, rehydrating"
                    );
                    // Loop: catch up past the winner's events and apply
                    // the command against fresh state.
                }
                Err(err) => return Err(err),
            }
        }
    }
}
