//! Event store abstraction.
//!
//! The store is the single source of truth and the only shared mutable
//! resource in the kernel. Implementations must provide an atomic
//! conditional append (all-or-nothing, expected-version checked) and an
//! ordered, gapless read of each stream.

use async_trait::async_trait;

use crate::envelope::{CommittedEvent, EventEnvelope};
use crate::error::DomainError;
use crate::stream::StreamId;

/// Expected stream version supplied to an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Append unconditionally, whatever the stream's version is.
    Any,
    /// The stream must be at exactly this version (= event count).
    /// `Exact(0)` means the stream must not exist yet.
    Exact(i64),
}

impl ExpectedVersion {
    /// Whether `actual` satisfies this expectation.
    #[must_use]
    pub fn matches(self, actual: i64) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == actual,
        }
    }

    /// The expected version as a raw number, using `-1` as the
    /// conventional sentinel for `Any`.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Any => -1,
            Self::Exact(expected) => expected,
        }
    }
}

/// Durable, ordered, append-only log of events keyed by stream id.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Atomically appends `events` to `stream_id` and returns the new
    /// stream version.
    ///
    /// Either all events become durably visible to subsequent reads or
    /// none do. The store assigns final stream positions at commit time;
    /// under an `Exact` expectation these equal the positions the codec
    /// encoded. The envelopes' shared `commit_id` is the idempotency
    /// token, scoped to one logical commit: replaying a commit the
    /// stream already recorded (same id, same encoded base version) is a
    /// no-op success reporting the version the original produced, while
    /// the same id encoded against a different version appends normally.
    ///
    /// # Errors
    ///
    /// `ConcurrencyConflict` (with the actual version) if `expected` does
    /// not hold; `StoreUnavailable` on transient I/O failure.
    async fn append(
        &self,
        stream_id: &StreamId,
        expected: ExpectedVersion,
        events: Vec<EventEnvelope>,
    ) -> Result<i64, DomainError>;

    /// Reads a stream forward from `from_version`, ordered by stream
    /// position with no gaps. Each call starts fresh; the result is
    /// finite.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` on transient I/O failure.
    async fn read_stream(
        &self,
        stream_id: &StreamId,
        from_version: i64,
    ) -> Result<Vec<EventEnvelope>, DomainError>;

    /// Reads the store-wide log forward from `from_position`, across all
    /// streams, for external projections.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` on transient I/O failure.
    async fn read_all(&self, from_position: i64) -> Result<Vec<CommittedEvent>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_matches_every_version() {
        assert!(ExpectedVersion::Any.matches(0));
        assert!(ExpectedVersion::Any.matches(42));
    }

    #[test]
    fn test_exact_matches_only_its_version() {
        assert!(ExpectedVersion::Exact(3).matches(3));
        assert!(!ExpectedVersion::Exact(3).matches(4));
        assert!(!ExpectedVersion::Exact(3).matches(0));
    }

    #[test]
    fn test_any_uses_negative_one_sentinel() {
        assert_eq!(ExpectedVersion::Any.as_i64(), -1);
        assert_eq!(ExpectedVersion::Exact(7).as_i64(), 7);
    }
}
