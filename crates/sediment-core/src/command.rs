//! Command inputs and results.

use uuid::Uuid;

use crate::envelope::EventEnvelope;
use crate::stream::StreamId;

/// Caller-supplied context for one command submission.
///
/// Commands themselves are aggregate-specific values; this carries the
/// cross-cutting inputs every submission has: tracing ids, attribution,
/// and an optional explicit concurrency check.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Correlation ID tracing the command through its effects.
    pub correlation_id: Uuid,
    /// Causation ID stamped on raised events. Defaults to the
    /// correlation id for externally-issued commands.
    pub causation_id: Uuid,
    /// The subject issuing the command, if known.
    pub actor: Option<String>,
    /// When set, the aggregate must be at exactly this version before
    /// the command runs. A mismatch is a definitive conflict, surfaced
    /// without retries — the caller asked for the check.
    pub expected_version: Option<i64>,
}

impl CommandContext {
    /// Creates a context with a fresh correlation id.
    #[must_use]
    pub fn new() -> Self {
        let correlation_id = Uuid::new_v4();
        Self {
            correlation_id,
            causation_id: correlation_id,
            actor: None,
            expected_version: None,
        }
    }

    /// Sets the acting subject.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Pins the version the caller observed.
    #[must_use]
    pub fn with_expected_version(mut self, version: i64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Successful result of a command: the committed events and the
/// aggregate's version after them. Transient; never persisted.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// The stream the command wrote to (or would have written to, for
    /// commands that raised no events).
    pub stream_id: StreamId,
    /// Aggregate version after the commit.
    pub new_version: i64,
    /// The envelopes appended by this command. Empty when the command
    /// was valid but changed nothing.
    pub events: Vec<EventEnvelope>,
}
