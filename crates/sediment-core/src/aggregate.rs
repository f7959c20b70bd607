//! Aggregate abstraction.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::DomainError;
use crate::event::EventPayload;

/// A consistency boundary: one id, one version counter, one stream.
///
/// Implementations are pure state: `Default` is the empty state at
/// version 0, `apply` is a deterministic fold over events with no side
/// effects and no I/O, and `handle` validates a command against current
/// state and raises zero or more new events without mutating anything.
/// The serde bounds exist so state can be snapshotted; replaying events
/// past a snapshot must reproduce the same state as replaying from zero.
pub trait Aggregate:
    Default + Serialize + DeserializeOwned + Send + Sync + std::fmt::Debug + 'static
{
    /// The command type this aggregate accepts.
    type Command: Send + Sync + std::fmt::Debug + 'static;

    /// The event type this aggregate produces and consumes.
    type Event: EventPayload;

    /// Stable type tag, used as the stream-name prefix and the command
    /// bus routing key.
    fn kind() -> &'static str;

    /// Folds one event into state. Must be deterministic.
    fn apply(&mut self, event: &Self::Event);

    /// Validates `command` against current state and raises new events.
    ///
    /// # Errors
    ///
    /// `Validation` when business rules reject the command. Never
    /// retried; surfaced verbatim to the caller.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, DomainError>;
}
