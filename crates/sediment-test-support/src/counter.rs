//! Counter — a minimal fixture aggregate for kernel tests.

use serde::{Deserialize, Serialize};

use sediment_core::aggregate::Aggregate;
use sediment_core::error::DomainError;
use sediment_core::event::EventPayload;

/// A counter aggregate: state is a single running total.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// The running total.
    pub count: i64,
}

/// Commands accepted by [`Counter`].
#[derive(Debug, Clone)]
pub enum CounterCommand {
    /// Add `amount` to the total. Rejected unless `amount > 0`.
    Increment {
        /// The amount to add.
        amount: i64,
    },
    /// Reset the total to zero. Raises no events when already zero.
    Reset,
}

/// Events raised by [`Counter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CounterEvent {
    /// The total grew by `amount`.
    Incremented {
        /// The amount added.
        amount: i64,
    },
    /// The total was reset to zero.
    ResetPerformed,
}

impl EventPayload for CounterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Incremented { .. } => "counter.incremented",
            Self::ResetPerformed => "counter.reset_performed",
        }
    }

    fn event_types() -> &'static [&'static str] {
        &["counter.incremented", "counter.reset_performed"]
    }
}

impl Aggregate for Counter {
    type Command = CounterCommand;
    type Event = CounterEvent;

    fn kind() -> &'static str {
        "counter"
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CounterEvent::Incremented { amount } => self.count += amount,
            CounterEvent::ResetPerformed => self.count = 0,
        }
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, DomainError> {
        match command {
            CounterCommand::Increment { amount } => {
                if *amount <= 0 {
                    return Err(DomainError::Validation(
                        "increment amount must be positive".into(),
                    ));
                }
                Ok(vec![CounterEvent::Incremented { amount: *amount }])
            }
            CounterCommand::Reset => {
                if self.count == 0 {
                    Ok(vec![])
                } else {
                    Ok(vec![CounterEvent::ResetPerformed])
                }
            }
        }
    }
}
