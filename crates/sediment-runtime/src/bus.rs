//! Command bus: routes commands to registered aggregate kinds.
//!
//! The registry is built once at startup and passed by reference into
//! request handling; there is no ambient global state. Submissions
//! against distinct aggregate ids run fully concurrently — per-id
//! serialization happens at the store's version check, not behind a
//! local lock.

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use sediment_core::aggregate::Aggregate;
use sediment_core::command::{CommandContext, CommandOutcome};
use sediment_core::error::DomainError;

use crate::factory::DomainObjectFactory;

/// A command whose concrete type has been erased for routing.
type BoxedCommand = Box<dyn Any + Send>;

#[async_trait]
trait ErasedHandler: Send + Sync {
    async fn submit(
        &self,
        id: Uuid,
        command: BoxedCommand,
        ctx: CommandContext,
    ) -> Result<CommandOutcome, DomainError>;
}

/// Per-kind handler: constructs the aggregate via the factory and
/// drives it through hydrate-apply-commit.
struct AggregateHandler<A> {
    factory: Arc<DomainObjectFactory>,
    _marker: PhantomData<fn() -> A>,
}

#[async_trait]
impl<A: Aggregate> ErasedHandler for AggregateHandler<A> {
    async fn submit(
        &self,
        id: Uuid,
        command: BoxedCommand,
        ctx: CommandContext,
    ) -> Result<CommandOutcome, DomainError> {
        let command = command.downcast::<A::Command>().map_err(|_| {
            DomainError::UnsupportedType(format!(
                "command payload does not match aggregate kind {:?}",
                A::kind()
            ))
        })?;

        let mut object = self.factory.create::<A>(id);
        object.execute(&command, &ctx).await
    }
}

/// Builder for [`CommandBus`]; register every aggregate kind at process
/// start, then build.
pub struct CommandBusBuilder {
    factory: Arc<DomainObjectFactory>,
    handlers: HashMap<&'static str, Box<dyn ErasedHandler>>,
}

impl CommandBusBuilder {
    /// Creates a builder over a factory.
    #[must_use]
    pub fn new(factory: Arc<DomainObjectFactory>) -> Self {
        Self {
            factory,
            handlers: HashMap::new(),
        }
    }

    /// Registers aggregate kind `A` under its type tag.
    #[must_use]
    pub fn register<A: Aggregate>(mut self) -> Self {
        self.handlers.insert(
            A::kind(),
            Box::new(AggregateHandler::<A> {
                factory: Arc::clone(&self.factory),
                _marker: PhantomData,
            }),
        );
        self
    }

    /// Finalizes the registry.
    #[must_use]
    pub fn build(self) -> CommandBus {
        CommandBus {
            handlers: self.handlers,
        }
    }
}

/// Routes an incoming command to the correct aggregate instance and
/// returns the structured result.
pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn ErasedHandler>>,
}

impl CommandBus {
    /// Submits a command to aggregate `A` with identifier `id`.
    ///
    /// # Errors
    ///
    /// `UnsupportedType` if `A` was never registered; otherwise whatever
    /// the runtime surfaces (`Validation`, `ConcurrencyConflict`,
    /// `StoreUnavailable`).
    pub async fn submit<A: Aggregate>(
        &self,
        id: Uuid,
        command: A::Command,
        ctx: CommandContext,
    ) -> Result<CommandOutcome, DomainError> {
        self.submit_dyn(A::kind(), id, Box::new(command), ctx).await
    }

    /// Submits a type-erased command to the aggregate kind named by
    /// `kind` — the entry point for transports that resolve the target
    /// kind from a wire message.
    ///
    /// # Errors
    ///
    /// `UnsupportedType` if `kind` is not registered or the payload is
    /// not that kind's command type; otherwise as [`Self::submit`].
    pub async fn submit_dyn(
        &self,
        kind: &str,
        id: Uuid,
        command: BoxedCommand,
        ctx: CommandContext,
    ) -> Result<CommandOutcome, DomainError> {
        let handler = self.handlers.get(kind).ok_or_else(|| {
            DomainError::UnsupportedType(format!("no aggregate registered for kind {kind:?}"))
        })?;

        tracing::debug!(kind, %id, correlation = %ctx.correlation_id, "dispatching command");
        handler.submit(id, command, ctx).await
    }

    /// The aggregate kinds this bus can route to.
    #[must_use]
    pub fn registered_kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}
