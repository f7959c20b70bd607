//! Domain object factory.
//!
//! Constructs aggregate instances from an identifier and a persistence
//! binding, decoupling aggregate types from their storage wiring. The
//! factory owns construction only, never lifecycle: objects are
//! per-request values.

use std::sync::Arc;

use uuid::Uuid;

use sediment_core::aggregate::Aggregate;
use sediment_core::clock::{Clock, SystemClock};

use crate::domain_object::{DomainObject, SnapshotPolicy};
use crate::persistence::PersistenceBinding;

/// Polymorphic factory for domain objects. Built once at startup and
/// shared by reference; any type implementing [`Aggregate`] can be
/// constructed without the factory knowing it ahead of time.
#[derive(Clone)]
pub struct DomainObjectFactory {
    binding: PersistenceBinding,
    snapshot_policy: SnapshotPolicy,
    clock: Arc<dyn Clock>,
}

impl DomainObjectFactory {
    /// Default snapshot cadence when none is configured.
    pub const DEFAULT_SNAPSHOT_EVERY: u32 = 100;

    /// Creates a factory over the default persistence binding, with the
    /// system clock and the default snapshot cadence.
    #[must_use]
    pub fn new(binding: PersistenceBinding) -> Self {
        Self {
            binding,
            snapshot_policy: SnapshotPolicy::EveryN(Self::DEFAULT_SNAPSHOT_EVERY),
            clock: Arc::new(SystemClock),
        }
    }

    /// Overrides the snapshot cadence.
    #[must_use]
    pub fn with_snapshot_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.snapshot_policy = policy;
        self
    }

    /// Overrides the clock (deterministic timestamps in tests).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Constructs a domain object for aggregate `A` with identifier
    /// `id`, bound to the factory's default persistence.
    #[must_use]
    pub fn create<A: Aggregate>(&self, id: Uuid) -> DomainObject<A> {
        self.create_with(id, self.binding.clone())
    }

    /// Constructs a domain object bound to a caller-supplied persistence
    /// binding (a different stream/snapshot backing than the default).
    #[must_use]
    pub fn create_with<A: Aggregate>(
        &self,
        id: Uuid,
        binding: PersistenceBinding,
    ) -> DomainObject<A> {
        DomainObject::new(id, binding, self.snapshot_policy, Arc::clone(&self.clock))
    }
}
