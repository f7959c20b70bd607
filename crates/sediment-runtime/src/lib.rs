//! Sediment Runtime — aggregate hydration, command application, and
//! dispatch.
//!
//! This crate turns the storage contracts from `sediment-core` into a
//! working kernel: `DomainObject` rebuilds aggregate state from a
//! snapshot plus subsequent events and applies commands under optimistic
//! concurrency; `DomainObjectFactory` wires aggregates to their
//! persistence; `CommandBus` routes type-erased commands to registered
//! aggregate kinds.

pub mod bus;
pub mod domain_object;
pub mod factory;
pub mod persistence;
pub mod retry;

pub use bus::{CommandBus, CommandBusBuilder};
pub use domain_object::{DomainObject, SnapshotPolicy};
pub use factory::DomainObjectFactory;
pub use persistence::PersistenceBinding;
