//! Shared test fakes and fixtures for the Sediment event-sourcing kernel.

mod clock;
mod counter;
mod memory_snapshot_store;
mod memory_store;

pub use clock::FixedClock;
pub use counter::{Counter, CounterCommand, CounterEvent};
pub use memory_snapshot_store::{FailingSnapshotStore, InMemorySnapshotStore};
pub use memory_store::{FailingEventStore, FlakyEventStore, InMemoryEventStore};

/// Initializes a plain-text tracing subscriber honoring `RUST_LOG`.
/// Safe to call from multiple tests; only the first call wins.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
