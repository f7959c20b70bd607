//! Integration tests for command bus routing and dispatch.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use sediment_core::command::CommandContext;
use sediment_core::error::DomainError;
use sediment_runtime::{CommandBusBuilder, DomainObjectFactory, PersistenceBinding};
use sediment_test_support::{Counter, CounterCommand, FixedClock, InMemoryEventStore};

fn build_bus(store: Arc<InMemoryEventStore>) -> sediment_runtime::CommandBus {
    let factory = DomainObjectFactory::new(PersistenceBinding::new(store)).with_clock(Arc::new(
        FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()),
    ));
    CommandBusBuilder::new(Arc::new(factory))
        .register::<Counter>()
        .build()
}

#[tokio::test]
async fn test_submit_routes_to_registered_aggregate() {
    // Arrange
    let store = Arc::new(InMemoryEventStore::new());
    let bus = build_bus(Arc::clone(&store));
    let id = Uuid::new_v4();

    // Act
    let outcome = bus
        .submit::<Counter>(id, CounterCommand::Increment { amount: 3 }, CommandContext::new())
        .await
        .unwrap();

    // Assert
    assert_eq!(outcome.new_version, 1);
    assert_eq!(outcome.events.len(), 1);
    assert_eq!(outcome.stream_id.as_str(), format!("counter-{id}"));
}

#[tokio::test]
async fn test_submit_dyn_rejects_unregistered_kind() {
    // Arrange
    let bus = build_bus(Arc::new(InMemoryEventStore::new()));

    // Act
    let err = bus
        .submit_dyn(
            "schema",
            Uuid::new_v4(),
            Box::new(CounterCommand::Increment { amount: 1 }),
            CommandContext::new(),
        )
        .await
        .unwrap_err();

    // Assert
    match err {
        DomainError::UnsupportedType(msg) => assert!(msg.contains("schema")),
        other => panic!("expected UnsupportedType, got {other:?}"),
    }
}

#[tokio::test]
async fn test_submit_dyn_rejects_mismatched_command_payload() {
    // Arrange
    let bus = build_bus(Arc::new(InMemoryEventStore::new()));

    // Act: right kind, wrong payload type.
    let err = bus
        .submit_dyn(
            "counter",
            Uuid::new_v4(),
            Box::new("not a counter command"),
            CommandContext::new(),
        )
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(err, DomainError::UnsupportedType(_)));
}

#[tokio::test]
async fn test_validation_failure_surfaces_verbatim_through_the_bus() {
    // Arrange
    let bus = build_bus(Arc::new(InMemoryEventStore::new()));

    // Act
    let err = bus
        .submit::<Counter>(
            Uuid::new_v4(),
            CounterCommand::Increment { amount: 0 },
            CommandContext::new(),
        )
        .await
        .unwrap_err();

    // Assert
    match err {
        DomainError::Validation(msg) => assert_eq!(msg, "increment amount must be positive"),
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_two_pinned_writers_race_one_wins_loser_retries_against_fresh_state() {
    // Arrange: the aggregate is at version 1; both callers observed it.
    let store = Arc::new(InMemoryEventStore::new());
    let bus = build_bus(Arc::clone(&store));
    let id = Uuid::new_v4();

    bus.submit::<Counter>(id, CounterCommand::Increment { amount: 1 }, CommandContext::new())
        .await
        .unwrap();

    // Act: both pin version 1; exactly one can win.
    let first = bus
        .submit::<Counter>(
            id,
            CounterCommand::Increment { amount: 2 },
            CommandContext::new().with_expected_version(1),
        )
        .await;
    let second = bus
        .submit::<Counter>(
            id,
            CounterCommand::Increment { amount: 2 },
            CommandContext::new().with_expected_version(1),
        )
        .await;

    // Assert
    let winner = first.unwrap();
    assert_eq!(winner.new_version, 2);

    let conflict = second.unwrap_err();
    match &conflict {
        DomainError::ConcurrencyConflict {
            expected, actual, ..
        } => {
            assert_eq!(*expected, 1);
            assert_eq!(*actual, 2);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }

    // The loser retries without the stale pin and lands on the
    // accumulated state.
    let retried = bus
        .submit::<Counter>(id, CounterCommand::Increment { amount: 2 }, CommandContext::new())
        .await
        .unwrap();
    assert_eq!(retried.new_version, 3);
    assert_eq!(store.stream_version(&retried.stream_id), 3);
}

#[tokio::test]
async fn test_distinct_aggregates_are_processed_concurrently() {
    // Arrange
    let store = Arc::new(InMemoryEventStore::new());
    let bus = Arc::new(build_bus(Arc::clone(&store)));
    let ids: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();

    // Act: one command per aggregate, all in flight at once.
    let mut handles = Vec::new();
    for id in &ids {
        let bus = Arc::clone(&bus);
        let id = *id;
        handles.push(tokio::spawn(async move {
            bus.submit::<Counter>(id, CounterCommand::Increment { amount: 1 }, CommandContext::new())
                .await
        }));
    }

    // Assert: no cross-aggregate interference; every command succeeds
    // on its first attempt.
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.new_version, 1);
    }
}

#[tokio::test]
async fn test_registered_kinds_lists_the_registry() {
    // Arrange
    let bus = build_bus(Arc::new(InMemoryEventStore::new()));

    // Assert
    assert_eq!(bus.registered_kinds(), vec!["counter"]);
}
