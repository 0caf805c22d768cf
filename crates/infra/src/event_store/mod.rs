//! Append-only event store boundary.
//!
//! Defines the tenant-scoped, multi-stream append contract and its in-memory
//! and Postgres implementations.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use procura_core::{AggregateId, TenantId};
use procura_events::{EventBus, EventEnvelope};

pub use in_memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, StreamAppend, UncommittedEvent};

/// Adapter that publishes committed events to an `EventBus` after a successful append.
///
/// Publication happens only after the batch is durable. The commit is the
/// outcome of the call: a publish failure is logged and the committed events
/// are still returned. Subscribers that missed them catch up on the next
/// rebuild from the store.
pub struct PublishingEventStore<S, B> {
    store: S,
    bus: B,
}

impl<S, B> PublishingEventStore<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

#[async_trait]
impl<S, B> EventStore for PublishingEventStore<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    async fn append(&self, batch: Vec<StreamAppend>) -> Result<Vec<StoredEvent>, EventStoreError> {
        let committed = self.store.append(batch).await?;

        for e in &committed {
            if let Err(err) = self.bus.publish(e.to_envelope()) {
                tracing::warn!(
                    error = ?err,
                    aggregate_id = %e.aggregate_id,
                    sequence_number = e.sequence_number,
                    "committed event was not published"
                );
            }
        }

        Ok(committed)
    }

    async fn load_stream(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        self.store.load_stream(tenant_id, aggregate_id).await
    }

    async fn load_by_aggregate_type(
        &self,
        aggregate_type: &str,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        self.store.load_by_aggregate_type(aggregate_type).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use procura_core::ExpectedVersion;
    use procura_events::InMemoryEventBus;
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn publishes_only_committed_events() {
        let bus: Arc<InMemoryEventBus<EventEnvelope<JsonValue>>> = Arc::new(InMemoryEventBus::new());
        let sub = bus.subscribe();
        let store = PublishingEventStore::new(InMemoryEventStore::new(), bus.clone());

        let tenant_id = TenantId::new();
        let aggregate_id = AggregateId::new();
        let event = UncommittedEvent {
            event_id: Uuid::now_v7(),
            tenant_id,
            aggregate_id,
            aggregate_type: "test.stream".to_string(),
            event_type: "test.happened".to_string(),
            event_version: 1,
            occurred_at: Utc::now(),
            payload: serde_json::json!({"n": 1}),
        };
        let batch = || {
            vec![StreamAppend::new(
                tenant_id,
                aggregate_id,
                "test.stream",
                ExpectedVersion::NoStream,
                vec![event.clone()],
            )]
        };

        store.append(batch()).await.unwrap();
        let envelope = sub.try_recv().unwrap();
        assert_eq!(envelope.sequence_number(), 1);
        assert_eq!(envelope.event_type(), "test.happened");

        assert!(store.append(batch()).await.is_err());
        assert!(sub.try_recv().is_err());
    }

    struct ClosedBus;

    impl EventBus<EventEnvelope<JsonValue>> for ClosedBus {
        type Error = &'static str;

        fn publish(&self, _message: EventEnvelope<JsonValue>) -> Result<(), Self::Error> {
            Err("bus closed")
        }

        fn subscribe(&self) -> procura_events::Subscription<EventEnvelope<JsonValue>> {
            let (_tx, rx) = std::sync::mpsc::channel();
            procura_events::Subscription::new(rx)
        }
    }

    #[tokio::test]
    async fn publish_failure_does_not_undo_the_commit() {
        let store = PublishingEventStore::new(InMemoryEventStore::new(), ClosedBus);
        let tenant_id = TenantId::new();
        let aggregate_id = AggregateId::new();

        let committed = store
            .append(vec![StreamAppend::new(
                tenant_id,
                aggregate_id,
                "test.stream",
                ExpectedVersion::NoStream,
                vec![UncommittedEvent {
                    event_id: Uuid::now_v7(),
                    tenant_id,
                    aggregate_id,
                    aggregate_type: "test.stream".to_string(),
                    event_type: "test.happened".to_string(),
                    event_version: 1,
                    occurred_at: Utc::now(),
                    payload: serde_json::json!({"n": 1}),
                }],
            )])
            .await
            .unwrap();

        assert_eq!(committed.len(), 1);
        let stream = store.load_stream(tenant_id, aggregate_id).await.unwrap();
        assert_eq!(stream.len(), 1);
        assert_eq!(stream[0].sequence_number, 1);
    }
}
