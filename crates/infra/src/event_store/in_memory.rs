use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use procura_core::{AggregateId, TenantId};

use super::r#trait::{
    EventStore, EventStoreError, StoredEvent, StreamAppend, ensure_distinct_streams,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct StreamKey {
    tenant_id: TenantId,
    aggregate_id: AggregateId,
}

/// In-memory append-only event store for tests and dev.
///
/// One write lock covers the whole batch, so a multi-stream append is
/// checked and applied without interleaving.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<StreamKey, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: &[StoredEvent]) -> u64 {
        stream.last().map(|e| e.sequence_number).unwrap_or(0)
    }

    fn poisoned() -> EventStoreError {
        EventStoreError::Backend("lock poisoned".to_string())
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, batch: Vec<StreamAppend>) -> Result<Vec<StoredEvent>, EventStoreError> {
        let batch: Vec<StreamAppend> = batch.into_iter().filter(|s| !s.is_empty()).collect();
        if batch.is_empty() {
            return Ok(vec![]);
        }

        ensure_distinct_streams(&batch)?;
        for stream in &batch {
            stream.validate()?;
        }

        let mut streams = self.streams.write().map_err(|_| Self::poisoned())?;

        // Check every stream before touching any of them.
        for append in &batch {
            let key = StreamKey {
                tenant_id: append.tenant_id,
                aggregate_id: append.aggregate_id,
            };
            let existing = streams.get(&key).map(Vec::as_slice).unwrap_or(&[]);
            let current = Self::current_version(existing);

            if !append.expected_version.matches(current) {
                return Err(EventStoreError::Concurrency(format!(
                    "stream {}: expected {:?}, found {current}",
                    append.aggregate_id, append.expected_version
                )));
            }
            if let Some(first) = existing.first() {
                if first.aggregate_type != append.aggregate_type {
                    return Err(EventStoreError::AggregateTypeMismatch(format!(
                        "stream aggregate_type is '{}', attempted append with '{}'",
                        first.aggregate_type, append.aggregate_type
                    )));
                }
            }
        }

        let mut committed = Vec::new();
        for append in batch {
            let key = StreamKey {
                tenant_id: append.tenant_id,
                aggregate_id: append.aggregate_id,
            };
            let stream = streams.entry(key).or_default();
            let mut next = Self::current_version(stream) + 1;

            for e in append.events {
                let stored = StoredEvent {
                    event_id: e.event_id,
                    tenant_id: e.tenant_id,
                    aggregate_id: e.aggregate_id,
                    aggregate_type: e.aggregate_type,
                    sequence_number: next,
                    event_type: e.event_type,
                    event_version: e.event_version,
                    occurred_at: e.occurred_at,
                    payload: e.payload,
                };
                next += 1;
                stream.push(stored.clone());
                committed.push(stored);
            }
        }

        Ok(committed)
    }

    async fn load_stream(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let key = StreamKey {
            tenant_id,
            aggregate_id,
        };
        let streams = self.streams.read().map_err(|_| Self::poisoned())?;
        Ok(streams.get(&key).cloned().unwrap_or_default())
    }

    async fn load_by_aggregate_type(
        &self,
        aggregate_type: &str,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let streams = self.streams.read().map_err(|_| Self::poisoned())?;
        let mut events: Vec<StoredEvent> = streams
            .values()
            .filter(|s| s.first().is_some_and(|e| e.aggregate_type == aggregate_type))
            .flat_map(|s| s.iter().cloned())
            .collect();
        events.sort_by_key(|e| {
            (
                *e.tenant_id.as_uuid().as_bytes(),
                *e.aggregate_id.as_uuid().as_bytes(),
                e.sequence_number,
            )
        });
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_store::UncommittedEvent;
    use chrono::Utc;
    use procura_core::ExpectedVersion;
    use uuid::Uuid;

    fn event(tenant_id: TenantId, aggregate_id: AggregateId, aggregate_type: &str) -> UncommittedEvent {
        UncommittedEvent {
            event_id: Uuid::now_v7(),
            tenant_id,
            aggregate_id,
            aggregate_type: aggregate_type.to_string(),
            event_type: "test.happened".to_string(),
            event_version: 1,
            occurred_at: Utc::now(),
            payload: serde_json::json!({}),
        }
    }

    fn append(
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        expected: ExpectedVersion,
        n: usize,
    ) -> StreamAppend {
        StreamAppend::new(
            tenant_id,
            aggregate_id,
            "test.stream",
            expected,
            (0..n).map(|_| event(tenant_id, aggregate_id, "test.stream")).collect(),
        )
    }

    #[tokio::test]
    async fn assigns_sequence_numbers_per_stream() {
        let store = InMemoryEventStore::new();
        let tenant_id = TenantId::new();
        let a = AggregateId::new();
        let b = AggregateId::new();

        let committed = store
            .append(vec![
                append(tenant_id, a, ExpectedVersion::NoStream, 2),
                append(tenant_id, b, ExpectedVersion::NoStream, 1),
            ])
            .await
            .unwrap();

        let seqs: Vec<_> = committed.iter().map(|e| e.sequence_number).collect();
        assert_eq!(seqs, vec![1, 2, 1]);
        assert_eq!(store.load_stream(tenant_id, a).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn stale_stream_rejects_the_whole_batch() {
        let store = InMemoryEventStore::new();
        let tenant_id = TenantId::new();
        let a = AggregateId::new();
        let b = AggregateId::new();

        store
            .append(vec![append(tenant_id, b, ExpectedVersion::NoStream, 1)])
            .await
            .unwrap();

        let err = store
            .append(vec![
                append(tenant_id, a, ExpectedVersion::NoStream, 1),
                append(tenant_id, b, ExpectedVersion::NoStream, 1),
            ])
            .await
            .unwrap_err();

        assert!(err.is_concurrency());
        assert!(store.load_stream(tenant_id, a).await.unwrap().is_empty());
        assert_eq!(store.load_stream(tenant_id, b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn same_stream_twice_is_invalid() {
        let store = InMemoryEventStore::new();
        let tenant_id = TenantId::new();
        let a = AggregateId::new();

        let err = store
            .append(vec![
                append(tenant_id, a, ExpectedVersion::NoStream, 1),
                append(tenant_id, a, ExpectedVersion::Exact(1), 1),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, EventStoreError::InvalidAppend(_)));
    }

    #[tokio::test]
    async fn streams_are_tenant_scoped() {
        let store = InMemoryEventStore::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let id = AggregateId::new();

        store
            .append(vec![append(tenant_a, id, ExpectedVersion::NoStream, 1)])
            .await
            .unwrap();

        assert!(store.load_stream(tenant_b, id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_by_aggregate_type_filters_streams() {
        let store = InMemoryEventStore::new();
        let tenant_id = TenantId::new();
        let a = AggregateId::new();
        let other = AggregateId::new();

        store
            .append(vec![
                append(tenant_id, a, ExpectedVersion::NoStream, 2),
                StreamAppend::new(
                    tenant_id,
                    other,
                    "other.stream",
                    ExpectedVersion::NoStream,
                    vec![event(tenant_id, other, "other.stream")],
                ),
            ])
            .await
            .unwrap();

        let events = store.load_by_aggregate_type("test.stream").await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.aggregate_id == a));
    }
}
