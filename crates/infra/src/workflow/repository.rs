//! Stream loading and append preparation shared by every workflow operation.

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use procura_core::{Aggregate, AggregateId, ExpectedVersion, TenantId};
use procura_events::Event;

use crate::event_store::{EventStore, EventStoreError, StoredEvent, StreamAppend, UncommittedEvent};
use crate::workflow::error::ServiceError;

/// Rehydrate `aggregate` from its stream. A missing stream leaves it empty
/// at version 0.
pub(crate) async fn load<A>(
    store: &dyn EventStore,
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    mut aggregate: A,
) -> Result<A, ServiceError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    let history = store.load_stream(tenant_id, aggregate_id).await?;
    validate_loaded_stream(tenant_id, aggregate_id, A::AGGREGATE_TYPE, &history)?;

    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload)
            .map_err(|e| ServiceError::Deserialize(format!("{}: {e}", stored.event_type)))?;
        aggregate.apply(&ev);
    }
    Ok(aggregate)
}

/// Wrap decided events for an append that expects the stream to still be at
/// `loaded_version`.
pub(crate) fn stream_append<A>(
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    loaded_version: u64,
    events: &[A::Event],
) -> Result<StreamAppend, ServiceError>
where
    A: Aggregate,
    A::Event: Event + Serialize,
{
    let uncommitted = events
        .iter()
        .map(|ev| {
            UncommittedEvent::from_typed(
                tenant_id,
                aggregate_id,
                A::AGGREGATE_TYPE,
                Uuid::now_v7(),
                ev,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StreamAppend::new(
        tenant_id,
        aggregate_id,
        A::AGGREGATE_TYPE,
        ExpectedVersion::from_loaded(loaded_version),
        uncommitted,
    ))
}

fn validate_loaded_stream(
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    aggregate_type: &str,
    stream: &[StoredEvent],
) -> Result<(), EventStoreError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.tenant_id != tenant_id || e.aggregate_id != aggregate_id {
            return Err(EventStoreError::TenantIsolation(format!(
                "loaded stream contains a foreign event at index {idx}"
            )));
        }
        if e.aggregate_type != aggregate_type {
            return Err(EventStoreError::AggregateTypeMismatch(format!(
                "expected '{aggregate_type}', found '{}' at index {idx}",
                e.aggregate_type
            )));
        }
        if e.sequence_number != last + 1 {
            return Err(EventStoreError::InvalidAppend(format!(
                "non-contiguous sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            )));
        }
        last = e.sequence_number;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn stored(tenant_id: TenantId, aggregate_id: AggregateId, seq: u64) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::now_v7(),
            tenant_id,
            aggregate_id,
            aggregate_type: "procurement.project".to_string(),
            sequence_number: seq,
            event_type: "procurement.project.created".to_string(),
            event_version: 1,
            occurred_at: Utc::now(),
            payload: json!({}),
        }
    }

    #[test]
    fn gaps_and_foreign_events_are_rejected() {
        let tenant_id = TenantId::new();
        let id = AggregateId::new();

        let gap = [stored(tenant_id, id, 1), stored(tenant_id, id, 3)];
        assert!(matches!(
            validate_loaded_stream(tenant_id, id, "procurement.project", &gap),
            Err(EventStoreError::InvalidAppend(_))
        ));

        let foreign = [stored(TenantId::new(), id, 1)];
        assert!(matches!(
            validate_loaded_stream(tenant_id, id, "procurement.project", &foreign),
            Err(EventStoreError::TenantIsolation(_))
        ));

        let ok = [stored(tenant_id, id, 1), stored(tenant_id, id, 2)];
        assert!(validate_loaded_stream(tenant_id, id, "procurement.project", &ok).is_ok());
    }
}
