use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use procura_core::{Aggregate, AggregateId, TenantId, UserId};
use procura_events::EventEnvelope;
use procura_procurement::{
    Priority, ProjectId, Requisition, RequisitionEvent, RequisitionId, RequisitionStatus,
};

use crate::read_model::TenantStore;

/// List row for one requisition. Totals are not kept here; they depend on
/// live catalog prices and are computed on the detail read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequisitionSummary {
    pub requisition_id: RequisitionId,
    pub project_id: ProjectId,
    pub requester: UserId,
    pub name: String,
    pub priority: Priority,
    pub status: RequisitionStatus,
    pub is_approved: bool,
    pub is_rejected: bool,
    pub target_date: NaiveDate,
    pub due_date: NaiveDate,
    pub line_count: usize,
    pub comment_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CursorKey {
    tenant_id: TenantId,
    aggregate_id: AggregateId,
}

#[derive(Debug, Error)]
pub enum RequisitionProjectionError {
    #[error("failed to deserialize requisition event: {0}")]
    Deserialize(String),
    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Builds [`RequisitionSummary`] rows from requisition events.
///
/// Idempotent under redelivery: each stream keeps a cursor and envelopes at
/// or below it are skipped. Envelopes that arrive ahead of the cursor are
/// held per stream and applied once the missing sequence numbers show up.
#[derive(Debug)]
pub struct RequisitionsProjection<S>
where
    S: TenantStore<RequisitionId, RequisitionSummary>,
{
    store: S,
    cursors: RwLock<HashMap<CursorKey, u64>>,
    pending: Mutex<HashMap<CursorKey, BTreeMap<u64, EventEnvelope<JsonValue>>>>,
}

impl<S> RequisitionsProjection<S>
where
    S: TenantStore<RequisitionId, RequisitionSummary>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    fn get_cursor(&self, tenant_id: TenantId, aggregate_id: AggregateId) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => *cursors
                .get(&CursorKey {
                    tenant_id,
                    aggregate_id,
                })
                .unwrap_or(&0),
            Err(_) => 0,
        }
    }

    fn update_cursor(&self, tenant_id: TenantId, aggregate_id: AggregateId, seq: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(
                CursorKey {
                    tenant_id,
                    aggregate_id,
                },
                seq,
            );
        }
    }

    fn clear_cursors(&self, tenant_id: TenantId) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.retain(|k, _| k.tenant_id != tenant_id);
        }
        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|k, _| k.tenant_id != tenant_id);
        }
    }

    fn hold(&self, key: CursorKey, envelope: &EventEnvelope<JsonValue>) {
        if let Ok(mut pending) = self.pending.lock() {
            pending
                .entry(key)
                .or_default()
                .insert(envelope.sequence_number(), envelope.clone());
        }
    }

    fn take_held(&self, key: CursorKey, seq: u64) -> Option<EventEnvelope<JsonValue>> {
        let mut pending = self.pending.lock().ok()?;
        let held = pending.get_mut(&key)?;
        held.retain(|s, _| *s >= seq);
        let next = held.remove(&seq);
        if held.is_empty() {
            pending.remove(&key);
        }
        next
    }

    /// Envelopes waiting for an earlier sequence number of the same stream.
    pub fn held_back(&self, tenant_id: TenantId) -> usize {
        match self.pending.lock() {
            Ok(pending) => pending
                .iter()
                .filter(|(k, _)| k.tenant_id == tenant_id)
                .map(|(_, held)| held.len())
                .sum(),
            Err(_) => 0,
        }
    }

    pub fn get(&self, tenant_id: TenantId, id: &RequisitionId) -> Option<RequisitionSummary> {
        self.store.get(tenant_id, id)
    }

    /// Requisitions of a tenant, newest first.
    pub fn list(&self, tenant_id: TenantId) -> Vec<RequisitionSummary> {
        let mut rows = self.store.list(tenant_id);
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.requisition_id.cmp(&a.requisition_id))
        });
        rows
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), RequisitionProjectionError> {
        if envelope.aggregate_type() != Requisition::AGGREGATE_TYPE {
            return Ok(());
        }

        let tenant_id = envelope.tenant_id();
        let aggregate_id = envelope.aggregate_id();
        let key = CursorKey {
            tenant_id,
            aggregate_id,
        };
        let seq = envelope.sequence_number();

        let last = self.get_cursor(tenant_id, aggregate_id);
        if seq == 0 {
            return Err(RequisitionProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(());
        }
        if seq > last + 1 {
            tracing::debug!(
                aggregate_id = %aggregate_id,
                last,
                found = seq,
                "holding requisition event until the gap fills"
            );
            self.hold(key, envelope);
            return Ok(());
        }

        self.apply_next(envelope)?;

        let mut next = seq + 1;
        while let Some(held) = self.take_held(key, next) {
            self.apply_next(&held)?;
            next += 1;
        }
        Ok(())
    }

    /// Apply the envelope directly after the stream's cursor.
    fn apply_next(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), RequisitionProjectionError> {
        let tenant_id = envelope.tenant_id();
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        let ev: RequisitionEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| RequisitionProjectionError::Deserialize(e.to_string()))?;

        let (event_tenant, requisition_id) = match &ev {
            RequisitionEvent::RequisitionCreated(e) => (e.tenant_id, e.requisition_id),
            RequisitionEvent::RequisitionStatusChanged(e) => (e.tenant_id, e.requisition_id),
            RequisitionEvent::RequisitionApproved(e) => (e.tenant_id, e.requisition_id),
            RequisitionEvent::RequisitionRejected(e) => (e.tenant_id, e.requisition_id),
            RequisitionEvent::RequisitionDeleted(e) => (e.tenant_id, e.requisition_id),
            RequisitionEvent::CommentPosted(e) => (e.tenant_id, e.requisition_id),
            RequisitionEvent::CommentEdited(e) => (e.tenant_id, e.requisition_id),
            RequisitionEvent::CommentDeleted(e) => (e.tenant_id, e.requisition_id),
        };

        if event_tenant != tenant_id {
            return Err(RequisitionProjectionError::TenantIsolation(
                "event tenant_id does not match envelope tenant_id".to_string(),
            ));
        }
        if requisition_id.0 != aggregate_id {
            return Err(RequisitionProjectionError::TenantIsolation(
                "event requisition_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match ev {
            RequisitionEvent::RequisitionCreated(e) => {
                self.store.upsert(
                    tenant_id,
                    e.requisition_id,
                    RequisitionSummary {
                        requisition_id: e.requisition_id,
                        project_id: e.project_id,
                        requester: e.requester,
                        name: e.name,
                        priority: e.priority,
                        status: RequisitionStatus::Draft,
                        is_approved: false,
                        is_rejected: false,
                        target_date: e.target_date,
                        due_date: e.due_date,
                        line_count: e.lines.len(),
                        comment_count: 0,
                        created_at: e.occurred_at,
                    },
                );
            }
            RequisitionEvent::RequisitionStatusChanged(e) => {
                self.update(tenant_id, &e.requisition_id, |rm| rm.status = e.to);
            }
            RequisitionEvent::RequisitionApproved(e) => {
                self.update(tenant_id, &e.requisition_id, |rm| {
                    rm.is_approved = true;
                    rm.status = RequisitionStatus::InProgress;
                });
            }
            RequisitionEvent::RequisitionRejected(e) => {
                self.update(tenant_id, &e.requisition_id, |rm| {
                    rm.is_approved = false;
                    rm.is_rejected = true;
                    rm.status = RequisitionStatus::Cancelled;
                });
            }
            RequisitionEvent::RequisitionDeleted(e) => {
                self.store.remove(tenant_id, &e.requisition_id);
            }
            RequisitionEvent::CommentPosted(e) => {
                self.update(tenant_id, &e.requisition_id, |rm| rm.comment_count += 1);
            }
            RequisitionEvent::CommentEdited(_) => {}
            RequisitionEvent::CommentDeleted(e) => {
                self.update(tenant_id, &e.requisition_id, |rm| {
                    rm.comment_count = rm.comment_count.saturating_sub(1)
                });
            }
        }

        self.update_cursor(tenant_id, aggregate_id, seq);
        Ok(())
    }

    fn update(
        &self,
        tenant_id: TenantId,
        id: &RequisitionId,
        f: impl FnOnce(&mut RequisitionSummary),
    ) {
        // Rows only exist once the created event has been applied.
        if let Some(mut rm) = self.store.get(tenant_id, id) {
            f(&mut rm);
            self.store.upsert(tenant_id, *id, rm);
        }
    }

    /// Clear the affected tenants and replay `envelopes` in stream order.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), RequisitionProjectionError> {
        let mut envs: Vec<_> = envelopes.into_iter().collect();

        let mut tenants = envs.iter().map(|e| e.tenant_id()).collect::<Vec<_>>();
        tenants.sort();
        tenants.dedup();
        for t in tenants {
            self.store.clear_tenant(t);
            self.clear_cursors(t);
        }

        envs.sort_by_key(|e| (e.tenant_id(), e.aggregate_id(), e.sequence_number()));

        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use uuid::Uuid;

    use procura_events::Event;
    use procura_procurement::{
        CommentId, CommentPosted, LineItem, ProductId, RequisitionCreated, RequisitionDeleted,
        RequisitionStatusChanged, VendorId,
    };

    use super::*;
    use crate::read_model::InMemoryTenantStore;

    type Projection = RequisitionsProjection<Arc<InMemoryTenantStore<RequisitionId, RequisitionSummary>>>;

    fn projection() -> Projection {
        RequisitionsProjection::new(Arc::new(InMemoryTenantStore::new()))
    }

    fn envelope(
        tenant_id: TenantId,
        id: RequisitionId,
        seq: u64,
        ev: RequisitionEvent,
    ) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            Uuid::now_v7(),
            tenant_id,
            id.0,
            Requisition::AGGREGATE_TYPE,
            ev.event_type(),
            seq,
            serde_json::to_value(&ev).unwrap(),
        )
    }

    fn created(tenant_id: TenantId, id: RequisitionId) -> RequisitionEvent {
        RequisitionEvent::RequisitionCreated(RequisitionCreated {
            tenant_id,
            requisition_id: id,
            project_id: ProjectId::new(AggregateId::new()),
            requester: UserId::new(),
            name: "Laptops".to_string(),
            priority: Priority::High,
            target_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            lines: vec![LineItem {
                product_id: ProductId::new(),
                vendor_id: VendorId::new(),
                quantity: 2,
            }],
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn tracks_status_and_comment_count() {
        let p = projection();
        let tenant_id = TenantId::new();
        let id = RequisitionId::new(AggregateId::new());

        p.apply_envelope(&envelope(tenant_id, id, 1, created(tenant_id, id))).unwrap();
        p.apply_envelope(&envelope(
            tenant_id,
            id,
            2,
            RequisitionEvent::RequisitionStatusChanged(RequisitionStatusChanged {
                tenant_id,
                requisition_id: id,
                from: RequisitionStatus::Draft,
                to: RequisitionStatus::WaitingToApproval,
                occurred_at: Utc::now(),
            }),
        ))
        .unwrap();
        p.apply_envelope(&envelope(
            tenant_id,
            id,
            3,
            RequisitionEvent::CommentPosted(CommentPosted {
                tenant_id,
                requisition_id: id,
                comment_id: CommentId::new(),
                author: UserId::new(),
                content: "please hurry".to_string(),
                occurred_at: Utc::now(),
            }),
        ))
        .unwrap();

        let row = p.get(tenant_id, &id).unwrap();
        assert_eq!(row.status, RequisitionStatus::WaitingToApproval);
        assert_eq!(row.comment_count, 1);
        assert_eq!(row.line_count, 1);
    }

    #[test]
    fn redelivery_is_ignored() {
        let p = projection();
        let tenant_id = TenantId::new();
        let id = RequisitionId::new(AggregateId::new());
        let env = envelope(tenant_id, id, 1, created(tenant_id, id));

        p.apply_envelope(&env).unwrap();
        p.apply_envelope(&env).unwrap();

        assert_eq!(p.list(tenant_id).len(), 1);
    }

    fn status_changed(
        tenant_id: TenantId,
        id: RequisitionId,
        from: RequisitionStatus,
        to: RequisitionStatus,
    ) -> RequisitionEvent {
        RequisitionEvent::RequisitionStatusChanged(RequisitionStatusChanged {
            tenant_id,
            requisition_id: id,
            from,
            to,
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn early_event_is_held_until_the_gap_fills() {
        let p = projection();
        let tenant_id = TenantId::new();
        let id = RequisitionId::new(AggregateId::new());
        p.apply_envelope(&envelope(tenant_id, id, 1, created(tenant_id, id))).unwrap();

        let third = envelope(
            tenant_id,
            id,
            3,
            status_changed(tenant_id, id, RequisitionStatus::Ready, RequisitionStatus::OnHold),
        );
        p.apply_envelope(&third).unwrap();
        assert_eq!(p.get(tenant_id, &id).unwrap().status, RequisitionStatus::Draft);
        assert_eq!(p.held_back(tenant_id), 1);

        p.apply_envelope(&envelope(
            tenant_id,
            id,
            2,
            status_changed(tenant_id, id, RequisitionStatus::Draft, RequisitionStatus::Ready),
        ))
        .unwrap();

        assert_eq!(p.get(tenant_id, &id).unwrap().status, RequisitionStatus::OnHold);
        assert_eq!(p.held_back(tenant_id), 0);

        p.apply_envelope(&third).unwrap();
        assert_eq!(p.get(tenant_id, &id).unwrap().status, RequisitionStatus::OnHold);
    }

    #[test]
    fn stream_arriving_backwards_ends_at_its_head() {
        let p = projection();
        let tenant_id = TenantId::new();
        let id = RequisitionId::new(AggregateId::new());

        let envs = [
            envelope(tenant_id, id, 1, created(tenant_id, id)),
            envelope(
                tenant_id,
                id,
                2,
                status_changed(tenant_id, id, RequisitionStatus::Draft, RequisitionStatus::Ready),
            ),
            envelope(
                tenant_id,
                id,
                3,
                status_changed(tenant_id, id, RequisitionStatus::Ready, RequisitionStatus::OnHold),
            ),
        ];
        for env in envs.iter().rev() {
            p.apply_envelope(env).unwrap();
        }

        assert_eq!(p.get(tenant_id, &id).unwrap().status, RequisitionStatus::OnHold);
        assert_eq!(p.held_back(tenant_id), 0);
    }

    #[test]
    fn sequence_zero_is_rejected() {
        let p = projection();
        let tenant_id = TenantId::new();
        let id = RequisitionId::new(AggregateId::new());

        let err = p
            .apply_envelope(&envelope(tenant_id, id, 0, created(tenant_id, id)))
            .unwrap_err();
        assert!(matches!(
            err,
            RequisitionProjectionError::NonMonotonicSequence { last: 0, found: 0 }
        ));
    }

    #[test]
    fn rebuild_replays_and_drops_deleted_rows() {
        let p = projection();
        let tenant_id = TenantId::new();
        let kept = RequisitionId::new(AggregateId::new());
        let gone = RequisitionId::new(AggregateId::new());

        let envs = vec![
            envelope(
                tenant_id,
                gone,
                2,
                RequisitionEvent::RequisitionDeleted(RequisitionDeleted {
                    tenant_id,
                    requisition_id: gone,
                    occurred_at: Utc::now(),
                }),
            ),
            envelope(tenant_id, gone, 1, created(tenant_id, gone)),
            envelope(tenant_id, kept, 1, created(tenant_id, kept)),
        ];

        p.rebuild_from_scratch(envs).unwrap();

        let rows = p.list(tenant_id);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].requisition_id, kept);
    }

    #[test]
    fn other_aggregate_types_are_skipped() {
        let p = projection();
        let tenant_id = TenantId::new();
        let env = EventEnvelope::new(
            Uuid::now_v7(),
            tenant_id,
            AggregateId::new(),
            "procurement.project",
            "procurement.project.created",
            1,
            serde_json::json!({"anything": true}),
        );

        p.apply_envelope(&env).unwrap();
        assert!(p.list(tenant_id).is_empty());
    }
}
