//! Read-model builders fed by committed envelopes.
//!
//! Projections are rebuildable from the event store, partitioned by tenant
//! and idempotent under at-least-once delivery.

pub mod requisitions;

pub use requisitions::{RequisitionProjectionError, RequisitionSummary, RequisitionsProjection};
