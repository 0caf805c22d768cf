use chrono::{DateTime, Utc};

/// A fact recorded on an aggregate stream.
///
/// Event payloads are immutable once appended; schema changes bump `version()`.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable type name (e.g. "procurement.requisition.approved").
    fn event_type(&self) -> &'static str;

    /// Schema version of this event type.
    fn version(&self) -> u32;

    /// Business time of the fact.
    fn occurred_at(&self) -> DateTime<Utc>;
}
