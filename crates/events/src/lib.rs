//! Procurement events: the event contract, the envelope persisted and
//! published for every committed event, and the in-process bus that fans
//! committed envelopes out to read models.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
