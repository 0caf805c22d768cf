//! Domain building blocks shared by every procurement crate.
//!
//! Pure types only: identifiers, money, the aggregate contract and the base
//! error model. No IO.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, TenantId, UserId};
pub use value_object::{Money, ValueObject};
