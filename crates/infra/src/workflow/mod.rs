//! Application services for the requisition workflow.
//!
//! Each operation loads the aggregates it needs, lets them decide, and
//! commits every touched stream in one append. Lost races are retried from
//! a fresh load.

pub mod error;
mod repository;
pub mod service;

pub use error::ServiceError;
pub use service::{
    DEFAULT_MAX_ATTEMPTS, NewProject, NewRequisition, ProcurementService, RequisitionDetails,
};
