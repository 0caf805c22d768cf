//! Infrastructure for procurement: event stores, price catalogs, read-model
//! projections and the workflow service that ties them together.

pub mod catalog;
pub mod event_store;
pub mod projections;
pub mod read_model;
pub mod workflow;
