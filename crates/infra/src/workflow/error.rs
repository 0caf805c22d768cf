use thiserror::Error;

use procura_core::DomainError;
use procura_procurement::ProcurementError;

use crate::catalog::CatalogError;
use crate::event_store::EventStoreError;

/// Failures surfaced by [`crate::workflow::ProcurementService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Deterministic rejection by an aggregate; nothing was written.
    #[error(transparent)]
    Domain(#[from] ProcurementError),

    /// Every attempt lost the race against another writer.
    #[error("write conflict persisted after {attempts} attempts: {message}")]
    Concurrency { attempts: u32, message: String },

    #[error(transparent)]
    Store(#[from] EventStoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A stored payload no longer matches its aggregate's event type.
    #[error("failed to deserialize stored event: {0}")]
    Deserialize(String),
}

impl ServiceError {
    pub fn domain(&self) -> Option<&ProcurementError> {
        match self {
            ServiceError::Domain(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn is_write_conflict(&self) -> bool {
        matches!(self, ServiceError::Store(err) if err.is_concurrency())
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        ServiceError::Domain(err.into())
    }
}
