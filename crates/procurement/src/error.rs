use thiserror::Error;

use procura_core::{DomainError, Money};

use crate::line_item::{ProductId, VendorId};
use crate::status::RequisitionStatus;

pub type ProcurementResult<T> = Result<T, ProcurementError>;

/// Rejections of the requisition workflow and project ledger.
///
/// Every variant is raised before any event is produced, so a failed
/// command never leaves partial state behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcurementError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("requisition is not approved yet (requested {requested})")]
    NotApproved { requested: RequisitionStatus },

    #[error("requisition is already approved")]
    AlreadyApproved,

    #[error(
        "purchase of {requested} exceeds the project allowance ({current} of {allowance} already committed)"
    )]
    BudgetExceeded {
        allowance: Money,
        current: Money,
        requested: Money,
    },

    #[error("no price for product {product_id} from vendor {vendor_id}")]
    PriceNotFound {
        product_id: ProductId,
        vendor_id: VendorId,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    /// Uniqueness violation (e.g. a project code already taken in the tenant).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Domain(DomainError),
}

impl ProcurementError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<DomainError> for ProcurementError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ProcurementError::Validation(msg),
            other => ProcurementError::Domain(other),
        }
    }
}
