use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use procura_core::DomainError;
use procura_infra::event_store::EventStoreError;
use procura_infra::workflow::ServiceError;
use procura_procurement::ProcurementError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => procurement_error_to_response(e),
        ServiceError::Concurrency { .. } => {
            tracing::warn!(error = %err, "write conflict not resolved by retries");
            json_error(StatusCode::CONFLICT, "conflict", err.to_string())
        }
        ServiceError::Store(EventStoreError::Concurrency(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        ServiceError::Store(EventStoreError::TenantIsolation(msg)) => {
            json_error(StatusCode::FORBIDDEN, "tenant_isolation", msg)
        }
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "event store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        ServiceError::Catalog(e) => {
            tracing::error!(error = %e, "price catalog failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "catalog_error", e.to_string())
        }
        ServiceError::Deserialize(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "deserialize_error", msg)
        }
    }
}

fn procurement_error_to_response(err: ProcurementError) -> axum::response::Response {
    let message = err.to_string();
    let (status, code) = match &err {
        ProcurementError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        ProcurementError::InvalidTransition(_) => (StatusCode::BAD_REQUEST, "invalid_transition"),
        ProcurementError::NotApproved { .. } => (StatusCode::BAD_REQUEST, "not_approved"),
        ProcurementError::AlreadyApproved => (StatusCode::BAD_REQUEST, "already_approved"),
        ProcurementError::BudgetExceeded { .. } => (StatusCode::BAD_REQUEST, "budget_exceeded"),
        ProcurementError::PriceNotFound { .. } => (StatusCode::BAD_REQUEST, "price_not_found"),
        ProcurementError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        ProcurementError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        ProcurementError::Domain(DomainError::Conflict(_)) => (StatusCode::CONFLICT, "conflict"),
        ProcurementError::Domain(DomainError::InvalidId(_)) => (StatusCode::BAD_REQUEST, "invalid_id"),
        ProcurementError::Domain(_) => (StatusCode::BAD_REQUEST, "validation_error"),
    };
    json_error(status, code, message)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// `{"message": ...}` body used by workflow commands that return no resource.
pub fn json_message(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, axum::Json(json!({ "message": message.into() }))).into_response()
}
