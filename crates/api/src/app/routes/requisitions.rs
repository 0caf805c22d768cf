use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use procura_auth::Permission;
use procura_infra::workflow::NewRequisition;
use procura_procurement::RequisitionStatus;

use crate::app::routes::common::{guard, parse_comment_id, parse_requisition_id};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_requisition).get(list_requisitions))
        .route("/:id", get(get_requisition).delete(delete_requisition))
        .route("/:id/set-status", post(set_status))
        .route("/:id/approve", post(approve_requisition))
        .route("/:id/reject", post(reject_requisition))
        .route("/:id/comments", post(post_comment).get(list_comments))
        .route(
            "/:id/comments/:comment_id",
            patch(edit_comment).delete(delete_comment),
        )
}

pub async fn create_requisition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateRequisitionRequest>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::REQUISITIONS_WRITE) {
        return res;
    }

    let target_date = match dto::parse_date("target_date", &body.target_date) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let due_date = match dto::parse_date("due_date", &body.due_date) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let lines = match dto::parse_lines(&body.lines) {
        Ok(v) => v,
        Err(res) => return res,
    };

    let input = NewRequisition {
        name: body.name,
        priority: body.priority,
        project_code: body.project_code,
        target_date,
        due_date,
        lines,
    };
    match services
        .procurement
        .create_requisition(tenant.tenant_id(), principal.user_id(), input)
        .await
    {
        Ok(details) => (StatusCode::CREATED, Json(dto::requisition_to_json(&details))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_requisitions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::REQUISITIONS_READ) {
        return res;
    }

    let items = services
        .requisitions_list(tenant.tenant_id())
        .into_iter()
        .map(dto::summary_to_json)
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_requisition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::REQUISITIONS_READ) {
        return res;
    }
    let requisition_id = match parse_requisition_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services
        .procurement
        .read_requisition(tenant.tenant_id(), requisition_id)
        .await
    {
        Ok(details) => (StatusCode::OK, Json(dto::requisition_to_json(&details))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_requisition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::REQUISITIONS_WRITE) {
        return res;
    }
    let requisition_id = match parse_requisition_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services
        .procurement
        .delete_requisition(tenant.tenant_id(), requisition_id)
        .await
    {
        Ok(()) => errors::json_message(StatusCode::OK, "purchase requisition deleted"),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetStatusRequest>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::REQUISITIONS_WRITE) {
        return res;
    }
    let requisition_id = match parse_requisition_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let status: RequisitionStatus = match body.status.parse() {
        Ok(v) => v,
        Err(msg) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_status", msg),
    };

    match services
        .procurement
        .set_status(tenant.tenant_id(), requisition_id, status)
        .await
    {
        Ok(_) => errors::json_message(StatusCode::OK, format!("status changed to {status}")),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn approve_requisition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::REQUISITIONS_APPROVE) {
        return res;
    }
    let requisition_id = match parse_requisition_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services
        .procurement
        .approve(tenant.tenant_id(), requisition_id)
        .await
    {
        Ok(_) => errors::json_message(StatusCode::OK, "purchase requisition approved"),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn reject_requisition(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RejectRequest>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::REQUISITIONS_REJECT) {
        return res;
    }
    let requisition_id = match parse_requisition_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services
        .procurement
        .reject(tenant.tenant_id(), requisition_id, &body.comment)
        .await
    {
        Ok(_) => errors::json_message(StatusCode::OK, "purchase requisition rejected"),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn post_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CommentRequest>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::REQUISITIONS_COMMENT) {
        return res;
    }
    let requisition_id = match parse_requisition_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services
        .procurement
        .post_comment(tenant.tenant_id(), requisition_id, principal.user_id(), &body.content)
        .await
    {
        Ok(comment) => (StatusCode::CREATED, Json(dto::comment_to_json(&comment))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::REQUISITIONS_READ) {
        return res;
    }
    let requisition_id = match parse_requisition_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services
        .procurement
        .list_comments(tenant.tenant_id(), requisition_id)
        .await
    {
        Ok(comments) => {
            let items = comments.iter().map(dto::comment_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn edit_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, comment_id)): Path<(String, String)>,
    Json(body): Json<dto::CommentRequest>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::REQUISITIONS_COMMENT) {
        return res;
    }
    let requisition_id = match parse_requisition_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let comment_id = match parse_comment_id(&comment_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services
        .procurement
        .edit_comment(tenant.tenant_id(), requisition_id, comment_id, &body.content)
        .await
    {
        Ok(comment) => (StatusCode::OK, Json(dto::comment_to_json(&comment))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, comment_id)): Path<(String, String)>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::REQUISITIONS_COMMENT) {
        return res;
    }
    let requisition_id = match parse_requisition_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let comment_id = match parse_comment_id(&comment_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services
        .procurement
        .delete_comment(tenant.tenant_id(), requisition_id, comment_id)
        .await
    {
        Ok(()) => errors::json_message(StatusCode::OK, "comment deleted"),
        Err(e) => errors::service_error_to_response(e),
    }
}
