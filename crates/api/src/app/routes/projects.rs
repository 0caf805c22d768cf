use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use procura_auth::Permission;
use procura_core::Money;
use procura_infra::workflow::NewProject;

use crate::app::routes::common::guard;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_project).get(list_projects))
        .route(
            "/:code",
            get(get_project).patch(rename_project).delete(delete_project),
        )
        .route("/:code/mark-default", post(mark_default_project))
}

pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateProjectRequest>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::PROJECTS_WRITE) {
        return res;
    }

    let input = NewProject {
        name: body.name,
        code: body.code,
        label: body.label,
        purchase_allowance: Money::from_minor(body.purchase_allowance),
    };
    match services.procurement.create_project(tenant.tenant_id(), input).await {
        Ok(project) => (StatusCode::CREATED, Json(dto::project_to_json(&project))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::PROJECTS_READ) {
        return res;
    }

    match services.procurement.list_projects(tenant.tenant_id()).await {
        Ok(projects) => {
            let items = projects.iter().map(dto::project_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(code): Path<String>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::PROJECTS_READ) {
        return res;
    }

    match services.procurement.get_project(tenant.tenant_id(), &code).await {
        Ok(project) => (StatusCode::OK, Json(dto::project_to_json(&project))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn rename_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(code): Path<String>,
    Json(body): Json<dto::RenameProjectRequest>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::PROJECTS_WRITE) {
        return res;
    }

    match services
        .procurement
        .rename_project(tenant.tenant_id(), &code, body.name, body.label)
        .await
    {
        Ok(project) => (StatusCode::OK, Json(dto::project_to_json(&project))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(code): Path<String>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::PROJECTS_WRITE) {
        return res;
    }

    match services.procurement.delete_project(tenant.tenant_id(), &code).await {
        Ok(()) => errors::json_message(StatusCode::OK, format!("project {code} deleted")),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn mark_default_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(code): Path<String>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::PROJECTS_WRITE) {
        return res;
    }

    match services
        .procurement
        .mark_default_project(tenant.tenant_id(), &code)
        .await
    {
        Ok(true) => errors::json_message(StatusCode::OK, format!("project {code} is now the default")),
        Ok(false) => errors::json_message(StatusCode::OK, format!("project {code} is already the default")),
        Err(e) => errors::service_error_to_response(e),
    }
}
