use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, put},
    Json, Router,
};

use procura_auth::Permission;

use crate::app::routes::common::guard;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/prices", put(set_price))
        .route("/prices/:product_id/:vendor_id", delete(remove_price))
}

pub async fn set_price(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::SetPriceRequest>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::CATALOG_WRITE) {
        return res;
    }
    let product_id = match dto::parse_product_id(&body.product_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let vendor_id = match dto::parse_vendor_id(&body.vendor_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services
        .procurement
        .set_price(tenant.tenant_id(), product_id, vendor_id, body.unit_price)
        .await
    {
        Ok(price) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "product_id": product_id.to_string(),
                "vendor_id": vendor_id.to_string(),
                "unit_price": price.minor(),
            })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_price(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((product_id, vendor_id)): Path<(String, String)>,
) -> axum::response::Response {
    if let Err(res) = guard(&tenant, &principal, Permission::CATALOG_WRITE) {
        return res;
    }
    let product_id = match dto::parse_product_id(&product_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let vendor_id = match dto::parse_vendor_id(&vendor_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services
        .procurement
        .remove_price(tenant.tenant_id(), product_id, vendor_id)
        .await
    {
        Ok(()) => errors::json_message(StatusCode::OK, "price removed"),
        Err(e) => errors::service_error_to_response(e),
    }
}
