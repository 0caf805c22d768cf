use axum::http::StatusCode;
use uuid::Uuid;

use procura_auth::{CommandAuthorization, Permission};
use procura_core::AggregateId;
use procura_procurement::{CommentId, RequisitionId};

use crate::app::errors;
use crate::context::{PrincipalContext, TenantContext};

/// Permissions an endpoint needs before it may call the service.
pub struct Requires {
    pub required: Vec<Permission>,
}

impl Requires {
    pub fn one(permission: Permission) -> Self {
        Self {
            required: vec![permission],
        }
    }
}

impl CommandAuthorization for Requires {
    fn required_permissions(&self) -> &[Permission] {
        &self.required
    }
}

/// 403 response unless the caller holds `permission` in its tenant.
pub fn guard(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    permission: Permission,
) -> Result<(), axum::response::Response> {
    crate::authz::authorize_command(tenant, principal, &Requires::one(permission))
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}

pub fn parse_requisition_id(raw: &str) -> Result<RequisitionId, axum::response::Response> {
    raw.parse::<AggregateId>()
        .map(RequisitionId::new)
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid requisition id"))
}

pub fn parse_comment_id(raw: &str) -> Result<CommentId, axum::response::Response> {
    raw.parse::<Uuid>()
        .map(CommentId::from_uuid)
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid comment id"))
}
