use procura_auth::{PrincipalId, Role};
use procura_core::{TenantId, UserId};

/// Tenant the request acts within, taken from the verified token.
///
/// Every procurement route reads and writes only this tenant's streams.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: TenantId,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Authenticated caller and the roles the token grants it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        Self { principal_id, roles }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    /// Requester of new requisitions and author of new comments.
    pub fn user_id(&self) -> UserId {
        self.principal_id.as_user()
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}
