//! Role policy and the permission check handlers run before calling the
//! workflow service.

use procura_auth::{
    AuthzError, CommandAuthorization, Permission, Principal, Role, TenantMembership, authorize,
};

use crate::context::{PrincipalContext, TenantContext};

/// Check every permission `operation` requires in the request context.
pub fn authorize_command<C: CommandAuthorization>(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    operation: &C,
) -> Result<(), AuthzError> {
    let membership = TenantMembership {
        tenant_id: tenant.tenant_id(),
        roles: principal.roles().to_vec(),
        permissions: permissions_from_roles(principal.roles()),
    };

    let principal = Principal {
        principal_id: principal.principal_id(),
        active_tenant_id: tenant.tenant_id(),
        membership,
    };

    for perm in operation.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}

/// Union of the permissions granted by each role. Unknown roles grant nothing.
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    let mut granted: Vec<Permission> = Vec::new();
    for role in roles {
        for perm in role_permissions(role) {
            if !granted.contains(&perm) {
                granted.push(perm);
            }
        }
    }
    granted
}

fn role_permissions(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "ADMINISTRATOR" | "MANAGER" => vec![Permission::WILDCARD],
        "SUPERVISOR" => vec![
            Permission::PROJECTS_READ,
            Permission::REQUISITIONS_READ,
            Permission::REQUISITIONS_WRITE,
            Permission::REQUISITIONS_APPROVE,
            Permission::REQUISITIONS_REJECT,
            Permission::REQUISITIONS_COMMENT,
        ],
        "MEMBER" => vec![
            Permission::PROJECTS_READ,
            Permission::REQUISITIONS_READ,
            Permission::REQUISITIONS_WRITE,
            Permission::REQUISITIONS_COMMENT,
        ],
        "VIEWER" => vec![Permission::PROJECTS_READ, Permission::REQUISITIONS_READ],
        _ => Vec::new(),
    }
}
