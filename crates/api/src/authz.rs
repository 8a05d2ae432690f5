//! API-side authorization guard.
//!
//! Roles come from the token; this module turns them into permissions and
//! checks them before a handler touches the back office.

use shopfloor_auth::{
    AuthzError, CommandAuthorization, OrganizationMembership, Permission, Principal, Role,
    authorize,
};

use crate::context::{OrganizationContext, PrincipalContext};

pub mod perms {
    use shopfloor_auth::Permission;

    pub const ORGANIZATION_READ: Permission = Permission::from_static("organization.read");
    pub const ORGANIZATION_WRITE: Permission = Permission::from_static("organization.write");
    pub const ORGANIZATIONS_MANAGE: Permission = Permission::from_static("organizations.manage");
    pub const PROFILES_READ: Permission = Permission::from_static("profiles.read");
    pub const PROFILES_WRITE: Permission = Permission::from_static("profiles.write");
    pub const BRANCH_OFFICES_READ: Permission = Permission::from_static("branch_offices.read");
    pub const BRANCH_OFFICES_WRITE: Permission = Permission::from_static("branch_offices.write");
    pub const WAREHOUSES_READ: Permission = Permission::from_static("warehouses.read");
    pub const WAREHOUSES_WRITE: Permission = Permission::from_static("warehouses.write");
    pub const CATALOG_READ: Permission = Permission::from_static("catalog.read");
    pub const CATALOG_WRITE: Permission = Permission::from_static("catalog.write");
    pub const PRICE_LISTS_READ: Permission = Permission::from_static("price_lists.read");
    pub const PRICE_LISTS_WRITE: Permission = Permission::from_static("price_lists.write");
    pub const INVENTORY_READ: Permission = Permission::from_static("inventory.read");
    pub const INVENTORY_WRITE: Permission = Permission::from_static("inventory.write");
    pub const POS_OPERATE: Permission = Permission::from_static("pos.operate");
    pub const APP_EVENTS_READ: Permission = Permission::from_static("app_events.read");
    pub const APP_EVENTS_WRITE: Permission = Permission::from_static("app_events.write");

    /// Every permission scoped to a single organization.
    pub const ORGANIZATION_SCOPED: [Permission; 17] = [
        ORGANIZATION_READ,
        ORGANIZATION_WRITE,
        PROFILES_READ,
        PROFILES_WRITE,
        BRANCH_OFFICES_READ,
        BRANCH_OFFICES_WRITE,
        WAREHOUSES_READ,
        WAREHOUSES_WRITE,
        CATALOG_READ,
        CATALOG_WRITE,
        PRICE_LISTS_READ,
        PRICE_LISTS_WRITE,
        INVENTORY_READ,
        INVENTORY_WRITE,
        POS_OPERATE,
        APP_EVENTS_READ,
        APP_EVENTS_WRITE,
    ];
}

/// Check authorization for a command in the current request context.
///
/// Called before the back office is invoked.
pub fn authorize_command<C: CommandAuthorization>(
    organization: &OrganizationContext,
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    let membership = OrganizationMembership {
        organization_id: organization.organization_id(),
        roles: principal.roles().to_vec(),
        permissions: permissions_from_roles(principal.roles()),
    };

    let principal = Principal {
        principal_id: principal.principal_id(),
        active_organization_id: organization.organization_id(),
        membership,
    };

    for perm in command.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}

/// Role to permission mapping. Unknown roles grant nothing.
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    let mut granted: Vec<Permission> = Vec::new();
    for role in roles {
        let extra: Vec<Permission> = match role.as_str() {
            "superadmin" => vec![Permission::new("*")],
            "admin" => perms::ORGANIZATION_SCOPED.to_vec(),
            "seller" => perms::ORGANIZATION_SCOPED
                .iter()
                .filter(|p| p.is_read() && **p != perms::APP_EVENTS_READ)
                .cloned()
                .chain([perms::POS_OPERATE, perms::APP_EVENTS_WRITE])
                .collect(),
            _ => Vec::new(),
        };
        for p in extra {
            if !granted.contains(&p) {
                granted.push(p);
            }
        }
    }
    granted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grants(role: Role, perm: &Permission) -> bool {
        let granted = permissions_from_roles(&[role]);
        granted.iter().any(|p| p.is_wildcard() || p == perm)
    }

    #[test]
    fn superadmin_gets_wildcard() {
        assert_eq!(
            permissions_from_roles(&[Role::SUPERADMIN]),
            vec![Permission::new("*")]
        );
    }

    #[test]
    fn admin_cannot_manage_other_organizations() {
        assert!(grants(Role::ADMIN, &perms::CATALOG_WRITE));
        assert!(grants(Role::ADMIN, &perms::APP_EVENTS_READ));
        assert!(!grants(Role::ADMIN, &perms::ORGANIZATIONS_MANAGE));
    }

    #[test]
    fn seller_reads_and_operates_the_pos() {
        assert!(grants(Role::SELLER, &perms::CATALOG_READ));
        assert!(grants(Role::SELLER, &perms::POS_OPERATE));
        assert!(grants(Role::SELLER, &perms::APP_EVENTS_WRITE));
        assert!(!grants(Role::SELLER, &perms::APP_EVENTS_READ));
        assert!(!grants(Role::SELLER, &perms::INVENTORY_WRITE));
        assert!(!grants(Role::SELLER, &perms::ORGANIZATION_WRITE));
    }

    #[test]
    fn unknown_role_grants_nothing() {
        assert!(permissions_from_roles(&[Role::new("auditor")]).is_empty());
    }
}
