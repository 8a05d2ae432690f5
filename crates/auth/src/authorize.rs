use std::collections::HashSet;

use thiserror::Error;

use shopfloor_core::OrganizationId;

use crate::{OrganizationMembership, Permission, PrincipalId};

/// A caller resolved for one authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: PrincipalId,
    pub active_organization_id: OrganizationId,
    pub membership: OrganizationMembership,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("organization mismatch")]
    OrganizationMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Implemented by request wrappers that declare what they need.
pub trait CommandAuthorization {
    fn required_permissions(&self) -> &[Permission];
}

pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.active_organization_id != principal.membership.organization_id {
        return Err(AuthzError::OrganizationMismatch);
    }

    let perms: HashSet<&str> = principal
        .membership
        .permissions
        .iter()
        .map(|p| p.as_str())
        .collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        tracing::debug!(principal_id = %principal.principal_id, permission = %required, "permission denied");
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn principal(perms: &[&'static str]) -> Principal {
        let org = OrganizationId::new();
        Principal {
            principal_id: PrincipalId::new(),
            active_organization_id: org,
            membership: OrganizationMembership {
                organization_id: org,
                roles: vec![Role::SELLER],
                permissions: perms.iter().map(|p| Permission::from_static(p)).collect(),
            },
        }
    }

    #[test]
    fn explicit_permission_is_granted() {
        let p = principal(&["pos.operate"]);
        assert_eq!(authorize(&p, &Permission::new("pos.operate")), Ok(()));
        assert_eq!(
            authorize(&p, &Permission::new("catalog.write")),
            Err(AuthzError::Forbidden("catalog.write".to_string()))
        );
    }

    #[test]
    fn wildcard_grants_everything() {
        let p = principal(&["*"]);
        assert!(authorize(&p, &Permission::new("organizations.manage")).is_ok());
    }

    #[test]
    fn membership_of_another_organization_is_rejected() {
        let mut p = principal(&["*"]);
        p.membership.organization_id = OrganizationId::new();
        assert_eq!(
            authorize(&p, &Permission::new("catalog.read")),
            Err(AuthzError::OrganizationMismatch)
        );
    }
}
