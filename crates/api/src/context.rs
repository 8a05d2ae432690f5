use shopfloor_auth::{PrincipalId, Role};
use shopfloor_core::OrganizationId;
use shopfloor_infra::Actor;

/// Organization context for a request.
///
/// Taken from the token; every back office route is scoped by it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrganizationContext {
    organization_id: OrganizationId,
}

impl OrganizationContext {
    pub fn new(organization_id: OrganizationId) -> Self {
        Self { organization_id }
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}

/// Principal context for a request (authenticated identity + roles).
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

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// The caller as the back office sees it. The token subject is the
    /// caller's profile id.
    pub fn actor(&self, organization: &OrganizationContext) -> Actor {
        Actor::new(organization.organization_id(), self.principal_id.profile_id())
    }
}
