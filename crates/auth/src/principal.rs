use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shopfloor_core::{OrganizationId, ProfileId};

/// Identity of an authenticated caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Callers act through the profile that shares their id.
    pub fn profile_id(&self) -> ProfileId {
        ProfileId::from_uuid(self.0)
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for PrincipalId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ProfileId> for PrincipalId {
    fn from(value: ProfileId) -> Self {
        Self(*value.as_uuid())
    }
}

impl FromStr for PrincipalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// What a principal may do inside one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    pub organization_id: OrganizationId,
    pub roles: Vec<crate::Role>,
    pub permissions: Vec<crate::Permission>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_and_profile_share_the_uuid() {
        let p = PrincipalId::new();
        assert_eq!(p.profile_id().as_uuid(), p.as_uuid());
        assert_eq!(PrincipalId::from(p.profile_id()), p);
    }
}
