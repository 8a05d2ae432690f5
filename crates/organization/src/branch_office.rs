use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::{BranchOfficeId, DomainResult, Entity, OrganizationId, same_name};

use crate::business::{BusinessDetails, BusinessPatch};

/// A physical sales location of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchOffice {
    pub id: BranchOfficeId,
    pub organization_id: OrganizationId,
    #[serde(flatten)]
    pub details: BusinessDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BranchOffice {
    pub fn create(
        organization_id: OrganizationId,
        draft: BusinessDetails,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id: BranchOfficeId::new(),
            organization_id,
            details: draft.normalized()?,
            created_at: now,
            updated_at: now,
        })
    }

    /// Full replacement (PUT semantics).
    pub fn replace(&mut self, draft: BusinessDetails, now: DateTime<Utc>) -> DomainResult<()> {
        self.details = draft.normalized()?;
        self.updated_at = now;
        Ok(())
    }

    pub fn patch(&mut self, patch: BusinessPatch, now: DateTime<Utc>) -> DomainResult<()> {
        self.details = patch.apply_to(&self.details)?;
        self.updated_at = now;
        Ok(())
    }

    pub fn business_name(&self) -> &str {
        &self.details.business_name
    }

    pub fn has_business_name(&self, name: &str) -> bool {
        same_name(&self.details.business_name, name)
    }
}

impl Entity for BranchOffice {
    type Id = BranchOfficeId;

    fn id(&self) -> BranchOfficeId {
        self.id
    }

    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfloor_core::{ContactInfo, DomainError, Status};

    fn draft(name: &str) -> BusinessDetails {
        BusinessDetails {
            business_name: name.to_string(),
            commercial_name: "Sucursal".to_string(),
            contact: ContactInfo::default(),
            status: Status::Active,
        }
    }

    #[test]
    fn replace_overwrites_every_field() {
        let mut branch = BranchOffice::create(OrganizationId::new(), draft("Centro"), Utc::now()).unwrap();
        let mut next = draft("Norte");
        next.status = Status::Inactive;
        branch.replace(next, Utc::now()).unwrap();

        assert_eq!(branch.business_name(), "Norte");
        assert_eq!(branch.details.status, Status::Inactive);
    }

    #[test]
    fn name_match_ignores_case_and_padding() {
        let branch = BranchOffice::create(OrganizationId::new(), draft("Centro"), Utc::now()).unwrap();
        assert!(branch.has_business_name("  centro "));
        assert!(!branch.has_business_name("Centro 2"));
    }

    #[test]
    fn create_rejects_missing_commercial_name() {
        let mut d = draft("Centro");
        d.commercial_name = String::new();
        let err = BranchOffice::create(OrganizationId::new(), d, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
