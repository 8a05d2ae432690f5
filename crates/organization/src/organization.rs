use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::{DomainResult, Entity, OrganizationId};

use crate::business::{BusinessDetails, BusinessPatch};

/// Tenant root. Every other record carries its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    #[serde(flatten)]
    pub details: BusinessDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn create(draft: BusinessDetails, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: OrganizationId::new(),
            details: draft.normalized()?,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn patch(&mut self, patch: BusinessPatch, now: DateTime<Utc>) -> DomainResult<()> {
        self.details = patch.apply_to(&self.details)?;
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Organization {
    type Id = OrganizationId;

    fn id(&self) -> OrganizationId {
        self.id
    }

    fn organization_id(&self) -> OrganizationId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfloor_core::{ContactInfo, Status};

    #[test]
    fn organization_owns_itself() {
        let org = Organization::create(
            BusinessDetails {
                business_name: "Ferreteria Lopez SA de CV".to_string(),
                commercial_name: "Ferreteria Lopez".to_string(),
                contact: ContactInfo::default(),
                status: Status::Active,
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(org.organization_id(), org.id);
    }

    #[test]
    fn json_flattens_business_details() {
        let org = Organization::create(
            BusinessDetails {
                business_name: "Ferreteria Lopez SA de CV".to_string(),
                commercial_name: "Ferreteria Lopez".to_string(),
                contact: ContactInfo {
                    rfc: Some("FLO010101AAA".to_string()),
                    ..ContactInfo::default()
                },
                status: Status::Active,
            },
            Utc::now(),
        )
        .unwrap();

        let json = serde_json::to_value(&org).unwrap();
        assert_eq!(json["business_name"], "Ferreteria Lopez SA de CV");
        assert_eq!(json["rfc"], "FLO010101AAA");

        let back: Organization = serde_json::from_value(json).unwrap();
        assert_eq!(back, org);
    }
}
