use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::{
    DomainResult, Entity, OrganizationId, ProfileId, Status, check_len, require_text,
};

/// A person acting inside an organization. Its id is the token subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub organization_id: OrganizationId,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileDraft {
    /// Explicit id, used to bind the profile to an existing token subject.
    #[serde(default)]
    pub id: Option<ProfileId>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfilePatch {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
}

impl Profile {
    pub fn create(
        organization_id: OrganizationId,
        draft: ProfileDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let profile = Self {
            id: draft.id.unwrap_or_default(),
            organization_id,
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            phone: draft.phone.filter(|p| !p.trim().is_empty()),
            status: draft.status,
            created_at: now,
            updated_at: now,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn patch(&mut self, patch: ProfilePatch, now: DateTime<Utc>) -> DomainResult<()> {
        let mut next = self.clone();
        if let Some(first) = patch.first_name {
            next.first_name = first.trim().to_string();
        }
        if let Some(last) = patch.last_name {
            next.last_name = last.trim().to_string();
        }
        if let Some(phone) = patch.phone {
            next.phone = Some(phone).filter(|p| !p.trim().is_empty());
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        next.validate()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("first_name", &self.first_name, 50)?;
        require_text("last_name", &self.last_name, 50)?;
        if let Some(phone) = &self.phone {
            check_len("phone", phone, 20)?;
        }
        Ok(())
    }
}

impl Entity for Profile {
    type Id = ProfileId;

    fn id(&self) -> ProfileId {
        self.id
    }

    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}
