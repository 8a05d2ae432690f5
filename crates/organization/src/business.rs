use serde::{Deserialize, Serialize};

use shopfloor_core::{ContactInfo, DomainResult, Status, require_text};

/// Legal and commercial identity shared by organizations and branch offices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDetails {
    pub business_name: String,
    pub commercial_name: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub status: Status,
}

impl BusinessDetails {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("business_name", &self.business_name, 100)?;
        require_text("commercial_name", &self.commercial_name, 100)?;
        self.contact.validate()
    }

    /// Trim names and drop blank contact fields, then validate.
    pub fn normalized(self) -> DomainResult<Self> {
        let details = Self {
            business_name: self.business_name.trim().to_string(),
            commercial_name: self.commercial_name.trim().to_string(),
            contact: self.contact.normalized(),
            status: self.status,
        };
        details.validate()?;
        Ok(details)
    }
}

/// Partial update: absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BusinessPatch {
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub commercial_name: Option<String>,
    #[serde(flatten)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub status: Option<Status>,
}

impl BusinessPatch {
    pub fn apply_to(self, current: &BusinessDetails) -> DomainResult<BusinessDetails> {
        let mut next = current.clone();
        if let Some(name) = self.business_name {
            next.business_name = name;
        }
        if let Some(name) = self.commercial_name {
            next.commercial_name = name;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        next.contact.merge(self.contact);
        next.normalized()
    }
}
