//! Value objects shared by several record kinds.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult, check_len};

/// Marker for types compared by value rather than identity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Lifecycle flag carried by most master-data records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl Status {
    pub fn is_active(self) -> bool {
        self == Status::Active
    }
}

impl ValueObject for Status {}

/// Contact details of an organization or branch office.
///
/// Every field is optional. Blank strings are stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Tax registry code.
    #[serde(default)]
    pub rfc: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

impl ValueObject for ContactInfo {}

impl ContactInfo {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(address) = &self.address {
            check_len("address", address, 100)?;
        }
        if let Some(email) = &self.email {
            check_len("email", email, 50)?;
            if !email.contains('@') {
                return Err(DomainError::validation("email must contain '@'"));
            }
        }
        if let Some(phone) = &self.phone {
            check_len("phone", phone, 20)?;
        }
        if let Some(rfc) = &self.rfc {
            check_len("rfc", rfc, 20)?;
        }
        if let Some(website) = &self.website {
            check_len("website", website, 100)?;
        }
        Ok(())
    }

    /// Drop blank values so they are stored as absent.
    pub fn normalized(self) -> Self {
        Self {
            address: non_blank(self.address),
            email: non_blank(self.email),
            phone: non_blank(self.phone),
            rfc: non_blank(self.rfc),
            website: non_blank(self.website),
        }
    }

    /// Overlay the fields present in `patch`. A blank value clears the field.
    pub fn merge(&mut self, patch: ContactInfo) {
        fn overlay(target: &mut Option<String>, value: Option<String>) {
            if let Some(v) = value {
                *target = non_blank(Some(v));
            }
        }
        overlay(&mut self.address, patch.address);
        overlay(&mut self.email, patch.email);
        overlay(&mut self.phone, patch.phone);
        overlay(&mut self.rfc, patch.rfc);
        overlay(&mut self.website, patch.website);
    }
}

/// Case- and surrounding-whitespace-insensitive name comparison used by the
/// per-organization uniqueness rules.
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_absent_and_clears_blank() {
        let mut contact = ContactInfo {
            email: Some("a@b.mx".to_string()),
            phone: Some("555".to_string()),
            ..ContactInfo::default()
        };
        contact.merge(ContactInfo {
            phone: Some("  ".to_string()),
            website: Some("https://shop.mx".to_string()),
            ..ContactInfo::default()
        });

        assert_eq!(contact.email.as_deref(), Some("a@b.mx"));
        assert_eq!(contact.phone, None);
        assert_eq!(contact.website.as_deref(), Some("https://shop.mx"));
    }

    #[test]
    fn email_without_at_is_rejected() {
        let contact = ContactInfo {
            email: Some("nobody".to_string()),
            ..ContactInfo::default()
        };
        assert!(matches!(contact.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn status_defaults_to_active() {
        assert!(Status::default().is_active());
        assert_eq!(serde_json::to_string(&Status::Inactive).unwrap(), "\"inactive\"");
    }
}
