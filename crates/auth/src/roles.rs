use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role name carried in the token. Mapping to permissions happens in the API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Operates across organizations.
    pub const SUPERADMIN: Role = Role(Cow::Borrowed("superadmin"));
    /// Runs one organization's back office.
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    /// Works the POS.
    pub const SELLER: Role = Role(Cow::Borrowed("seller"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
