//! Entity trait: identity that survives state changes, owned by one organization.

use crate::id::OrganizationId;

pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + Into<uuid::Uuid>;

    fn id(&self) -> Self::Id;

    /// Tenant that owns the record. Organizations own themselves.
    fn organization_id(&self) -> OrganizationId;
}
