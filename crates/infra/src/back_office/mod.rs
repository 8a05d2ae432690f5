//! Back office use cases.
//!
//! [`BackOffice`] is the single entry point the HTTP layer talks to. Each
//! method resolves the records a request references inside the caller's
//! organization, runs the pure domain logic and persists the outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use shopfloor_core::{DomainError, OrganizationId, ProfileId};

use crate::store::{self, BackOfficeStore, Record, StoreError};

mod catalog;
mod events;
mod inventory;
mod organization;
mod pos;

pub use catalog::{ProductView, SetPrice, WarehouseStock};
pub use inventory::{MovementInput, MovementQuery};
pub use pos::SessionWithSales;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackOfficeError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("store error: {0}")]
    Store(String),
}

pub type BackOfficeResult<T> = Result<T, BackOfficeError>;

impl From<DomainError> for BackOfficeError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::InvariantViolation(msg) => Self::InvariantViolation(msg),
            DomainError::NotFound(what) => Self::NotFound(what),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::Unauthorized => Self::Forbidden("unauthorized".to_string()),
        }
    }
}

impl From<StoreError> for BackOfficeError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Domain(e) => e.into(),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Backend(msg) => {
                tracing::error!(error = %msg, "store failure");
                Self::Store(msg)
            }
        }
    }
}

/// Who is asking: the organization from the token and the caller's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub organization_id: OrganizationId,
    pub profile_id: ProfileId,
}

impl Actor {
    pub fn new(organization_id: OrganizationId, profile_id: ProfileId) -> Self {
        Self {
            organization_id,
            profile_id,
        }
    }
}

#[derive(Clone)]
pub struct BackOffice {
    store: Arc<dyn BackOfficeStore>,
}

impl BackOffice {
    pub fn new(store: Arc<dyn BackOfficeStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn BackOfficeStore {
        self.store.as_ref()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Record addressed by the request path: missing means 404.
    async fn find<R: Record>(
        &self,
        organization_id: OrganizationId,
        id: R::Id,
        what: &str,
    ) -> BackOfficeResult<R> {
        store::load::<R>(self.store(), organization_id, id)
            .await?
            .ok_or_else(|| BackOfficeError::NotFound(what.to_string()))
    }

    /// Record referenced from a request body: missing is a rule violation.
    async fn referenced<R: Record>(
        &self,
        organization_id: OrganizationId,
        id: R::Id,
        what: &str,
    ) -> BackOfficeResult<R> {
        store::load::<R>(self.store(), organization_id, id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(%organization_id, what, "reference outside organization");
                BackOfficeError::InvariantViolation(format!(
                    "{what} does not belong to the organization"
                ))
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    pub(crate) fn back_office() -> BackOffice {
        BackOffice::new(Arc::new(InMemoryStore::new()))
    }

    pub(crate) fn actor() -> Actor {
        Actor::new(OrganizationId::new(), ProfileId::new())
    }

    #[test]
    fn domain_errors_map_onto_http_facing_kinds() {
        assert_eq!(
            BackOfficeError::from(DomainError::invalid_id("bad")),
            BackOfficeError::Validation("bad".to_string())
        );
        assert_eq!(
            BackOfficeError::from(StoreError::Domain(DomainError::invariant("neg"))),
            BackOfficeError::InvariantViolation("neg".to_string())
        );
        assert_eq!(
            BackOfficeError::from(StoreError::Conflict("dup".to_string())),
            BackOfficeError::Conflict("dup".to_string())
        );
    }
}
