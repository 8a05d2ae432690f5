use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::{
    BranchOfficeId, DomainResult, Entity, OrganizationId, Status, WarehouseId, require_text,
    same_name,
};

/// A stock-holding location inside a branch office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub organization_id: OrganizationId,
    pub branch_office_id: BranchOfficeId,
    pub name: String,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WarehouseDraft {
    pub branch_office_id: BranchOfficeId,
    pub name: String,
    #[serde(default)]
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WarehousePatch {
    #[serde(default)]
    pub branch_office_id: Option<BranchOfficeId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
}

impl WarehouseDraft {
    fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name, 100)
    }
}

impl Warehouse {
    pub fn create(
        organization_id: OrganizationId,
        draft: WarehouseDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id: WarehouseId::new(),
            organization_id,
            branch_office_id: draft.branch_office_id,
            name: draft.name.trim().to_string(),
            status: draft.status,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn replace(&mut self, draft: WarehouseDraft, now: DateTime<Utc>) -> DomainResult<()> {
        draft.validate()?;
        self.branch_office_id = draft.branch_office_id;
        self.name = draft.name.trim().to_string();
        self.status = draft.status;
        self.updated_at = now;
        Ok(())
    }

    /// The draft this warehouse would have after `patch`. Callers validate the
    /// referenced branch office before calling `replace` with it.
    pub fn patched(&self, patch: WarehousePatch) -> WarehouseDraft {
        WarehouseDraft {
            branch_office_id: patch.branch_office_id.unwrap_or(self.branch_office_id),
            name: patch.name.unwrap_or_else(|| self.name.clone()),
            status: patch.status.unwrap_or(self.status),
        }
    }

    pub fn has_name(&self, name: &str) -> bool {
        same_name(&self.name, name)
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> WarehouseId {
        self.id
    }

    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfloor_core::DomainError;

    fn draft() -> WarehouseDraft {
        WarehouseDraft {
            branch_office_id: BranchOfficeId::new(),
            name: " Bodega principal ".to_string(),
            status: Status::Active,
        }
    }

    #[test]
    fn create_trims_name() {
        let wh = Warehouse::create(OrganizationId::new(), draft(), Utc::now()).unwrap();
        assert_eq!(wh.name, "Bodega principal");
        assert!(wh.has_name("bodega PRINCIPAL"));
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut d = draft();
        d.name = "".to_string();
        assert!(matches!(
            Warehouse::create(OrganizationId::new(), d, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn patched_keeps_unset_fields() {
        let wh = Warehouse::create(OrganizationId::new(), draft(), Utc::now()).unwrap();
        let next = wh.patched(WarehousePatch {
            status: Some(Status::Inactive),
            ..WarehousePatch::default()
        });
        assert_eq!(next.branch_office_id, wh.branch_office_id);
        assert_eq!(next.name, wh.name);
        assert_eq!(next.status, Status::Inactive);
    }
}
