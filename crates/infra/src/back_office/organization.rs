use shopfloor_core::{BranchOfficeId, OrganizationId, ProfileId, WarehouseId};
use shopfloor_organization::{
    BranchOffice, BusinessDetails, BusinessPatch, Organization, Profile, ProfileDraft,
    ProfilePatch, Warehouse, WarehouseDraft, WarehousePatch,
};

use super::{Actor, BackOffice, BackOfficeError, BackOfficeResult};
use crate::store::{self, StockFilter, Table, decode};

impl BackOffice {
    // Organizations (cross-tenant administration).

    pub async fn create_organization(&self, draft: BusinessDetails) -> BackOfficeResult<Organization> {
        let org = Organization::create(draft, self.now())?;
        store::save(self.store(), &org).await?;
        tracing::info!(organization_id = %org.id, "organization created");
        Ok(org)
    }

    pub async fn list_organizations(&self) -> BackOfficeResult<Vec<Organization>> {
        let docs = self.store().list_organization_documents().await?;
        Ok(docs
            .into_iter()
            .map(|d| decode(Table::Organizations, d))
            .collect::<Result<_, _>>()?)
    }

    pub async fn get_organization(&self, id: OrganizationId) -> BackOfficeResult<Organization> {
        self.find(id, id, "organization").await
    }

    pub async fn patch_organization(
        &self,
        id: OrganizationId,
        patch: BusinessPatch,
    ) -> BackOfficeResult<Organization> {
        let mut org: Organization = self.find(id, id, "organization").await?;
        org.patch(patch, self.now())?;
        store::save(self.store(), &org).await?;
        Ok(org)
    }

    pub async fn delete_organization(&self, id: OrganizationId) -> BackOfficeResult<()> {
        let _: Organization = self.find(id, id, "organization").await?;
        let branches: Vec<BranchOffice> = store::load_all(self.store(), id).await?;
        if !branches.is_empty() {
            return Err(BackOfficeError::InvariantViolation(format!(
                "organization still has {} branch offices",
                branches.len()
            )));
        }
        store::remove::<Organization>(self.store(), id, id).await?;
        tracing::info!(organization_id = %id, "organization deleted");
        Ok(())
    }

    // Profiles.

    pub async fn create_profile(&self, actor: Actor, draft: ProfileDraft) -> BackOfficeResult<Profile> {
        let profile = Profile::create(actor.organization_id, draft, self.now())?;
        if store::load::<Profile>(self.store(), actor.organization_id, profile.id)
            .await?
            .is_some()
        {
            return Err(BackOfficeError::Conflict(format!(
                "profile {} already exists",
                profile.id
            )));
        }
        store::save(self.store(), &profile).await?;
        Ok(profile)
    }

    pub async fn list_profiles(&self, actor: Actor) -> BackOfficeResult<Vec<Profile>> {
        Ok(store::load_all(self.store(), actor.organization_id).await?)
    }

    pub async fn get_profile(&self, actor: Actor, id: ProfileId) -> BackOfficeResult<Profile> {
        self.find(actor.organization_id, id, "profile").await
    }

    pub async fn my_profile(&self, actor: Actor) -> BackOfficeResult<Profile> {
        self.find(actor.organization_id, actor.profile_id, "profile").await
    }

    pub async fn patch_profile(
        &self,
        actor: Actor,
        id: ProfileId,
        patch: ProfilePatch,
    ) -> BackOfficeResult<Profile> {
        let mut profile: Profile = self.find(actor.organization_id, id, "profile").await?;
        profile.patch(patch, self.now())?;
        store::save(self.store(), &profile).await?;
        Ok(profile)
    }

    // Branch offices.

    async fn ensure_unique_branch_name(
        &self,
        actor: Actor,
        name: &str,
        except: Option<BranchOfficeId>,
    ) -> BackOfficeResult<()> {
        let all: Vec<BranchOffice> = store::load_all(self.store(), actor.organization_id).await?;
        if all
            .iter()
            .any(|b| Some(b.id) != except && b.has_business_name(name))
        {
            return Err(BackOfficeError::InvariantViolation(format!(
                "a branch office named '{}' already exists",
                name.trim()
            )));
        }
        Ok(())
    }

    pub async fn create_branch_office(
        &self,
        actor: Actor,
        draft: BusinessDetails,
    ) -> BackOfficeResult<BranchOffice> {
        let branch = BranchOffice::create(actor.organization_id, draft, self.now())?;
        self.ensure_unique_branch_name(actor, branch.business_name(), None)
            .await?;
        store::save(self.store(), &branch).await?;
        Ok(branch)
    }

    pub async fn count_branch_offices(&self, actor: Actor) -> BackOfficeResult<usize> {
        Ok(self.list_branch_offices(actor, None).await?.len())
    }

    pub async fn list_branch_offices(
        &self,
        actor: Actor,
        name: Option<&str>,
    ) -> BackOfficeResult<Vec<BranchOffice>> {
        let all: Vec<BranchOffice> = store::load_all(self.store(), actor.organization_id).await?;
        let needle = name.map(|n| n.trim().to_lowercase()).unwrap_or_default();
        Ok(all
            .into_iter()
            .filter(|b| needle.is_empty() || b.business_name().to_lowercase().contains(&needle))
            .collect())
    }

    pub async fn get_branch_office(
        &self,
        actor: Actor,
        id: BranchOfficeId,
    ) -> BackOfficeResult<BranchOffice> {
        self.find(actor.organization_id, id, "branch office").await
    }

    pub async fn patch_branch_office(
        &self,
        actor: Actor,
        id: BranchOfficeId,
        patch: BusinessPatch,
    ) -> BackOfficeResult<BranchOffice> {
        let mut branch: BranchOffice = self.find(actor.organization_id, id, "branch office").await?;
        branch.patch(patch, self.now())?;
        self.ensure_unique_branch_name(actor, branch.business_name(), Some(id))
            .await?;
        store::save(self.store(), &branch).await?;
        Ok(branch)
    }

    pub async fn replace_branch_office(
        &self,
        actor: Actor,
        id: BranchOfficeId,
        draft: BusinessDetails,
    ) -> BackOfficeResult<BranchOffice> {
        let mut branch: BranchOffice = self.find(actor.organization_id, id, "branch office").await?;
        branch.replace(draft, self.now())?;
        self.ensure_unique_branch_name(actor, branch.business_name(), Some(id))
            .await?;
        store::save(self.store(), &branch).await?;
        Ok(branch)
    }

    pub async fn delete_branch_office(&self, actor: Actor, id: BranchOfficeId) -> BackOfficeResult<()> {
        let _: BranchOffice = self.find(actor.organization_id, id, "branch office").await?;
        let warehouses: Vec<Warehouse> = store::load_all(self.store(), actor.organization_id).await?;
        if warehouses.iter().any(|w| w.branch_office_id == id) {
            return Err(BackOfficeError::InvariantViolation(
                "branch office still has warehouses".to_string(),
            ));
        }
        store::remove::<BranchOffice>(self.store(), actor.organization_id, id).await?;
        Ok(())
    }

    // Warehouses.

    async fn check_warehouse_draft(
        &self,
        actor: Actor,
        draft: &WarehouseDraft,
        except: Option<WarehouseId>,
    ) -> BackOfficeResult<()> {
        let _: BranchOffice = self
            .referenced(actor.organization_id, draft.branch_office_id, "branch office")
            .await?;
        let all: Vec<Warehouse> = store::load_all(self.store(), actor.organization_id).await?;
        if all
            .iter()
            .any(|w| Some(w.id) != except && w.has_name(&draft.name))
        {
            return Err(BackOfficeError::InvariantViolation(format!(
                "a warehouse named '{}' already exists",
                draft.name.trim()
            )));
        }
        Ok(())
    }

    pub async fn create_warehouse(
        &self,
        actor: Actor,
        draft: WarehouseDraft,
    ) -> BackOfficeResult<Warehouse> {
        self.check_warehouse_draft(actor, &draft, None).await?;
        let warehouse = Warehouse::create(actor.organization_id, draft, self.now())?;
        store::save(self.store(), &warehouse).await?;
        Ok(warehouse)
    }

    pub async fn count_warehouses(&self, actor: Actor) -> BackOfficeResult<usize> {
        Ok(self.list_warehouses(actor, None).await?.len())
    }

    pub async fn list_warehouses(
        &self,
        actor: Actor,
        branch_office_id: Option<BranchOfficeId>,
    ) -> BackOfficeResult<Vec<Warehouse>> {
        let all: Vec<Warehouse> = store::load_all(self.store(), actor.organization_id).await?;
        Ok(all
            .into_iter()
            .filter(|w| branch_office_id.is_none_or(|b| w.branch_office_id == b))
            .collect())
    }

    pub async fn get_warehouse(&self, actor: Actor, id: WarehouseId) -> BackOfficeResult<Warehouse> {
        self.find(actor.organization_id, id, "warehouse").await
    }

    pub async fn patch_warehouse(
        &self,
        actor: Actor,
        id: WarehouseId,
        patch: WarehousePatch,
    ) -> BackOfficeResult<Warehouse> {
        let current: Warehouse = self.find(actor.organization_id, id, "warehouse").await?;
        let draft = current.patched(patch);
        self.replace_warehouse(actor, id, draft).await
    }

    pub async fn replace_warehouse(
        &self,
        actor: Actor,
        id: WarehouseId,
        draft: WarehouseDraft,
    ) -> BackOfficeResult<Warehouse> {
        let mut warehouse: Warehouse = self.find(actor.organization_id, id, "warehouse").await?;
        self.check_warehouse_draft(actor, &draft, Some(id)).await?;
        warehouse.replace(draft, self.now())?;
        self.store().save_warehouse(&warehouse).await?;
        Ok(warehouse)
    }

    pub async fn delete_warehouse(&self, actor: Actor, id: WarehouseId) -> BackOfficeResult<()> {
        let _: Warehouse = self.find(actor.organization_id, id, "warehouse").await?;
        let counts = self
            .store()
            .stock_counts(
                actor.organization_id,
                StockFilter {
                    warehouse_id: Some(id),
                    product_id: None,
                },
            )
            .await?;
        let on_hand: i64 = counts.iter().map(|c| c.stock).sum();
        if on_hand > 0 {
            return Err(BackOfficeError::InvariantViolation(format!(
                "warehouse still holds {on_hand} units"
            )));
        }
        store::remove::<Warehouse>(self.store(), actor.organization_id, id).await?;
        Ok(())
    }
}
