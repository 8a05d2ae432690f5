//! In-process store for development and tests.
//!
//! One lock guards all state, so every trait method is atomic.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use shopfloor_catalog::{PriceList, ProductPrice};
use shopfloor_core::{DomainError, OrganizationId, PriceListId, ProductId, ProfileId};
use shopfloor_inventory::{StockCount, StockKey, StockMovement};
use shopfloor_organization::Warehouse;
use shopfloor_sales::{PosSession, Sale};

use super::{
    BackOfficeStore, FeaturedProduct, PendingMovement, PriceFilter, StockFilter, StoreError,
    StoreResult, Table, decode, encode,
};

#[derive(Debug, Default)]
struct State {
    documents: HashMap<(Table, OrganizationId), BTreeMap<Uuid, serde_json::Value>>,
    counts: HashMap<(OrganizationId, StockKey), StockCount>,
    movements: Vec<StockMovement>,
    prices: BTreeMap<(OrganizationId, PriceListId, ProductId), ProductPrice>,
    featured: BTreeMap<(OrganizationId, ProductId), FeaturedProduct>,
}

impl State {
    fn docs(&self, table: Table, org: OrganizationId) -> Option<&BTreeMap<Uuid, serde_json::Value>> {
        self.documents.get(&(table, org))
    }

    fn docs_mut(&mut self, table: Table, org: OrganizationId) -> &mut BTreeMap<Uuid, serde_json::Value> {
        self.documents.entry((table, org)).or_default()
    }

    fn apply_movement(&mut self, pending: &PendingMovement) -> StoreResult<StockMovement> {
        let cmd = &pending.command;
        let key = (cmd.organization_id, cmd.key());
        let mut count = self.counts.get(&key).cloned().unwrap_or_else(|| {
            StockCount::open(
                cmd.organization_id,
                pending.branch_office_id,
                cmd.key(),
                cmd.occurred_at,
            )
        });
        let movement = count.record(cmd)?;
        self.counts.insert(key, count);
        self.movements.push(movement.clone());
        Ok(movement)
    }

    fn started_session_of(&self, org: OrganizationId, seller: ProfileId) -> StoreResult<bool> {
        let Some(docs) = self.docs(Table::PosSessions, org) else {
            return Ok(false);
        };
        for doc in docs.values() {
            let session: PosSession = decode(Table::PosSessions, doc.clone())?;
            if session.seller_id == seller && session.is_started() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl BackOfficeStore for InMemoryStore {
    async fn get_document(
        &self,
        table: Table,
        organization_id: OrganizationId,
        id: Uuid,
    ) -> StoreResult<Option<serde_json::Value>> {
        let state = self.read()?;
        Ok(state
            .docs(table, organization_id)
            .and_then(|d| d.get(&id))
            .cloned())
    }

    async fn list_documents(
        &self,
        table: Table,
        organization_id: OrganizationId,
    ) -> StoreResult<Vec<serde_json::Value>> {
        let state = self.read()?;
        Ok(state
            .docs(table, organization_id)
            .map(|d| d.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_organization_documents(&self) -> StoreResult<Vec<serde_json::Value>> {
        let state = self.read()?;
        let mut all: Vec<(Uuid, serde_json::Value)> = state
            .documents
            .iter()
            .filter(|((table, _), _)| *table == Table::Organizations)
            .flat_map(|(_, docs)| docs.iter().map(|(id, v)| (*id, v.clone())))
            .collect();
        all.sort_by_key(|(id, _)| *id);
        Ok(all.into_iter().map(|(_, v)| v).collect())
    }

    async fn put_documents(
        &self,
        table: Table,
        organization_id: OrganizationId,
        documents: Vec<(Uuid, serde_json::Value)>,
    ) -> StoreResult<()> {
        let mut state = self.write()?;
        let docs = state.docs_mut(table, organization_id);
        for (id, body) in documents {
            docs.insert(id, body);
        }
        Ok(())
    }

    async fn delete_document(
        &self,
        table: Table,
        organization_id: OrganizationId,
        id: Uuid,
    ) -> StoreResult<bool> {
        let mut state = self.write()?;
        Ok(state.docs_mut(table, organization_id).remove(&id).is_some())
    }

    async fn stock_counts(
        &self,
        organization_id: OrganizationId,
        filter: StockFilter,
    ) -> StoreResult<Vec<StockCount>> {
        let state = self.read()?;
        let mut counts: Vec<StockCount> = state
            .counts
            .values()
            .filter(|c| c.organization_id == organization_id)
            .filter(|c| filter.matches(c.key.warehouse_id, c.key.product_id))
            .cloned()
            .collect();
        counts.sort_by_key(|c| (c.key.warehouse_id, c.key.product_id));
        Ok(counts)
    }

    async fn stock_movements(
        &self,
        organization_id: OrganizationId,
        filter: StockFilter,
    ) -> StoreResult<Vec<StockMovement>> {
        let state = self.read()?;
        Ok(state
            .movements
            .iter()
            .rev()
            .filter(|m| m.organization_id == organization_id)
            .filter(|m| filter.matches(m.warehouse_id, m.product_id))
            .cloned()
            .collect())
    }

    async fn record_movement(&self, movement: PendingMovement) -> StoreResult<StockMovement> {
        let mut state = self.write()?;
        state.apply_movement(&movement)
    }

    async fn set_price(&self, price: ProductPrice) -> StoreResult<()> {
        let mut state = self.write()?;
        state.prices.insert(
            (price.organization_id, price.price_list_id, price.product_id),
            price,
        );
        Ok(())
    }

    async fn prices(
        &self,
        organization_id: OrganizationId,
        filter: PriceFilter,
    ) -> StoreResult<Vec<ProductPrice>> {
        let state = self.read()?;
        Ok(state
            .prices
            .values()
            .filter(|p| p.organization_id == organization_id && filter.matches(p))
            .cloned()
            .collect())
    }

    async fn save_price_list(&self, list: &PriceList) -> StoreResult<()> {
        let mut state = self.write()?;
        let body = encode(list)?;
        let docs = state.docs_mut(Table::PriceLists, list.organization_id);
        if list.is_default {
            for (id, doc) in docs.iter_mut() {
                if *id != Uuid::from(list.id) {
                    doc["is_default"] = serde_json::Value::Bool(false);
                }
            }
        }
        docs.insert(list.id.into(), body);
        Ok(())
    }

    async fn delete_price_list(
        &self,
        organization_id: OrganizationId,
        id: PriceListId,
    ) -> StoreResult<bool> {
        let mut state = self.write()?;
        let removed = state
            .docs_mut(Table::PriceLists, organization_id)
            .remove(&Uuid::from(id))
            .is_some();
        if removed {
            state
                .prices
                .retain(|(org, list, _), _| !(*org == organization_id && *list == id));
        }
        Ok(removed)
    }

    async fn delete_product(
        &self,
        organization_id: OrganizationId,
        id: ProductId,
    ) -> StoreResult<bool> {
        let mut state = self.write()?;
        if !state
            .docs(Table::Products, organization_id)
            .is_some_and(|d| d.contains_key(&Uuid::from(id)))
        {
            return Ok(false);
        }
        let on_hand: i64 = state
            .counts
            .values()
            .filter(|c| c.organization_id == organization_id && c.key.product_id == id)
            .map(|c| c.stock)
            .sum();
        if on_hand > 0 {
            return Err(DomainError::invariant(format!(
                "product still has {on_hand} units in stock"
            ))
            .into());
        }

        state.docs_mut(Table::Products, organization_id).remove(&Uuid::from(id));
        state
            .counts
            .retain(|(org, key), _| !(*org == organization_id && key.product_id == id));
        state
            .movements
            .retain(|m| !(m.organization_id == organization_id && m.product_id == id));
        state
            .prices
            .retain(|(org, _, product), _| !(*org == organization_id && *product == id));
        state.featured.remove(&(organization_id, id));
        Ok(true)
    }

    async fn set_featured(
        &self,
        organization_id: OrganizationId,
        featured: FeaturedProduct,
    ) -> StoreResult<()> {
        let mut state = self.write()?;
        state
            .featured
            .insert((organization_id, featured.product_id), featured);
        Ok(())
    }

    async fn unset_featured(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
    ) -> StoreResult<bool> {
        let mut state = self.write()?;
        Ok(state.featured.remove(&(organization_id, product_id)).is_some())
    }

    async fn featured_products(
        &self,
        organization_id: OrganizationId,
    ) -> StoreResult<Vec<FeaturedProduct>> {
        let state = self.read()?;
        Ok(state
            .featured
            .iter()
            .filter(|((org, _), _)| *org == organization_id)
            .map(|(_, f)| *f)
            .collect())
    }

    async fn save_warehouse(&self, warehouse: &Warehouse) -> StoreResult<()> {
        let mut state = self.write()?;
        let body = encode(warehouse)?;
        state
            .docs_mut(Table::Warehouses, warehouse.organization_id)
            .insert(warehouse.id.into(), body);
        for count in state.counts.values_mut().filter(|c| {
            c.organization_id == warehouse.organization_id && c.key.warehouse_id == warehouse.id
        }) {
            count.branch_office_id = warehouse.branch_office_id;
        }
        Ok(())
    }

    async fn open_session(&self, session: &PosSession) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.started_session_of(session.organization_id, session.seller_id)? {
            return Err(StoreError::Conflict(
                "seller already has a started pos session".to_string(),
            ));
        }
        let body = encode(session)?;
        state
            .docs_mut(Table::PosSessions, session.organization_id)
            .insert(session.id.into(), body);
        Ok(())
    }

    async fn commit_sale(
        &self,
        sale: &Sale,
        movements: Vec<PendingMovement>,
    ) -> StoreResult<Vec<StockMovement>> {
        let mut state = self.write()?;
        let body = encode(sale)?;

        // Snapshot the ledger so a failing line rolls the whole sale back.
        let counts_before = state.counts.clone();
        let ledger_len = state.movements.len();
        let mut written = Vec::with_capacity(movements.len());
        for pending in &movements {
            match state.apply_movement(pending) {
                Ok(m) => written.push(m),
                Err(e) => {
                    state.counts = counts_before;
                    state.movements.truncate(ledger_len);
                    return Err(e);
                }
            }
        }

        state
            .docs_mut(Table::Sales, sale.organization_id)
            .insert(sale.id.into(), body);
        Ok(written)
    }
}
