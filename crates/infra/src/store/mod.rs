//! Persistence boundary for the back office.
//!
//! Master data (organizations, profiles, branch offices, ...) is stored as
//! JSON documents addressed by `(table, organization, id)`. The stock ledger,
//! prices and featured flags get dedicated operations because they have to be
//! updated atomically with other rows.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use shopfloor_catalog::{Category, PriceList, Product, ProductPrice};
use shopfloor_core::{
    BranchOfficeId, DomainError, Entity, OrganizationId, PriceListId, ProductId, WarehouseId,
};
use shopfloor_inventory::{RecordMovement, StockCount, StockMovement};
use shopfloor_organization::{BranchOffice, Organization, Profile, Warehouse};
use shopfloor_sales::{AppEvent, PosSession, Sale};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A business rule checked inside the store's transaction failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Organizations,
    Profiles,
    BranchOffices,
    Warehouses,
    Categories,
    Products,
    PriceLists,
    PosSessions,
    Sales,
    AppEvents,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Organizations => "organization",
            Table::Profiles => "profile",
            Table::BranchOffices => "branch_office",
            Table::Warehouses => "warehouse",
            Table::Categories => "category",
            Table::Products => "product",
            Table::PriceLists => "price_list",
            Table::PosSessions => "pos_session",
            Table::Sales => "sale",
            Table::AppEvents => "app_event",
        }
    }
}

/// A stock movement waiting to be written, with the branch office that owns
/// its warehouse (needed when the count does not exist yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMovement {
    pub branch_office_id: BranchOfficeId,
    pub command: RecordMovement,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockFilter {
    pub warehouse_id: Option<WarehouseId>,
    pub product_id: Option<ProductId>,
}

impl StockFilter {
    pub fn matches(&self, warehouse_id: WarehouseId, product_id: ProductId) -> bool {
        self.warehouse_id.is_none_or(|w| w == warehouse_id)
            && self.product_id.is_none_or(|p| p == product_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceFilter {
    pub price_list_id: Option<PriceListId>,
    pub product_id: Option<ProductId>,
}

impl PriceFilter {
    pub fn matches(&self, price: &ProductPrice) -> bool {
        self.price_list_id.is_none_or(|l| l == price.price_list_id)
            && self.product_id.is_none_or(|p| p == price.product_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeaturedProduct {
    pub product_id: ProductId,
    pub branch_office_id: Option<BranchOfficeId>,
}

#[async_trait]
pub trait BackOfficeStore: Send + Sync {
    async fn get_document(
        &self,
        table: Table,
        organization_id: OrganizationId,
        id: Uuid,
    ) -> StoreResult<Option<serde_json::Value>>;

    /// Documents of one organization, oldest first.
    async fn list_documents(
        &self,
        table: Table,
        organization_id: OrganizationId,
    ) -> StoreResult<Vec<serde_json::Value>>;

    /// Every organization document, regardless of tenant.
    async fn list_organization_documents(&self) -> StoreResult<Vec<serde_json::Value>>;

    /// Insert or overwrite. All documents are written in one transaction.
    async fn put_documents(
        &self,
        table: Table,
        organization_id: OrganizationId,
        documents: Vec<(Uuid, serde_json::Value)>,
    ) -> StoreResult<()>;

    /// Returns whether a document was removed.
    async fn delete_document(
        &self,
        table: Table,
        organization_id: OrganizationId,
        id: Uuid,
    ) -> StoreResult<bool>;

    async fn stock_counts(
        &self,
        organization_id: OrganizationId,
        filter: StockFilter,
    ) -> StoreResult<Vec<StockCount>>;

    /// Newest first.
    async fn stock_movements(
        &self,
        organization_id: OrganizationId,
        filter: StockFilter,
    ) -> StoreResult<Vec<StockMovement>>;

    /// Apply one movement to its count under a lock and append it to the ledger.
    async fn record_movement(&self, movement: PendingMovement) -> StoreResult<StockMovement>;

    async fn set_price(&self, price: ProductPrice) -> StoreResult<()>;

    async fn prices(
        &self,
        organization_id: OrganizationId,
        filter: PriceFilter,
    ) -> StoreResult<Vec<ProductPrice>>;

    /// Save a price list. A default list clears the flag on every other list of
    /// the organization in the same transaction.
    async fn save_price_list(&self, list: &PriceList) -> StoreResult<()>;

    /// Delete a price list and its prices.
    async fn delete_price_list(
        &self,
        organization_id: OrganizationId,
        id: PriceListId,
    ) -> StoreResult<bool>;

    /// Delete a product with its counts, movements, prices and featured flag.
    /// Rejected while any warehouse still holds it.
    async fn delete_product(&self, organization_id: OrganizationId, id: ProductId)
    -> StoreResult<bool>;

    async fn set_featured(
        &self,
        organization_id: OrganizationId,
        featured: FeaturedProduct,
    ) -> StoreResult<()>;

    async fn unset_featured(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
    ) -> StoreResult<bool>;

    async fn featured_products(
        &self,
        organization_id: OrganizationId,
    ) -> StoreResult<Vec<FeaturedProduct>>;

    /// Save a warehouse and point its stock counts at the warehouse's branch
    /// office, in one transaction.
    async fn save_warehouse(&self, warehouse: &Warehouse) -> StoreResult<()>;

    /// Insert a new started session; conflicts while the seller has another.
    async fn open_session(&self, session: &PosSession) -> StoreResult<()>;

    /// Insert the sale and apply its movements atomically.
    async fn commit_sale(
        &self,
        sale: &Sale,
        movements: Vec<PendingMovement>,
    ) -> StoreResult<Vec<StockMovement>>;
}

/// A document type with a home table.
pub trait Record: Entity + Serialize + DeserializeOwned + Send + Sync {
    const TABLE: Table;
}

impl Record for Organization {
    const TABLE: Table = Table::Organizations;
}
impl Record for Profile {
    const TABLE: Table = Table::Profiles;
}
impl Record for BranchOffice {
    const TABLE: Table = Table::BranchOffices;
}
impl Record for Warehouse {
    const TABLE: Table = Table::Warehouses;
}
impl Record for Category {
    const TABLE: Table = Table::Categories;
}
impl Record for Product {
    const TABLE: Table = Table::Products;
}
impl Record for PriceList {
    const TABLE: Table = Table::PriceLists;
}
impl Record for PosSession {
    const TABLE: Table = Table::PosSessions;
}
impl Record for Sale {
    const TABLE: Table = Table::Sales;
}
impl Record for AppEvent {
    const TABLE: Table = Table::AppEvents;
}

pub(crate) fn encode<R: Serialize>(record: &R) -> StoreResult<serde_json::Value> {
    serde_json::to_value(record).map_err(|e| StoreError::Backend(format!("encode: {e}")))
}

pub(crate) fn decode<R: DeserializeOwned>(table: Table, value: serde_json::Value) -> StoreResult<R> {
    serde_json::from_value(value)
        .map_err(|e| StoreError::Backend(format!("decode {}: {e}", table.as_str())))
}

/// Typed reads and writes on top of the document API.
pub async fn load<R: Record>(
    store: &dyn BackOfficeStore,
    organization_id: OrganizationId,
    id: R::Id,
) -> StoreResult<Option<R>> {
    store
        .get_document(R::TABLE, organization_id, id.into())
        .await?
        .map(|v| decode(R::TABLE, v))
        .transpose()
}

pub async fn load_all<R: Record>(
    store: &dyn BackOfficeStore,
    organization_id: OrganizationId,
) -> StoreResult<Vec<R>> {
    store
        .list_documents(R::TABLE, organization_id)
        .await?
        .into_iter()
        .map(|v| decode(R::TABLE, v))
        .collect()
}

pub async fn save<R: Record>(store: &dyn BackOfficeStore, record: &R) -> StoreResult<()> {
    save_all(store, record.organization_id(), std::slice::from_ref(record)).await
}

pub async fn save_all<R: Record>(
    store: &dyn BackOfficeStore,
    organization_id: OrganizationId,
    records: &[R],
) -> StoreResult<()> {
    let documents = records
        .iter()
        .map(|r| Ok((r.id().into(), encode(r)?)))
        .collect::<StoreResult<Vec<_>>>()?;
    store.put_documents(R::TABLE, organization_id, documents).await
}

pub async fn remove<R: Record>(
    store: &dyn BackOfficeStore,
    organization_id: OrganizationId,
    id: R::Id,
) -> StoreResult<bool> {
    store.delete_document(R::TABLE, organization_id, id.into()).await
}

pub async fn featured_ids(
    store: &dyn BackOfficeStore,
    organization_id: OrganizationId,
) -> StoreResult<HashSet<ProductId>> {
    Ok(store
        .featured_products(organization_id)
        .await?
        .into_iter()
        .map(|f| f.product_id)
        .collect())
}
