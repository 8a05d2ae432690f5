//! Postgres-backed store.
//!
//! ## Error mapping
//!
//! | SQLx error | code | StoreError |
//! |---|---|---|
//! | unique violation | `23505` | `Conflict` |
//! | check violation | `23514` | `Conflict` |
//! | anything else | | `Backend` |
//!
//! ## Ledger writes
//!
//! A movement locks its `stock_count` row (`SELECT ... FOR UPDATE`), runs the
//! domain decision on the locked value and writes back with a version check,
//! so concurrent sales of the last unit serialize and only one succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use shopfloor_catalog::{PriceList, ProductPrice};
use shopfloor_core::{
    BranchOfficeId, DomainError, ExpectedVersion, OrganizationId, PriceListId, ProductId,
    ProfileId, StockMovementId, WarehouseId,
};
use shopfloor_inventory::{MovementType, StockCount, StockKey, StockMovement};
use shopfloor_organization::Warehouse;
use shopfloor_sales::{PosSession, Sale};

use super::{
    BackOfficeStore, FeaturedProduct, PendingMovement, PriceFilter, StockFilter, StoreError,
    StoreResult, Table, encode,
};

const SCHEMA: &str = include_str!("../../migrations/0001_schema.sql");

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(database_url), err)]
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create missing tables and indexes.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        tracing::info!("schema applied");
        Ok(())
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

#[async_trait]
impl BackOfficeStore for PostgresStore {
    #[instrument(skip(self), fields(table = table.as_str(), organization_id = %organization_id), err)]
    async fn get_document(
        &self,
        table: Table,
        organization_id: OrganizationId,
        id: Uuid,
    ) -> StoreResult<Option<serde_json::Value>> {
        let sql = format!(
            "SELECT body FROM {} WHERE organization_id = $1 AND id = $2",
            table.as_str()
        );
        let row = sqlx::query(&sql)
            .bind(organization_id.as_uuid())
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_document", e))?;
        row.map(|r| body(&r)).transpose()
    }

    #[instrument(skip(self), fields(table = table.as_str(), organization_id = %organization_id), err)]
    async fn list_documents(
        &self,
        table: Table,
        organization_id: OrganizationId,
    ) -> StoreResult<Vec<serde_json::Value>> {
        let sql = format!(
            "SELECT body FROM {} WHERE organization_id = $1 ORDER BY created_at, id",
            table.as_str()
        );
        let rows = sqlx::query(&sql)
            .bind(organization_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_documents", e))?;
        rows.iter().map(body).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_organization_documents(&self) -> StoreResult<Vec<serde_json::Value>> {
        let rows = sqlx::query("SELECT body FROM organization ORDER BY created_at, id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_organization_documents", e))?;
        rows.iter().map(body).collect()
    }

    #[instrument(
        skip(self, documents),
        fields(table = table.as_str(), organization_id = %organization_id, count = documents.len()),
        err
    )]
    async fn put_documents(
        &self,
        table: Table,
        organization_id: OrganizationId,
        documents: Vec<(Uuid, serde_json::Value)>,
    ) -> StoreResult<()> {
        let sql = format!(
            r#"
            INSERT INTO {} (organization_id, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (organization_id, id)
            DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
            "#,
            table.as_str()
        );
        let mut tx = self.begin().await?;
        for (id, doc) in &documents {
            sqlx::query(&sql)
                .bind(organization_id.as_uuid())
                .bind(id)
                .bind(doc)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("put_document", e))?;
        }
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), fields(table = table.as_str(), organization_id = %organization_id), err)]
    async fn delete_document(
        &self,
        table: Table,
        organization_id: OrganizationId,
        id: Uuid,
    ) -> StoreResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE organization_id = $1 AND id = $2",
            table.as_str()
        );
        let done = sqlx::query(&sql)
            .bind(organization_id.as_uuid())
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_document", e))?;
        Ok(done.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(organization_id = %organization_id), err)]
    async fn stock_counts(
        &self,
        organization_id: OrganizationId,
        filter: StockFilter,
    ) -> StoreResult<Vec<StockCount>> {
        let rows = sqlx::query(
            r#"
            SELECT organization_id, branch_office_id, warehouse_id, product_id,
                   stock, version, created_at, updated_at
            FROM stock_count
            WHERE organization_id = $1
              AND ($2::UUID IS NULL OR warehouse_id = $2)
              AND ($3::UUID IS NULL OR product_id = $3)
            ORDER BY warehouse_id, product_id
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(filter.warehouse_id.map(Uuid::from))
        .bind(filter.product_id.map(Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock_counts", e))?;
        rows.iter().map(stock_count_from_row).collect()
    }

    #[instrument(skip(self), fields(organization_id = %organization_id), err)]
    async fn stock_movements(
        &self,
        organization_id: OrganizationId,
        filter: StockFilter,
    ) -> StoreResult<Vec<StockMovement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, organization_id, profile_id, branch_office_id, warehouse_id,
                   product_id, movement_type, qty, stock_before, stock_after, lot, created_at
            FROM stock_movement
            WHERE organization_id = $1
              AND ($2::UUID IS NULL OR warehouse_id = $2)
              AND ($3::UUID IS NULL OR product_id = $3)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(filter.warehouse_id.map(Uuid::from))
        .bind(filter.product_id.map(Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stock_movements", e))?;
        rows.iter().map(movement_from_row).collect()
    }

    #[instrument(
        skip(self, movement),
        fields(
            organization_id = %movement.command.organization_id,
            warehouse_id = %movement.command.warehouse_id,
            product_id = %movement.command.product_id
        ),
        err
    )]
    async fn record_movement(&self, movement: PendingMovement) -> StoreResult<StockMovement> {
        let mut tx = self.begin().await?;
        match apply_movement(&mut tx, &movement).await {
            Ok(written) => {
                tx.commit()
                    .await
                    .map_err(|e| map_sqlx_error("commit_transaction", e))?;
                Ok(written)
            }
            Err(e) => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                Err(e)
            }
        }
    }

    #[instrument(skip(self, price), fields(organization_id = %price.organization_id), err)]
    async fn set_price(&self, price: ProductPrice) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO price_list_price (organization_id, price_list_id, product_id, price, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (organization_id, price_list_id, product_id)
            DO UPDATE SET price = EXCLUDED.price, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(price.organization_id.as_uuid())
        .bind(price.price_list_id.as_uuid())
        .bind(price.product_id.as_uuid())
        .bind(price.price)
        .bind(price.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_price", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(organization_id = %organization_id), err)]
    async fn prices(
        &self,
        organization_id: OrganizationId,
        filter: PriceFilter,
    ) -> StoreResult<Vec<ProductPrice>> {
        let rows = sqlx::query(
            r#"
            SELECT organization_id, price_list_id, product_id, price, updated_at
            FROM price_list_price
            WHERE organization_id = $1
              AND ($2::UUID IS NULL OR price_list_id = $2)
              AND ($3::UUID IS NULL OR product_id = $3)
            ORDER BY price_list_id, product_id
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(filter.price_list_id.map(Uuid::from))
        .bind(filter.product_id.map(Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("prices", e))?;

        rows.iter()
            .map(|row| {
                Ok(ProductPrice {
                    organization_id: OrganizationId::from_uuid(get(row, "organization_id")?),
                    price_list_id: PriceListId::from_uuid(get(row, "price_list_id")?),
                    product_id: ProductId::from_uuid(get(row, "product_id")?),
                    price: get(row, "price")?,
                    updated_at: get(row, "updated_at")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self, list), fields(organization_id = %list.organization_id, price_list_id = %list.id), err)]
    async fn save_price_list(&self, list: &PriceList) -> StoreResult<()> {
        let doc = encode(list)?;
        let mut tx = self.begin().await?;
        if list.is_default {
            sqlx::query(
                r#"
                UPDATE price_list
                SET body = jsonb_set(body, '{is_default}', 'false'::jsonb), updated_at = NOW()
                WHERE organization_id = $1 AND id <> $2
                  AND (body->>'is_default')::BOOLEAN
                "#,
            )
            .bind(list.organization_id.as_uuid())
            .bind(list.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("clear_default_price_list", e))?;
        }
        sqlx::query(
            r#"
            INSERT INTO price_list (organization_id, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (organization_id, id)
            DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(list.organization_id.as_uuid())
        .bind(list.id.as_uuid())
        .bind(&doc)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("save_price_list", e))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), fields(organization_id = %organization_id, price_list_id = %id), err)]
    async fn delete_price_list(
        &self,
        organization_id: OrganizationId,
        id: PriceListId,
    ) -> StoreResult<bool> {
        let mut tx = self.begin().await?;
        sqlx::query("DELETE FROM price_list_price WHERE organization_id = $1 AND price_list_id = $2")
            .bind(organization_id.as_uuid())
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_price_list_prices", e))?;
        let done = sqlx::query("DELETE FROM price_list WHERE organization_id = $1 AND id = $2")
            .bind(organization_id.as_uuid())
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_price_list", e))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(done.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(organization_id = %organization_id, product_id = %id), err)]
    async fn delete_product(
        &self,
        organization_id: OrganizationId,
        id: ProductId,
    ) -> StoreResult<bool> {
        let mut tx = self.begin().await?;

        let exists = sqlx::query(
            "SELECT 1 FROM product WHERE organization_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(organization_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_product", e))?;
        if exists.is_none() {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(false);
        }

        let stock_rows = sqlx::query(
            "SELECT stock FROM stock_count WHERE organization_id = $1 AND product_id = $2 FOR UPDATE",
        )
        .bind(organization_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_stock_counts", e))?;
        let mut on_hand = 0i64;
        for row in &stock_rows {
            on_hand = on_hand.saturating_add(get::<i64>(row, "stock")?);
        }
        if on_hand > 0 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(DomainError::invariant(format!(
                "product still has {on_hand} units in stock"
            ))
            .into());
        }

        for sql in [
            "DELETE FROM stock_movement WHERE organization_id = $1 AND product_id = $2",
            "DELETE FROM stock_count WHERE organization_id = $1 AND product_id = $2",
            "DELETE FROM price_list_price WHERE organization_id = $1 AND product_id = $2",
            "DELETE FROM featured_product WHERE organization_id = $1 AND product_id = $2",
            "DELETE FROM product WHERE organization_id = $1 AND id = $2",
        ] {
            sqlx::query(sql)
                .bind(organization_id.as_uuid())
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("delete_product", e))?;
        }
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(true)
    }

    #[instrument(skip(self), fields(organization_id = %organization_id), err)]
    async fn set_featured(
        &self,
        organization_id: OrganizationId,
        featured: FeaturedProduct,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO featured_product (organization_id, product_id, branch_office_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (organization_id, product_id)
            DO UPDATE SET branch_office_id = EXCLUDED.branch_office_id
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(featured.product_id.as_uuid())
        .bind(featured.branch_office_id.map(Uuid::from))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_featured", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(organization_id = %organization_id), err)]
    async fn unset_featured(
        &self,
        organization_id: OrganizationId,
        product_id: ProductId,
    ) -> StoreResult<bool> {
        let done = sqlx::query(
            "DELETE FROM featured_product WHERE organization_id = $1 AND product_id = $2",
        )
        .bind(organization_id.as_uuid())
        .bind(product_id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("unset_featured", e))?;
        Ok(done.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(organization_id = %organization_id), err)]
    async fn featured_products(
        &self,
        organization_id: OrganizationId,
    ) -> StoreResult<Vec<FeaturedProduct>> {
        let rows = sqlx::query(
            "SELECT product_id, branch_office_id FROM featured_product WHERE organization_id = $1 ORDER BY created_at",
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("featured_products", e))?;
        rows.iter()
            .map(|row| {
                Ok(FeaturedProduct {
                    product_id: ProductId::from_uuid(get(row, "product_id")?),
                    branch_office_id: get::<Option<Uuid>>(row, "branch_office_id")?
                        .map(BranchOfficeId::from_uuid),
                })
            })
            .collect()
    }

    #[instrument(
        skip(self, warehouse),
        fields(organization_id = %warehouse.organization_id, warehouse_id = %warehouse.id),
        err
    )]
    async fn save_warehouse(&self, warehouse: &Warehouse) -> StoreResult<()> {
        let doc = encode(warehouse)?;
        let mut tx = self.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO warehouse (organization_id, id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (organization_id, id)
            DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(warehouse.organization_id.as_uuid())
        .bind(warehouse.id.as_uuid())
        .bind(&doc)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("save_warehouse", e))?;
        sqlx::query(
            r#"
            UPDATE stock_count
            SET branch_office_id = $3
            WHERE organization_id = $1 AND warehouse_id = $2 AND branch_office_id <> $3
            "#,
        )
        .bind(warehouse.organization_id.as_uuid())
        .bind(warehouse.id.as_uuid())
        .bind(warehouse.branch_office_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("rehome_stock_counts", e))?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(
        skip(self, session),
        fields(organization_id = %session.organization_id, seller_id = %session.seller_id),
        err
    )]
    async fn open_session(&self, session: &PosSession) -> StoreResult<()> {
        let doc = encode(session)?;
        sqlx::query("INSERT INTO pos_session (organization_id, id, body) VALUES ($1, $2, $3)")
            .bind(session.organization_id.as_uuid())
            .bind(session.id.as_uuid())
            .bind(&doc)
            .execute(&*self.pool)
            .await
            .map_err(|e| match map_sqlx_error("open_session", e) {
                StoreError::Conflict(_) => StoreError::Conflict(
                    "seller already has a started pos session".to_string(),
                ),
                other => other,
            })?;
        Ok(())
    }

    #[instrument(
        skip(self, sale, movements),
        fields(organization_id = %sale.organization_id, sale_id = %sale.id, lines = movements.len()),
        err
    )]
    async fn commit_sale(
        &self,
        sale: &Sale,
        movements: Vec<PendingMovement>,
    ) -> StoreResult<Vec<StockMovement>> {
        let doc = encode(sale)?;
        let mut tx = self.begin().await?;

        sqlx::query("INSERT INTO sale (organization_id, id, body) VALUES ($1, $2, $3)")
            .bind(sale.organization_id.as_uuid())
            .bind(sale.id.as_uuid())
            .bind(&doc)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_sale", e))?;

        let mut written = Vec::with_capacity(movements.len());
        for pending in &movements {
            match apply_movement(&mut tx, pending).await {
                Ok(m) => written.push(m),
                Err(e) => {
                    tx.rollback()
                        .await
                        .map_err(|e| map_sqlx_error("rollback", e))?;
                    return Err(e);
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(written)
    }
}

/// Lock (or create) the count row, decide, then write count and ledger entry.
async fn apply_movement(
    tx: &mut Transaction<'_, Postgres>,
    pending: &PendingMovement,
) -> StoreResult<StockMovement> {
    let cmd = &pending.command;
    let key = cmd.key();

    sqlx::query(
        r#"
        INSERT INTO stock_count (organization_id, warehouse_id, product_id, branch_office_id,
                                 stock, version, created_at, updated_at)
        VALUES ($1, $2, $3, $4, 0, 0, $5, $5)
        ON CONFLICT (organization_id, warehouse_id, product_id) DO NOTHING
        "#,
    )
    .bind(cmd.organization_id.as_uuid())
    .bind(key.warehouse_id.as_uuid())
    .bind(key.product_id.as_uuid())
    .bind(pending.branch_office_id.as_uuid())
    .bind(cmd.occurred_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("open_stock_count", e))?;

    let row = sqlx::query(
        r#"
        SELECT organization_id, branch_office_id, warehouse_id, product_id,
               stock, version, created_at, updated_at
        FROM stock_count
        WHERE organization_id = $1 AND warehouse_id = $2 AND product_id = $3
        FOR UPDATE
        "#,
    )
    .bind(cmd.organization_id.as_uuid())
    .bind(key.warehouse_id.as_uuid())
    .bind(key.product_id.as_uuid())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_stock_count", e))?;

    let mut count = stock_count_from_row(&row)?;
    let expected = ExpectedVersion::Exact(count.version);
    let movement = count.record(cmd)?;

    let updated = sqlx::query(
        r#"
        UPDATE stock_count
        SET stock = $4, version = $5, updated_at = $6
        WHERE organization_id = $1 AND warehouse_id = $2 AND product_id = $3
          AND ($7::BIGINT IS NULL OR version = $7)
        "#,
    )
    .bind(cmd.organization_id.as_uuid())
    .bind(key.warehouse_id.as_uuid())
    .bind(key.product_id.as_uuid())
    .bind(count.stock)
    .bind(count.version as i64)
    .bind(count.updated_at)
    .bind(version_param(expected))
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("update_stock_count", e))?;
    if updated.rows_affected() == 0 {
        return Err(StoreError::Conflict(format!(
            "stock count for warehouse {} product {} changed concurrently",
            key.warehouse_id, key.product_id
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO stock_movement (id, organization_id, profile_id, branch_office_id, warehouse_id,
                                    product_id, movement_type, qty, stock_before, stock_after,
                                    lot, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(movement.id.as_uuid())
    .bind(movement.organization_id.as_uuid())
    .bind(movement.profile_id.as_uuid())
    .bind(movement.branch_office_id.as_uuid())
    .bind(movement.warehouse_id.as_uuid())
    .bind(movement.product_id.as_uuid())
    .bind(movement.movement_type.code())
    .bind(movement.qty)
    .bind(movement.stock_before)
    .bind(movement.stock_after)
    .bind(&movement.lot)
    .bind(movement.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_stock_movement", e))?;

    Ok(movement)
}

fn version_param(expected: ExpectedVersion) -> Option<i64> {
    match expected {
        ExpectedVersion::Exact(v) => Some(v as i64),
        ExpectedVersion::Any => None,
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Backend(format!("failed to read {column}: {e}")))
}

fn body(row: &PgRow) -> StoreResult<serde_json::Value> {
    get(row, "body")
}

fn stock_count_from_row(row: &PgRow) -> StoreResult<StockCount> {
    Ok(StockCount {
        organization_id: OrganizationId::from_uuid(get(row, "organization_id")?),
        branch_office_id: BranchOfficeId::from_uuid(get(row, "branch_office_id")?),
        key: StockKey {
            warehouse_id: WarehouseId::from_uuid(get(row, "warehouse_id")?),
            product_id: ProductId::from_uuid(get(row, "product_id")?),
        },
        stock: get(row, "stock")?,
        version: get::<i64>(row, "version")? as u64,
        created_at: get::<DateTime<Utc>>(row, "created_at")?,
        updated_at: get::<DateTime<Utc>>(row, "updated_at")?,
    })
}

fn movement_from_row(row: &PgRow) -> StoreResult<StockMovement> {
    let code: i16 = get(row, "movement_type")?;
    let movement_type = MovementType::try_from(code)
        .map_err(|e| StoreError::Backend(format!("corrupt stock_movement row: {e}")))?;
    Ok(StockMovement {
        id: StockMovementId::from_uuid(get(row, "id")?),
        organization_id: OrganizationId::from_uuid(get(row, "organization_id")?),
        profile_id: ProfileId::from_uuid(get(row, "profile_id")?),
        branch_office_id: BranchOfficeId::from_uuid(get(row, "branch_office_id")?),
        warehouse_id: WarehouseId::from_uuid(get(row, "warehouse_id")?),
        product_id: ProductId::from_uuid(get(row, "product_id")?),
        movement_type,
        qty: get(row, "qty")?,
        stock_before: get(row, "stock_before")?,
        stock_after: get(row, "stock_after")?,
        lot: get(row, "lot")?,
        created_at: get(row, "created_at")?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23514") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_backend_errors_naming_the_operation() {
        match map_sqlx_error("record_movement", sqlx::Error::PoolClosed) {
            StoreError::Backend(msg) => assert!(msg.contains("pool closed in record_movement")),
            other => panic!("unexpected {other:?}"),
        }
        match map_sqlx_error("get_document", sqlx::Error::RowNotFound) {
            StoreError::Backend(msg) => assert!(msg.starts_with("sqlx error in get_document")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn any_version_binds_null() {
        assert_eq!(version_param(ExpectedVersion::Any), None);
        assert_eq!(version_param(ExpectedVersion::Exact(3)), Some(3));
    }

    #[tokio::test]
    async fn malformed_database_url_fails_to_connect() {
        let err = PostgresStore::connect("not a database url", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(ref msg) if msg.contains("connect")));
    }
}
