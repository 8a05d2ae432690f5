use serde::Deserialize;

use shopfloor_catalog::Product;
use shopfloor_core::{ProductId, StockMovementId, WarehouseId};
use shopfloor_inventory::{MovementType, RecordMovement, StockCount, StockMovement};
use shopfloor_organization::Warehouse;

use super::{Actor, BackOffice, BackOfficeResult};
use crate::store::{PendingMovement, StockFilter};

/// Body of `POST /stock-movements`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MovementInput {
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    /// Wire code: 1 = IN, 2 = OUT, 3 = SET. Anything else, including a
    /// missing code, is rejected by `record_movement`.
    #[serde(rename = "type", default)]
    pub movement_type: Option<i64>,
    #[serde(default)]
    pub qty: Option<i64>,
    #[serde(default)]
    pub lot: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct MovementQuery {
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl MovementQuery {
    fn filter(&self) -> StockFilter {
        StockFilter {
            warehouse_id: self.warehouse_id,
            product_id: self.product_id,
        }
    }
}

impl BackOffice {
    pub async fn record_movement(
        &self,
        actor: Actor,
        input: MovementInput,
    ) -> BackOfficeResult<StockMovement> {
        let movement_type = MovementType::from_code(input.movement_type)?;
        let warehouse: Warehouse = self
            .referenced(actor.organization_id, input.warehouse_id, "warehouse")
            .await?;
        let _: Product = self
            .referenced(actor.organization_id, input.product_id, "product")
            .await?;

        let pending = PendingMovement {
            branch_office_id: warehouse.branch_office_id,
            command: RecordMovement {
                movement_id: StockMovementId::new(),
                organization_id: actor.organization_id,
                profile_id: actor.profile_id,
                warehouse_id: warehouse.id,
                product_id: input.product_id,
                movement_type,
                qty: input.qty.unwrap_or(0),
                lot: input.lot.unwrap_or_default(),
                occurred_at: self.now(),
            },
        };
        let movement = self.store().record_movement(pending).await?;
        tracing::info!(
            organization_id = %movement.organization_id,
            movement_id = %movement.id,
            warehouse_id = %movement.warehouse_id,
            product_id = %movement.product_id,
            movement_type = movement.movement_type.code(),
            stock_before = movement.stock_before,
            stock_after = movement.stock_after,
            "stock movement recorded"
        );
        Ok(movement)
    }

    pub async fn list_movements(
        &self,
        actor: Actor,
        query: MovementQuery,
    ) -> BackOfficeResult<Vec<StockMovement>> {
        let mut movements = self
            .store()
            .stock_movements(actor.organization_id, query.filter())
            .await?;
        if let Some(limit) = query.limit {
            movements.truncate(limit);
        }
        Ok(movements)
    }

    pub async fn list_stock_counts(
        &self,
        actor: Actor,
        query: MovementQuery,
    ) -> BackOfficeResult<Vec<StockCount>> {
        Ok(self
            .store()
            .stock_counts(actor.organization_id, query.filter())
            .await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::back_office::BackOfficeError;
    use crate::back_office::tests::{actor, back_office};
    use shopfloor_catalog::{CategoryDraft, ProductDraft};
    use shopfloor_core::Status;
    use shopfloor_organization::{BusinessDetails, WarehouseDraft};

    pub(crate) async fn stocked_warehouse(bo: &BackOffice, a: Actor) -> (Warehouse, Product) {
        let branch = bo
            .create_branch_office(
                a,
                BusinessDetails {
                    business_name: "Centro".to_string(),
                    commercial_name: "Centro".to_string(),
                    contact: Default::default(),
                    status: Status::Active,
                },
            )
            .await
            .unwrap();
        let warehouse = bo
            .create_warehouse(
                a,
                WarehouseDraft {
                    branch_office_id: branch.id,
                    name: "Principal".to_string(),
                    status: Status::Active,
                },
            )
            .await
            .unwrap();
        let category = bo
            .create_category(
                a,
                CategoryDraft {
                    name: "Herramienta".to_string(),
                    status: Status::Active,
                    parent_id: None,
                },
            )
            .await
            .unwrap();
        let product = bo
            .create_product(
                a,
                ProductDraft {
                    category_id: category.id,
                    status: Status::Active,
                    external_name: "Martillo".to_string(),
                    internal_name: None,
                    sku: Some("MAR-16".to_string()),
                    model: None,
                    brand: Some("Truper".to_string()),
                    color: None,
                    is_common: false,
                },
            )
            .await
            .unwrap();
        (warehouse, product.product)
    }

    fn input(w: &Warehouse, p: &Product, code: i64, qty: i64) -> MovementInput {
        MovementInput {
            warehouse_id: w.id,
            product_id: p.id,
            movement_type: Some(code),
            qty: Some(qty),
            lot: None,
        }
    }

    #[tokio::test]
    async fn movements_chain_and_counts_follow() {
        let bo = back_office();
        let a = actor();
        let (w, p) = stocked_warehouse(&bo, a).await;

        bo.record_movement(a, input(&w, &p, 1, 10)).await.unwrap();
        let out = bo.record_movement(a, input(&w, &p, 2, 3)).await.unwrap();
        assert_eq!((out.stock_before, out.stock_after), (10, 7));
        assert_eq!(out.branch_office_id, w.branch_office_id);
        assert_eq!(out.profile_id, a.profile_id);

        let set = bo.record_movement(a, input(&w, &p, 3, 2)).await.unwrap();
        assert_eq!((set.stock_before, set.stock_after), (7, 2));

        let counts = bo.list_stock_counts(a, MovementQuery::default()).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].stock, 2);

        let latest = bo
            .list_movements(
                a,
                MovementQuery {
                    limit: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(latest[0].id, set.id);
    }

    #[tokio::test]
    async fn overdraw_is_rejected_and_nothing_is_written() {
        let bo = back_office();
        let a = actor();
        let (w, p) = stocked_warehouse(&bo, a).await;
        bo.record_movement(a, input(&w, &p, 1, 1)).await.unwrap();

        let err = bo.record_movement(a, input(&w, &p, 2, 2)).await.unwrap_err();
        assert!(matches!(err, BackOfficeError::InvariantViolation(_)));
        assert_eq!(
            bo.list_movements(a, MovementQuery::default()).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn bad_type_code_and_foreign_warehouse_are_rule_violations() {
        let bo = back_office();
        let a = actor();
        let (w, p) = stocked_warehouse(&bo, a).await;

        assert!(matches!(
            bo.record_movement(a, input(&w, &p, 9, 1)).await,
            Err(BackOfficeError::InvariantViolation(_))
        ));

        let other = actor();
        assert!(matches!(
            bo.record_movement(other, input(&w, &p, 1, 1)).await,
            Err(BackOfficeError::InvariantViolation(_))
        ));
    }

    #[tokio::test]
    async fn out_of_range_or_missing_type_is_a_rule_violation() {
        let bo = back_office();
        let a = actor();
        let (w, p) = stocked_warehouse(&bo, a).await;

        let wide: MovementInput = serde_json::from_value(serde_json::json!({
            "warehouse_id": w.id,
            "product_id": p.id,
            "type": 70000,
            "qty": 1
        }))
        .unwrap();
        assert!(matches!(
            bo.record_movement(a, wide).await,
            Err(BackOfficeError::InvariantViolation(_))
        ));

        let untyped: MovementInput = serde_json::from_value(serde_json::json!({
            "warehouse_id": w.id,
            "product_id": p.id,
            "qty": 1
        }))
        .unwrap();
        assert_eq!(untyped.movement_type, None);
        assert!(matches!(
            bo.record_movement(a, untyped).await,
            Err(BackOfficeError::InvariantViolation(_))
        ));
        assert!(
            bo.list_movements(a, MovementQuery::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn qty_defaults_to_zero() {
        let bo = back_office();
        let a = actor();
        let (w, p) = stocked_warehouse(&bo, a).await;
        let mut req = input(&w, &p, 1, 0);
        req.qty = None;
        let m = bo.record_movement(a, req).await.unwrap();
        assert_eq!((m.qty, m.stock_after, m.lot.as_str()), (0, 0, ""));
    }
}
