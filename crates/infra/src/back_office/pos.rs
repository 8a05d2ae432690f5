use serde::Serialize;

use shopfloor_catalog::Product;
use shopfloor_core::StockMovementId;
use shopfloor_inventory::{MovementType, RecordMovement};
use shopfloor_organization::{BranchOffice, Profile, Warehouse};
use shopfloor_sales::{
    OpenSession, PosSession, ProductFacts, Sale, SaleFacts, SaleRequest, SellerFacts,
    SessionStatus, SessionUpdate, checkout,
};

use super::{Actor, BackOffice, BackOfficeError, BackOfficeResult};
use crate::store::{self, PendingMovement, PriceFilter, StockFilter};

/// A session together with the sales recorded in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionWithSales {
    pub session: PosSession,
    pub sales: Vec<Sale>,
}

fn no_session() -> BackOfficeError {
    BackOfficeError::NotFound("pos session".to_string())
}

impl BackOffice {
    /// The caller's started session, if any.
    pub async fn started_session(&self, actor: Actor) -> BackOfficeResult<Option<PosSession>> {
        let sessions: Vec<PosSession> = store::load_all(self.store(), actor.organization_id).await?;
        Ok(sessions
            .into_iter()
            .find(|s| s.seller_id == actor.profile_id && s.is_started()))
    }

    async fn session_sales(&self, actor: Actor, session: PosSession) -> BackOfficeResult<SessionWithSales> {
        let sales: Vec<Sale> = store::load_all(self.store(), actor.organization_id).await?;
        let sales: Vec<Sale> = sales
            .into_iter()
            .filter(|s| s.pos_session_id == session.id)
            .collect();
        Ok(SessionWithSales {
            session: session.with_totals(&sales),
            sales,
        })
    }

    pub async fn open_session(
        &self,
        actor: Actor,
        input: OpenSession,
    ) -> BackOfficeResult<SessionWithSales> {
        if self.started_session(actor).await?.is_some() {
            return Err(BackOfficeError::Conflict(
                "seller already has a started pos session".to_string(),
            ));
        }
        let _: BranchOffice = self
            .referenced(actor.organization_id, input.branch_office_id, "branch office")
            .await?;

        let session = PosSession::open(
            actor.organization_id,
            input.branch_office_id,
            actor.profile_id,
            self.now(),
        );
        self.store().open_session(&session).await?;
        tracing::info!(
            organization_id = %session.organization_id,
            pos_session_id = %session.id,
            branch_office_id = %session.branch_office_id,
            seller_id = %session.seller_id,
            "pos session opened"
        );
        Ok(SessionWithSales {
            session,
            sales: Vec::new(),
        })
    }

    pub async fn current_session(&self, actor: Actor) -> BackOfficeResult<SessionWithSales> {
        let session = self.started_session(actor).await?.ok_or_else(no_session)?;
        self.session_sales(actor, session).await
    }

    pub async fn update_session(
        &self,
        actor: Actor,
        update: SessionUpdate,
    ) -> BackOfficeResult<SessionWithSales> {
        let mut session = self.started_session(actor).await?.ok_or_else(no_session)?;
        session.update(update, self.now())?;
        store::save(self.store(), &session).await?;
        if session.status == SessionStatus::Closed {
            tracing::info!(
                organization_id = %session.organization_id,
                pos_session_id = %session.id,
                "pos session closed"
            );
        }
        self.session_sales(actor, session).await
    }

    /// Everything `checkout` needs to know about the records a sale names.
    async fn sale_facts(&self, actor: Actor, request: &SaleRequest) -> BackOfficeResult<SaleFacts> {
        let org = actor.organization_id;
        let mut facts = SaleFacts::default();

        for id in request.branch_office_ids() {
            if store::load::<BranchOffice>(self.store(), org, id).await?.is_some() {
                facts.branch_offices.insert(id);
            }
        }
        for id in request.warehouse_ids() {
            if let Some(w) = store::load::<Warehouse>(self.store(), org, id).await? {
                facts.warehouses.insert(w.id, w.branch_office_id);
            }
        }
        for id in request.product_ids() {
            if let Some(p) = store::load::<Product>(self.store(), org, id).await? {
                facts.products.insert(
                    p.id,
                    ProductFacts {
                        external_name: p.external_name,
                        is_common: p.is_common,
                    },
                );
            }
        }
        for (warehouse_id, product_id) in request.stock_keys() {
            let filter = StockFilter {
                warehouse_id: Some(warehouse_id),
                product_id: Some(product_id),
            };
            if let Some(count) = self.store().stock_counts(org, filter).await?.first() {
                facts.stock.insert((warehouse_id, product_id), count.stock);
            }
        }
        for (price_list_id, product_id) in request.price_keys() {
            let filter = PriceFilter {
                price_list_id: Some(price_list_id),
                product_id: Some(product_id),
            };
            if let Some(price) = self.store().prices(org, filter).await?.first() {
                facts.prices.insert((price_list_id, product_id), price.price);
            }
        }
        facts.seller = store::load::<Profile>(self.store(), org, request.seller_id)
            .await?
            .map(|p| SellerFacts {
                full_name: p.full_name(),
                active: p.status.is_active(),
            });
        Ok(facts)
    }

    /// Price the request against the caller's started session and commit the
    /// sale with one OUT movement per stock-tracked line.
    pub async fn create_sale(&self, actor: Actor, request: SaleRequest) -> BackOfficeResult<Sale> {
        let session = self.started_session(actor).await?.ok_or_else(no_session)?;

        let facts = self.sale_facts(actor, &request).await?;
        let priced = checkout(&request, &facts).map_err(|e| {
            tracing::debug!(organization_id = %actor.organization_id, error = %e, "sale rejected");
            BackOfficeError::from(e)
        })?;

        let now = self.now();
        let sale = Sale::record(&session, &request, priced, now);
        let lot = sale.movement_lot();
        let movements: Vec<PendingMovement> = sale
            .stock_lines()
            .map(|line| PendingMovement {
                branch_office_id: line.branch_office_id,
                command: RecordMovement {
                    movement_id: StockMovementId::new(),
                    organization_id: sale.organization_id,
                    profile_id: actor.profile_id,
                    warehouse_id: line.warehouse_id,
                    product_id: line.product_id,
                    movement_type: MovementType::Out,
                    qty: line.qty,
                    lot: lot.clone(),
                    occurred_at: now,
                },
            })
            .collect();

        let written = self.store().commit_sale(&sale, movements).await?;
        tracing::info!(
            organization_id = %sale.organization_id,
            sale_id = %sale.id,
            pos_session_id = %sale.pos_session_id,
            total = sale.total,
            movements = written.len(),
            "sale committed"
        );
        Ok(sale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::back_office::inventory::tests::stocked_warehouse;
    use crate::back_office::tests::{actor, back_office};
    use crate::back_office::{MovementInput, MovementQuery, SetPrice};
    use shopfloor_catalog::{PriceList, PriceListDraft, ProductDraft};
    use shopfloor_core::Status;
    use shopfloor_organization::ProfileDraft;
    use shopfloor_sales::{Discount, DiscountKind, Payment, PaymentMethod, SaleItemRequest};

    struct Till {
        bo: BackOffice,
        a: Actor,
        warehouse: Warehouse,
        hammer: Product,
        list: PriceList,
    }

    async fn till() -> Till {
        let bo = back_office();
        let a = actor();
        let (warehouse, hammer) = stocked_warehouse(&bo, a).await;
        bo.create_profile(
            a,
            ProfileDraft {
                id: Some(a.profile_id),
                first_name: "Luis".to_string(),
                last_name: "Perez".to_string(),
                phone: None,
                status: Status::Active,
            },
        )
        .await
        .unwrap();
        bo.record_movement(
            a,
            MovementInput {
                warehouse_id: warehouse.id,
                product_id: hammer.id,
                movement_type: Some(1),
                qty: Some(5),
                lot: None,
            },
        )
        .await
        .unwrap();
        let list = bo
            .create_price_list(
                a,
                PriceListDraft {
                    name: "Publico".to_string(),
                    is_default: true,
                },
            )
            .await
            .unwrap();
        bo.set_price(
            a,
            SetPrice {
                price_list_id: list.id,
                product_id: hammer.id,
                price: 15_000,
            },
        )
        .await
        .unwrap();
        Till {
            bo,
            a,
            warehouse,
            hammer,
            list,
        }
    }

    impl Till {
        async fn open(&self) -> PosSession {
            self.bo
                .open_session(
                    self.a,
                    OpenSession {
                        branch_office_id: self.warehouse.branch_office_id,
                    },
                )
                .await
                .unwrap()
                .session
        }

        fn item(&self, product: &Product, qty: i64, price: Option<i64>) -> SaleItemRequest {
            SaleItemRequest {
                product_id: product.id,
                branch_office_id: self.warehouse.branch_office_id,
                warehouse_id: self.warehouse.id,
                qty,
                price_list_id: self.list.id,
                price,
            }
        }

        fn sale(&self, items: Vec<SaleItemRequest>, paid: i64) -> SaleRequest {
            SaleRequest {
                items,
                discount: None,
                shipping: 0,
                payments: vec![Payment {
                    method: PaymentMethod::Cash,
                    amount: paid,
                }],
                branch_office_id: self.warehouse.branch_office_id,
                warehouse_id: self.warehouse.id,
                seller_id: self.a.profile_id,
            }
        }

        async fn stock(&self) -> i64 {
            self.bo
                .list_stock_counts(self.a, MovementQuery::default())
                .await
                .unwrap()
                .iter()
                .find(|c| c.key.product_id == self.hammer.id)
                .map(|c| c.stock)
                .unwrap_or(0)
        }
    }

    #[tokio::test]
    async fn one_started_session_per_seller() {
        let t = till().await;
        let opened = t.open().await;
        assert_eq!(opened.status, SessionStatus::Started);

        let err = t
            .bo
            .open_session(
                t.a,
                OpenSession {
                    branch_office_id: t.warehouse.branch_office_id,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BackOfficeError::Conflict(_)));

        t.bo
            .update_session(
                t.a,
                SessionUpdate {
                    status: SessionStatus::Closed,
                    comments: Some("fin de turno".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            t.bo.current_session(t.a).await,
            Err(BackOfficeError::NotFound(_))
        ));
        t.open().await;
    }

    #[tokio::test]
    async fn foreign_branch_cannot_host_a_session() {
        let t = till().await;
        let other = actor();
        let err = t
            .bo
            .open_session(
                other,
                OpenSession {
                    branch_office_id: t.warehouse.branch_office_id,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BackOfficeError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn sale_without_session_is_not_found() {
        let t = till().await;
        let request = t.sale(vec![t.item(&t.hammer, 1, None)], 15_000);
        assert!(matches!(
            t.bo.create_sale(t.a, request).await,
            Err(BackOfficeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn sale_moves_stock_and_feeds_session_totals() {
        let t = till().await;
        t.open().await;

        let common = t
            .bo
            .create_product(
                t.a,
                ProductDraft {
                    category_id: t.hammer.category_id,
                    status: Status::Active,
                    external_name: "Corte de llave".to_string(),
                    internal_name: None,
                    sku: None,
                    model: None,
                    brand: None,
                    color: None,
                    is_common: true,
                },
            )
            .await
            .unwrap()
            .product;

        let mut request = t.sale(
            vec![t.item(&t.hammer, 2, Some(1)), t.item(&common, 1, Some(3_500))],
            40_000,
        );
        request.discount = Some(Discount {
            kind: DiscountKind::Percent,
            amount: 10,
        });
        request.shipping = 500;

        let sale = t.bo.create_sale(t.a, request).await.unwrap();
        // 2 x 150.00 from the list (client price ignored) + 35.00 common line.
        assert_eq!(sale.details.subtotal, 33_500);
        assert_eq!(sale.details.discount_amount, 3_350);
        assert_eq!(sale.total, 30_650);
        assert_eq!(sale.details.change, 9_350);
        assert_eq!(sale.seller_name, "Luis Perez");
        assert_eq!(t.stock().await, 3);

        let movements = t
            .bo
            .list_movements(t.a, MovementQuery::default())
            .await
            .unwrap();
        assert_eq!(movements[0].movement_type, MovementType::Out);
        assert_eq!(movements[0].lot, sale.movement_lot());
        assert_eq!((movements[0].stock_before, movements[0].stock_after), (5, 3));

        let current = t.bo.current_session(t.a).await.unwrap();
        assert_eq!(current.sales.len(), 1);
        assert_eq!(current.session.total_qty, 3);
        assert_eq!(current.session.total_amount, 30_650);
    }

    #[tokio::test]
    async fn cumulative_overdraw_rejects_the_whole_sale() {
        let t = till().await;
        t.open().await;

        let request = t.sale(
            vec![t.item(&t.hammer, 3, None), t.item(&t.hammer, 3, None)],
            100_000,
        );
        match t.bo.create_sale(t.a, request).await {
            Err(BackOfficeError::Validation(msg)) => assert!(msg.starts_with("line 2:")),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(t.stock().await, 5);
        assert!(t.bo.current_session(t.a).await.unwrap().sales.is_empty());
    }

    #[tokio::test]
    async fn short_payment_names_the_expected_total() {
        let t = till().await;
        t.open().await;
        let request = t.sale(vec![t.item(&t.hammer, 1, None)], 10_000);
        match t.bo.create_sale(t.a, request).await {
            Err(BackOfficeError::Validation(msg)) => assert!(msg.contains("15000")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn inactive_seller_cannot_sell() {
        let t = till().await;
        t.open().await;
        t.bo
            .patch_profile(
                t.a,
                t.a.profile_id,
                shopfloor_organization::ProfilePatch {
                    status: Some(Status::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let request = t.sale(vec![t.item(&t.hammer, 1, None)], 15_000);
        assert!(matches!(
            t.bo.create_sale(t.a, request).await,
            Err(BackOfficeError::Validation(_))
        ));
        assert_eq!(t.stock().await, 5);
    }
}
