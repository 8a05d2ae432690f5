//! POS sale: request shape, checkout rules and the recorded sale.
//!
//! Checkout is pure. The caller loads every record the request references into
//! [`SaleFacts`], runs [`checkout`], and commits the resulting [`Sale`] together
//! with one OUT stock movement per stock-tracked line.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::{
    BranchOfficeId, DomainError, DomainResult, Entity, OrganizationId, PosSessionId, PriceListId,
    ProductId, ProfileId, SaleId, WarehouseId,
};

use crate::session::PosSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `amount` is in cents.
    Fixed,
    /// `amount` is a whole percentage of the subtotal.
    Percent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Discount {
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Cash,
    /// Interbank electronic transfer.
    Spei,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Payment {
    pub method: PaymentMethod,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaleItemRequest {
    pub product_id: ProductId,
    pub branch_office_id: BranchOfficeId,
    pub warehouse_id: WarehouseId,
    pub qty: i64,
    pub price_list_id: PriceListId,
    /// Only honored for common products; listed products take the list price.
    #[serde(default)]
    pub price: Option<i64>,
}

/// Body of `POST /pos/sale`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SaleRequest {
    pub items: Vec<SaleItemRequest>,
    #[serde(default)]
    pub discount: Option<Discount>,
    #[serde(default)]
    pub shipping: i64,
    pub payments: Vec<Payment>,
    pub branch_office_id: BranchOfficeId,
    pub warehouse_id: WarehouseId,
    pub seller_id: ProfileId,
}

impl SaleRequest {
    /// Checks that need no lookups.
    pub fn validate_shape(&self) -> DomainResult<()> {
        if let Some(discount) = &self.discount {
            if discount.amount <= 0 {
                return Err(DomainError::validation("discount amount must be greater than zero"));
            }
            if discount.kind == DiscountKind::Percent && discount.amount > 100 {
                return Err(DomainError::validation("percent discount cannot exceed 100"));
            }
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("a sale needs at least one item"));
        }
        if self.payments.is_empty() {
            return Err(DomainError::validation("a sale needs at least one payment"));
        }
        if let Some(i) = self.payments.iter().position(|p| p.amount <= 0) {
            return Err(DomainError::validation(format!(
                "payment {}: amount must be greater than zero",
                i + 1
            )));
        }
        Ok(())
    }

    pub fn branch_office_ids(&self) -> HashSet<BranchOfficeId> {
        std::iter::once(self.branch_office_id)
            .chain(self.items.iter().map(|i| i.branch_office_id))
            .collect()
    }

    pub fn warehouse_ids(&self) -> HashSet<WarehouseId> {
        std::iter::once(self.warehouse_id)
            .chain(self.items.iter().map(|i| i.warehouse_id))
            .collect()
    }

    pub fn product_ids(&self) -> HashSet<ProductId> {
        self.items.iter().map(|i| i.product_id).collect()
    }

    pub fn price_keys(&self) -> HashSet<(PriceListId, ProductId)> {
        self.items
            .iter()
            .map(|i| (i.price_list_id, i.product_id))
            .collect()
    }

    pub fn stock_keys(&self) -> HashSet<(WarehouseId, ProductId)> {
        self.items
            .iter()
            .map(|i| (i.warehouse_id, i.product_id))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFacts {
    pub external_name: String,
    pub is_common: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerFacts {
    pub full_name: String,
    pub active: bool,
}

/// Everything a checkout needs to know about the records a request references,
/// restricted to the caller's organization. Absent keys mean "does not exist".
#[derive(Debug, Clone, Default)]
pub struct SaleFacts {
    pub branch_offices: HashSet<BranchOfficeId>,
    /// Warehouse → branch office it belongs to.
    pub warehouses: HashMap<WarehouseId, BranchOfficeId>,
    pub products: HashMap<ProductId, ProductFacts>,
    pub stock: HashMap<(WarehouseId, ProductId), i64>,
    pub prices: HashMap<(PriceListId, ProductId), i64>,
    pub seller: Option<SellerFacts>,
}

/// A priced sale line as stored in the sale details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub branch_office_id: BranchOfficeId,
    pub warehouse_id: WarehouseId,
    pub price_list_id: PriceListId,
    pub qty: i64,
    pub price: i64,
    pub amount: i64,
    pub is_common: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDetails {
    pub items: Vec<SaleLine>,
    pub discount: Option<Discount>,
    pub payments: Vec<Payment>,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub shipping: i64,
    pub paid: i64,
    pub change: i64,
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub details: SaleDetails,
    pub total: i64,
    pub seller_name: String,
}

fn line_error(line: usize, msg: impl core::fmt::Display) -> DomainError {
    DomainError::validation(format!("line {line}: {msg}"))
}

/// The sale's own branch office and warehouse: both in the organization and
/// the warehouse owned by the branch office.
fn check_sale_location(facts: &SaleFacts, request: &SaleRequest) -> DomainResult<()> {
    if !facts.branch_offices.contains(&request.branch_office_id) {
        return Err(DomainError::validation(
            "branch office does not belong to the organization",
        ));
    }
    match facts.warehouses.get(&request.warehouse_id) {
        None => Err(DomainError::validation(
            "warehouse does not belong to the organization",
        )),
        Some(owner) if *owner != request.branch_office_id => Err(DomainError::validation(
            "warehouse does not belong to the branch office",
        )),
        Some(_) => Ok(()),
    }
}

/// A line selling from another branch office only needs that branch office
/// and its warehouse to exist in the organization.
fn check_line_location(
    facts: &SaleFacts,
    request: &SaleRequest,
    item: &SaleItemRequest,
    line: usize,
) -> DomainResult<()> {
    if item.branch_office_id == request.branch_office_id {
        return Ok(());
    }
    if !facts.branch_offices.contains(&item.branch_office_id) {
        return Err(line_error(line, "branch office does not belong to the organization"));
    }
    if !facts.warehouses.contains_key(&item.warehouse_id) {
        return Err(line_error(line, "warehouse does not belong to the organization"));
    }
    Ok(())
}

/// Validate and price a sale.
pub fn checkout(request: &SaleRequest, facts: &SaleFacts) -> DomainResult<Checkout> {
    request.validate_shape()?;
    check_sale_location(facts, request)?;

    let mut lines = Vec::with_capacity(request.items.len());
    let mut requested: HashMap<(WarehouseId, ProductId), i64> = HashMap::new();

    for (idx, item) in request.items.iter().enumerate() {
        let n = idx + 1;
        check_line_location(facts, request, item, n)?;
        if item.qty <= 0 {
            return Err(line_error(n, "qty must be greater than zero"));
        }
        let product = facts
            .products
            .get(&item.product_id)
            .ok_or_else(|| line_error(n, "product does not belong to the organization"))?;

        let price = if product.is_common {
            match item.price {
                Some(p) if p > 0 => p,
                _ => return Err(line_error(n, "a common product needs a price greater than zero")),
            }
        } else {
            let key = (item.warehouse_id, item.product_id);
            let wanted = requested.entry(key).or_insert(0);
            *wanted = wanted.saturating_add(item.qty);
            let on_hand = facts.stock.get(&key).copied().unwrap_or(0);
            if *wanted > on_hand {
                return Err(line_error(
                    n,
                    format!("insufficient stock ({on_hand} on hand, {wanted} requested)"),
                ));
            }
            *facts
                .prices
                .get(&(item.price_list_id, item.product_id))
                .ok_or_else(|| line_error(n, "product has no price in the price list"))?
        };

        let amount = item
            .qty
            .checked_mul(price)
            .ok_or_else(|| line_error(n, "amount overflow"))?;

        lines.push(SaleLine {
            product_id: item.product_id,
            product_name: product.external_name.clone(),
            branch_office_id: item.branch_office_id,
            warehouse_id: item.warehouse_id,
            price_list_id: item.price_list_id,
            qty: item.qty,
            price,
            amount,
            is_common: product.is_common,
        });
    }

    if request.shipping < 0 {
        return Err(DomainError::validation("shipping cannot be negative"));
    }

    let subtotal = lines
        .iter()
        .try_fold(0i64, |acc, l| acc.checked_add(l.amount))
        .ok_or_else(|| DomainError::validation("subtotal overflow"))?;
    let discount_amount = match &request.discount {
        None => 0,
        Some(d) => match d.kind {
            DiscountKind::Fixed => d.amount,
            DiscountKind::Percent => subtotal.saturating_mul(d.amount) / 100,
        }
        .min(subtotal),
    };
    let total = (subtotal - discount_amount)
        .checked_add(request.shipping)
        .ok_or_else(|| DomainError::validation("total overflow"))?;
    let paid = request
        .payments
        .iter()
        .try_fold(0i64, |acc, p| acc.checked_add(p.amount))
        .ok_or_else(|| DomainError::validation("payments overflow"))?;
    if paid < total {
        return Err(DomainError::validation(format!(
            "payments ({paid}) do not cover the sale total; expected at least {total}"
        )));
    }

    let seller = match &facts.seller {
        Some(s) if s.active => s,
        Some(_) => return Err(DomainError::validation("seller is not active")),
        None => return Err(DomainError::validation("seller does not belong to the organization")),
    };

    Ok(Checkout {
        details: SaleDetails {
            items: lines,
            discount: request.discount.clone(),
            payments: request.payments.clone(),
            subtotal,
            discount_amount,
            shipping: request.shipping,
            paid,
            change: paid - total,
        },
        total,
        seller_name: seller.full_name.clone(),
    })
}

/// A committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub organization_id: OrganizationId,
    pub branch_office_id: BranchOfficeId,
    pub warehouse_id: WarehouseId,
    pub pos_session_id: PosSessionId,
    pub seller_id: ProfileId,
    pub seller_name: String,
    pub details: SaleDetails,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    pub fn record(
        session: &PosSession,
        request: &SaleRequest,
        checkout: Checkout,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SaleId::new(),
            organization_id: session.organization_id,
            branch_office_id: request.branch_office_id,
            warehouse_id: request.warehouse_id,
            pos_session_id: session.id,
            seller_id: request.seller_id,
            seller_name: checkout.seller_name,
            details: checkout.details,
            total: checkout.total,
            created_at: now,
        }
    }

    pub fn total_qty(&self) -> i64 {
        self.details.items.iter().map(|l| l.qty).sum()
    }

    /// Lines that leave stock (everything except common products).
    pub fn stock_lines(&self) -> impl Iterator<Item = &SaleLine> {
        self.details.items.iter().filter(|l| !l.is_common)
    }

    /// Lot written on the OUT movements of this sale.
    pub fn movement_lot(&self) -> String {
        format!("Sale #{}", self.id)
    }
}

impl Entity for Sale {
    type Id = SaleId;

    fn id(&self) -> SaleId {
        self.id
    }

    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Shop {
        branch: BranchOfficeId,
        warehouse: WarehouseId,
        list: PriceListId,
        hammer: ProductId,
        cutting: ProductId,
        seller: ProfileId,
        facts: SaleFacts,
    }

    fn shop() -> Shop {
        let branch = BranchOfficeId::new();
        let warehouse = WarehouseId::new();
        let list = PriceListId::new();
        let hammer = ProductId::new();
        let cutting = ProductId::new();
        let facts = SaleFacts {
            branch_offices: HashSet::from([branch]),
            warehouses: HashMap::from([(warehouse, branch)]),
            products: HashMap::from([
                (
                    hammer,
                    ProductFacts {
                        external_name: "Martillo".to_string(),
                        is_common: false,
                    },
                ),
                (
                    cutting,
                    ProductFacts {
                        external_name: "Corte de llave".to_string(),
                        is_common: true,
                    },
                ),
            ]),
            stock: HashMap::from([((warehouse, hammer), 5)]),
            prices: HashMap::from([((list, hammer), 15_000)]),
            seller: Some(SellerFacts {
                full_name: "Luis Perez".to_string(),
                active: true,
            }),
        };
        Shop {
            branch,
            warehouse,
            list,
            hammer,
            cutting,
            seller: ProfileId::new(),
            facts,
        }
    }

    fn item(s: &Shop, product: ProductId, qty: i64, price: Option<i64>) -> SaleItemRequest {
        SaleItemRequest {
            product_id: product,
            branch_office_id: s.branch,
            warehouse_id: s.warehouse,
            qty,
            price_list_id: s.list,
            price,
        }
    }

    fn request(s: &Shop, items: Vec<SaleItemRequest>, paid: i64) -> SaleRequest {
        SaleRequest {
            items,
            discount: None,
            shipping: 0,
            payments: vec![Payment {
                method: PaymentMethod::Cash,
                amount: paid,
            }],
            branch_office_id: s.branch,
            warehouse_id: s.warehouse,
            seller_id: s.seller,
        }
    }

    fn validation_message(result: DomainResult<Checkout>) -> String {
        match result {
            Err(DomainError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn listed_product_takes_list_price_and_ignores_client_price() {
        let s = shop();
        let req = request(&s, vec![item(&s, s.hammer, 2, Some(1))], 50_000);

        let out = checkout(&req, &s.facts).unwrap();

        assert_eq!(out.details.items[0].price, 15_000);
        assert_eq!(out.details.items[0].product_name, "Martillo");
        assert_eq!(out.total, 30_000);
        assert_eq!(out.details.change, 20_000);
        assert_eq!(out.seller_name, "Luis Perez");
    }

    #[test]
    fn common_product_uses_client_price_and_skips_stock() {
        let s = shop();
        let req = request(&s, vec![item(&s, s.cutting, 3, Some(2_500))], 7_500);

        let out = checkout(&req, &s.facts).unwrap();
        assert_eq!(out.total, 7_500);
        assert!(out.details.items[0].is_common);
    }

    #[test]
    fn common_product_without_price_is_rejected() {
        let s = shop();
        let req = request(&s, vec![item(&s, s.cutting, 1, None)], 100);
        assert!(validation_message(checkout(&req, &s.facts)).starts_with("line 1"));
    }

    #[test]
    fn stock_is_checked_cumulatively_across_lines() {
        let s = shop();
        let req = request(
            &s,
            vec![item(&s, s.hammer, 3, None), item(&s, s.hammer, 3, None)],
            1_000_000,
        );
        let msg = validation_message(checkout(&req, &s.facts));
        assert!(msg.starts_with("line 2"));
        assert!(msg.contains("insufficient stock"));
    }

    #[test]
    fn missing_list_price_is_rejected() {
        let mut s = shop();
        s.facts.prices.clear();
        let req = request(&s, vec![item(&s, s.hammer, 1, None)], 1_000_000);
        assert!(validation_message(checkout(&req, &s.facts)).contains("no price"));
    }

    #[test]
    fn underpayment_names_the_expected_total() {
        let s = shop();
        let mut req = request(&s, vec![item(&s, s.hammer, 1, None)], 10_000);
        req.shipping = 500;
        let msg = validation_message(checkout(&req, &s.facts));
        assert!(msg.contains("15500"));
    }

    #[test]
    fn discount_reduces_total_and_is_capped() {
        let s = shop();
        let mut req = request(&s, vec![item(&s, s.hammer, 2, None)], 30_000);
        req.discount = Some(Discount {
            kind: DiscountKind::Percent,
            amount: 10,
        });
        let out = checkout(&req, &s.facts).unwrap();
        assert_eq!(out.details.discount_amount, 3_000);
        assert_eq!(out.total, 27_000);

        req.discount = Some(Discount {
            kind: DiscountKind::Fixed,
            amount: 1_000_000,
        });
        let out = checkout(&req, &s.facts).unwrap();
        assert_eq!(out.details.discount_amount, 30_000);
        assert_eq!(out.total, 0);
    }

    #[test]
    fn shape_errors_come_first() {
        let s = shop();
        let mut req = request(&s, vec![], 100);
        assert!(validation_message(checkout(&req, &s.facts)).contains("at least one item"));

        req.items = vec![item(&s, s.hammer, 1, None)];
        req.discount = Some(Discount {
            kind: DiscountKind::Fixed,
            amount: 0,
        });
        assert!(validation_message(checkout(&req, &s.facts)).contains("discount"));
    }

    #[test]
    fn warehouse_of_another_branch_is_rejected() {
        let mut s = shop();
        let other_branch = BranchOfficeId::new();
        s.facts.branch_offices.insert(other_branch);
        let req = SaleRequest {
            branch_office_id: other_branch,
            ..request(&s, vec![item(&s, s.hammer, 1, None)], 100_000)
        };
        assert!(validation_message(checkout(&req, &s.facts)).contains("branch office"));
    }

    #[test]
    fn line_location_is_only_checked_when_its_branch_differs() {
        let mut s = shop();
        let second_branch = BranchOfficeId::new();
        let second_warehouse = WarehouseId::new();
        s.facts.branch_offices.insert(second_branch);
        s.facts.warehouses.insert(second_warehouse, second_branch);
        s.facts.stock.insert((second_warehouse, s.hammer), 2);

        // Same branch as the sale, warehouse owned by another branch office.
        let same_branch = SaleItemRequest {
            warehouse_id: second_warehouse,
            ..item(&s, s.hammer, 1, None)
        };
        // Other branch office, warehouse owned by the sale's branch office.
        let other_branch = SaleItemRequest {
            branch_office_id: second_branch,
            ..item(&s, s.hammer, 1, None)
        };
        let req = request(&s, vec![same_branch, other_branch], 100_000);
        let done = checkout(&req, &s.facts).unwrap();
        assert_eq!(done.details.items.len(), 2);
    }

    #[test]
    fn line_from_unknown_branch_office_names_the_line() {
        let s = shop();
        let foreign = SaleItemRequest {
            branch_office_id: BranchOfficeId::new(),
            ..item(&s, s.hammer, 1, None)
        };
        let req = request(&s, vec![item(&s, s.hammer, 1, None), foreign], 100_000);
        let msg = validation_message(checkout(&req, &s.facts));
        assert!(msg.starts_with("line 2:"), "{msg}");
        assert!(msg.contains("branch office"));

        let mut s = shop();
        let second_branch = BranchOfficeId::new();
        s.facts.branch_offices.insert(second_branch);
        let unknown_warehouse = SaleItemRequest {
            branch_office_id: second_branch,
            warehouse_id: WarehouseId::new(),
            ..item(&s, s.hammer, 1, None)
        };
        let req = request(&s, vec![unknown_warehouse], 100_000);
        assert!(validation_message(checkout(&req, &s.facts)).contains("line 1: warehouse"));
    }

    #[test]
    fn inactive_or_unknown_seller_is_rejected() {
        let mut s = shop();
        let req = request(&s, vec![item(&s, s.hammer, 1, None)], 100_000);

        s.facts.seller = Some(SellerFacts {
            full_name: "X".to_string(),
            active: false,
        });
        assert!(validation_message(checkout(&req, &s.facts)).contains("not active"));

        s.facts.seller = None;
        assert!(validation_message(checkout(&req, &s.facts)).contains("seller"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let body = serde_json::json!({
            "items": [],
            "payments": [],
            "branch_office_id": BranchOfficeId::new(),
            "warehouse_id": WarehouseId::new(),
            "seller_id": ProfileId::new(),
            "coupon": "FREE",
        });
        assert!(serde_json::from_value::<SaleRequest>(body).is_err());
    }

    #[test]
    fn sale_lot_and_stock_lines() {
        let s = shop();
        let req = request(
            &s,
            vec![item(&s, s.hammer, 2, None), item(&s, s.cutting, 1, Some(100))],
            1_000_000,
        );
        let out = checkout(&req, &s.facts).unwrap();
        let session = PosSession::open(OrganizationId::new(), s.branch, s.seller, Utc::now());
        let sale = Sale::record(&session, &req, out, Utc::now());

        assert_eq!(sale.total_qty(), 3);
        assert_eq!(sale.stock_lines().count(), 1);
        assert_eq!(sale.movement_lot(), format!("Sale #{}", sale.id));
        assert_eq!(sale.pos_session_id, session.id);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// total = subtotal - discount + shipping, change = paid - total, and
        /// the discount never exceeds the subtotal.
        #[test]
        fn totals_are_consistent(
            prices in prop::collection::vec(1i64..100_000, 1..6),
            pct in 1i64..=100,
            shipping in 0i64..10_000,
        ) {
            let s = shop();
            let items: Vec<_> = prices.iter().map(|p| item(&s, s.cutting, 1, Some(*p))).collect();
            let mut req = request(&s, items, i64::MAX / 4);
            req.shipping = shipping;
            req.discount = Some(Discount { kind: DiscountKind::Percent, amount: pct });

            let out = checkout(&req, &s.facts).unwrap();
            let d = &out.details;

            prop_assert_eq!(d.subtotal, prices.iter().sum::<i64>());
            prop_assert!(d.discount_amount <= d.subtotal);
            prop_assert_eq!(out.total, d.subtotal - d.discount_amount + shipping);
            prop_assert_eq!(d.change, d.paid - out.total);
            prop_assert!(out.total >= 0);
        }
    }
}
