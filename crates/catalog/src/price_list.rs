use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::{
    DomainError, DomainResult, Entity, OrganizationId, PriceListId, ProductId, require_text,
};

/// Named set of per-product prices. At most one list per organization is the
/// default; the store enforces that when a list is flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceList {
    pub id: PriceListId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriceListDraft {
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PriceListPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

impl PriceList {
    pub fn create(
        organization_id: OrganizationId,
        draft: PriceListDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        require_text("name", &draft.name, 100)?;
        Ok(Self {
            id: PriceListId::new(),
            organization_id,
            name: draft.name.trim().to_string(),
            is_default: draft.is_default,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn patch(&mut self, patch: PriceListPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = patch.name {
            require_text("name", &name, 100)?;
            self.name = name.trim().to_string();
        }
        if let Some(flag) = patch.is_default {
            self.is_default = flag;
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for PriceList {
    type Id = PriceListId;

    fn id(&self) -> PriceListId {
        self.id
    }

    fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }
}

/// Price of one product in one list, in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPrice {
    pub organization_id: OrganizationId,
    pub price_list_id: PriceListId,
    pub product_id: ProductId,
    pub price: i64,
    pub updated_at: DateTime<Utc>,
}

impl ProductPrice {
    pub fn new(
        organization_id: OrganizationId,
        price_list_id: PriceListId,
        product_id: ProductId,
        price: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if price < 0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        Ok(Self {
            organization_id,
            price_list_id,
            product_id,
            price,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_price_is_rejected() {
        let err = ProductPrice::new(
            OrganizationId::new(),
            PriceListId::new(),
            ProductId::new(),
            -1,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn zero_price_is_allowed() {
        assert!(
            ProductPrice::new(OrganizationId::new(), PriceListId::new(), ProductId::new(), 0, Utc::now())
                .is_ok()
        );
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut list = PriceList::create(
            OrganizationId::new(),
            PriceListDraft {
                name: "Mayoreo".to_string(),
                is_default: false,
            },
            Utc::now(),
        )
        .unwrap();

        list.patch(
            PriceListPatch {
                is_default: Some(true),
                ..PriceListPatch::default()
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(list.name, "Mayoreo");
        assert!(list.is_default);
    }
}
