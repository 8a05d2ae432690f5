use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::{
    CategoryId, DomainResult, Entity, OrganizationId, ProductId, Status, check_len, require_text,
    same_name,
};

/// Catalog product.
///
/// A *common* product is not stock-tracked: the cashier types its price at the
/// register and selling it never touches the stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub organization_id: OrganizationId,
    pub category_id: CategoryId,
    pub status: Status,
    pub external_name: String,
    pub internal_name: Option<String>,
    pub sku: Option<String>,
    pub model: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub is_common: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductDraft {
    pub category_id: CategoryId,
    #[serde(default)]
    pub status: Status,
    pub external_name: String,
    #[serde(default)]
    pub internal_name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_common: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub external_name: Option<String>,
    #[serde(default)]
    pub internal_name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_common: Option<bool>,
}

impl ProductDraft {
    fn normalized(self) -> DomainResult<Self> {
        require_text("external_name", &self.external_name, 150)?;
        let draft = Self {
            external_name: self.external_name.trim().to_string(),
            internal_name: optional("internal_name", self.internal_name, 150)?,
            sku: optional("sku", self.sku, 50)?,
            model: optional("model", self.model, 50)?,
            brand: optional("brand", self.brand, 50)?,
            color: optional("color", self.color, 50)?,
            ..self
        };
        Ok(draft)
    }
}

fn optional(field: &str, value: Option<String>, max: usize) -> DomainResult<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => {
            check_len(field, &v, max)?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}

impl Product {
    pub fn create(
        organization_id: OrganizationId,
        draft: ProductDraft,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let d = draft.normalized()?;
        Ok(Self {
            id: ProductId::new(),
            organization_id,
            category_id: d.category_id,
            status: d.status,
            external_name: d.external_name,
            internal_name: d.internal_name,
            sku: d.sku,
            model: d.model,
            brand: d.brand,
            color: d.color,
            is_common: d.is_common,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn replace(&mut self, draft: ProductDraft, now: DateTime<Utc>) -> DomainResult<()> {
        let d = draft.normalized()?;
        self.category_id = d.category_id;
        self.status = d.status;
        self.external_name = d.external_name;
        self.internal_name = d.internal_name;
        self.sku = d.sku;
        self.model = d.model;
        self.brand = d.brand;
        self.color = d.color;
        self.is_common = d.is_common;
        self.updated_at = now;
        Ok(())
    }

    /// Draft equivalent to this product with `patch` laid over it.
    pub fn patched(&self, patch: ProductPatch) -> ProductDraft {
        ProductDraft {
            category_id: patch.category_id.unwrap_or(self.category_id),
            status: patch.status.unwrap_or(self.status),
            external_name: patch.external_name.unwrap_or_else(|| self.external_name.clone()),
            internal_name: patch.internal_name.or_else(|| self.internal_name.clone()),
            sku: patch.sku.or_else(|| self.sku.clone()),
            model: patch.model.or_else(|| self.model.clone()),
            brand: patch.brand.or_else(|| self.brand.clone()),
            color: patch.color.or_else(|| self.color.clone()),
            is_common: patch.is_common.unwrap_or(self.is_common),
        }
    }

    pub fn has_sku(&self, sku: &str) -> bool {
        self.sku.as_deref().is_some_and(|own| same_name(own, sku))
    }

    /// Case-insensitive substring match over the searchable text fields.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            Some(self.external_name.as_str()),
            self.internal_name.as_deref(),
            self.sku.as_deref(),
            self.model.as_deref(),
            self.brand.as_deref(),
            self.color.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
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

    fn draft() -> ProductDraft {
        ProductDraft {
            category_id: CategoryId::new(),
            status: Status::Active,
            external_name: "Martillo de uña 16oz".to_string(),
            internal_name: Some("MART-16".to_string()),
            sku: Some("  750100200300 ".to_string()),
            model: None,
            brand: Some("Truper".to_string()),
            color: Some("".to_string()),
            is_common: false,
        }
    }

    #[test]
    fn create_normalizes_optional_text() {
        let p = Product::create(OrganizationId::new(), draft(), Utc::now()).unwrap();
        assert_eq!(p.sku.as_deref(), Some("750100200300"));
        assert_eq!(p.color, None);
    }

    #[test]
    fn external_name_is_required() {
        let mut d = draft();
        d.external_name = "  ".to_string();
        assert!(matches!(
            Product::create(OrganizationId::new(), d, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn patch_keeps_existing_values() {
        let p = Product::create(OrganizationId::new(), draft(), Utc::now()).unwrap();
        let next = p.patched(ProductPatch {
            color: Some("Rojo".to_string()),
            ..ProductPatch::default()
        });
        assert_eq!(next.external_name, p.external_name);
        assert_eq!(next.brand, p.brand);
        assert_eq!(next.color.as_deref(), Some("Rojo"));
        assert_eq!(next.is_common, p.is_common);
    }

    #[test]
    fn text_match_covers_brand_and_sku() {
        let p = Product::create(OrganizationId::new(), draft(), Utc::now()).unwrap();
        assert!(p.matches_text("truper"));
        assert!(p.matches_text("0200"));
        assert!(p.matches_text(""));
        assert!(!p.matches_text("desarmador"));
    }

    #[test]
    fn sku_comparison_ignores_case() {
        let mut d = draft();
        d.sku = Some("abc-1".to_string());
        let p = Product::create(OrganizationId::new(), d, Utc::now()).unwrap();
        assert!(p.has_sku("ABC-1"));
    }
}
