use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use shopfloor_catalog::{
    Category, CategoryDraft, CategoryPatch, PriceList, PriceListDraft, PriceListPatch, Product,
    ProductDraft, ProductPatch, ProductPrice, ProductQuery, relevel_descendants,
    sellable_products,
};
use shopfloor_core::{BranchOfficeId, CategoryId, PriceListId, ProductId, WarehouseId};
use shopfloor_organization::BranchOffice;

use super::{Actor, BackOffice, BackOfficeError, BackOfficeResult};
use crate::store::{self, FeaturedProduct, PriceFilter, StockFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WarehouseStock {
    pub warehouse_id: WarehouseId,
    pub stock: i64,
}

/// A product with its stock per warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub stock: Vec<WarehouseStock>,
    pub total_stock: i64,
    pub featured: bool,
}

/// Body of `PATCH /price-lists/price`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetPrice {
    pub price_list_id: PriceListId,
    pub product_id: ProductId,
    pub price: i64,
}

impl BackOffice {
    // Categories.

    pub async fn create_category(
        &self,
        actor: Actor,
        draft: CategoryDraft,
    ) -> BackOfficeResult<Category> {
        let parent = match draft.parent_id {
            Some(id) => store::load::<Category>(self.store(), actor.organization_id, id).await?,
            None => None,
        };
        let category = Category::create(actor.organization_id, draft, parent.as_ref(), self.now())?;
        store::save(self.store(), &category).await?;
        Ok(category)
    }

    pub async fn list_categories(&self, actor: Actor) -> BackOfficeResult<Vec<Category>> {
        Ok(store::load_all(self.store(), actor.organization_id).await?)
    }

    pub async fn get_category(&self, actor: Actor, id: CategoryId) -> BackOfficeResult<Category> {
        self.find(actor.organization_id, id, "category").await
    }

    pub async fn patch_category(
        &self,
        actor: Actor,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> BackOfficeResult<Category> {
        let current: Category = self.find(actor.organization_id, id, "category").await?;
        let draft = CategoryDraft {
            name: patch.name.unwrap_or_else(|| current.name.clone()),
            status: patch.status.unwrap_or(current.status),
            parent_id: patch.parent_id.unwrap_or(current.parent_id),
        };
        self.replace_category(actor, id, draft).await
    }

    /// Rewrites the category and re-levels its subtree in one write.
    pub async fn replace_category(
        &self,
        actor: Actor,
        id: CategoryId,
        draft: CategoryDraft,
    ) -> BackOfficeResult<Category> {
        let all: Vec<Category> = store::load_all(self.store(), actor.organization_id).await?;
        let mut category = all
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| BackOfficeError::NotFound("category".to_string()))?;

        let now = self.now();
        category.update(draft.name, draft.status, draft.parent_id, &all, now)?;

        let mut changed = vec![category.clone()];
        changed.extend(relevel_descendants(&category, &all, now));
        store::save_all(self.store(), actor.organization_id, &changed).await?;
        Ok(category)
    }

    pub async fn delete_category(&self, actor: Actor, id: CategoryId) -> BackOfficeResult<()> {
        let all: Vec<Category> = store::load_all(self.store(), actor.organization_id).await?;
        if !all.iter().any(|c| c.id == id) {
            return Err(BackOfficeError::NotFound("category".to_string()));
        }
        if all.iter().any(|c| c.parent_id == Some(id)) {
            return Err(BackOfficeError::InvariantViolation(
                "category still has child categories".to_string(),
            ));
        }
        let products: Vec<Product> = store::load_all(self.store(), actor.organization_id).await?;
        if products.iter().any(|p| p.category_id == id) {
            return Err(BackOfficeError::InvariantViolation(
                "category still has products".to_string(),
            ));
        }
        store::remove::<Category>(self.store(), actor.organization_id, id).await?;
        Ok(())
    }

    // Products.

    async fn check_product_draft(
        &self,
        actor: Actor,
        draft: &ProductDraft,
        except: Option<ProductId>,
    ) -> BackOfficeResult<()> {
        let _: Category = self
            .referenced(actor.organization_id, draft.category_id, "category")
            .await?;
        if let Some(sku) = draft.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let all: Vec<Product> = store::load_all(self.store(), actor.organization_id).await?;
            if all.iter().any(|p| Some(p.id) != except && p.has_sku(sku)) {
                return Err(BackOfficeError::Conflict(format!(
                    "a product with sku '{sku}' already exists"
                )));
            }
        }
        Ok(())
    }

    async fn product_views(
        &self,
        actor: Actor,
        products: Vec<Product>,
    ) -> BackOfficeResult<Vec<ProductView>> {
        let counts = self
            .store()
            .stock_counts(actor.organization_id, StockFilter::default())
            .await?;
        let featured = store::featured_ids(self.store(), actor.organization_id).await?;

        let mut by_product: HashMap<ProductId, Vec<WarehouseStock>> = HashMap::new();
        for c in counts {
            by_product
                .entry(c.key.product_id)
                .or_default()
                .push(WarehouseStock {
                    warehouse_id: c.key.warehouse_id,
                    stock: c.stock,
                });
        }

        Ok(products
            .into_iter()
            .map(|product| {
                let stock = by_product.remove(&product.id).unwrap_or_default();
                let total_stock = stock.iter().map(|s| s.stock).sum();
                let featured = featured.contains(&product.id);
                ProductView {
                    product,
                    stock,
                    total_stock,
                    featured,
                }
            })
            .collect())
    }

    async fn product_view(&self, actor: Actor, product: Product) -> BackOfficeResult<ProductView> {
        let mut views = self.product_views(actor, vec![product]).await?;
        views
            .pop()
            .ok_or_else(|| BackOfficeError::NotFound("product".to_string()))
    }

    pub async fn create_product(
        &self,
        actor: Actor,
        draft: ProductDraft,
    ) -> BackOfficeResult<ProductView> {
        self.check_product_draft(actor, &draft, None).await?;
        let product = Product::create(actor.organization_id, draft, self.now())?;
        store::save(self.store(), &product).await?;
        self.product_view(actor, product).await
    }

    pub async fn list_products(
        &self,
        actor: Actor,
        query: Option<&str>,
    ) -> BackOfficeResult<Vec<ProductView>> {
        let all: Vec<Product> = store::load_all(self.store(), actor.organization_id).await?;
        let needle = query.unwrap_or("");
        let hits = all.into_iter().filter(|p| p.matches_text(needle)).collect();
        self.product_views(actor, hits).await
    }

    pub async fn get_product(&self, actor: Actor, id: ProductId) -> BackOfficeResult<ProductView> {
        let product: Product = self.find(actor.organization_id, id, "product").await?;
        self.product_view(actor, product).await
    }

    pub async fn patch_product(
        &self,
        actor: Actor,
        id: ProductId,
        patch: ProductPatch,
    ) -> BackOfficeResult<ProductView> {
        let current: Product = self.find(actor.organization_id, id, "product").await?;
        let draft = current.patched(patch);
        self.replace_product(actor, id, draft).await
    }

    pub async fn replace_product(
        &self,
        actor: Actor,
        id: ProductId,
        draft: ProductDraft,
    ) -> BackOfficeResult<ProductView> {
        let mut product: Product = self.find(actor.organization_id, id, "product").await?;
        self.check_product_draft(actor, &draft, Some(id)).await?;
        product.replace(draft, self.now())?;
        store::save(self.store(), &product).await?;
        self.product_view(actor, product).await
    }

    pub async fn delete_product(&self, actor: Actor, id: ProductId) -> BackOfficeResult<()> {
        if !self.store().delete_product(actor.organization_id, id).await? {
            return Err(BackOfficeError::NotFound("product".to_string()));
        }
        tracing::info!(organization_id = %actor.organization_id, product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn feature_product(
        &self,
        actor: Actor,
        id: ProductId,
        branch_office_id: Option<BranchOfficeId>,
    ) -> BackOfficeResult<()> {
        let _: Product = self.find(actor.organization_id, id, "product").await?;
        if let Some(branch) = branch_office_id {
            let _: BranchOffice = self
                .referenced(actor.organization_id, branch, "branch office")
                .await?;
        }
        self.store()
            .set_featured(
                actor.organization_id,
                FeaturedProduct {
                    product_id: id,
                    branch_office_id,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn unfeature_product(&self, actor: Actor, id: ProductId) -> BackOfficeResult<()> {
        let _: Product = self.find(actor.organization_id, id, "product").await?;
        self.store().unset_featured(actor.organization_id, id).await?;
        Ok(())
    }

    /// Products a cashier can sell right now.
    pub async fn filter_products(
        &self,
        actor: Actor,
        query: &ProductQuery,
    ) -> BackOfficeResult<Vec<Product>> {
        let products: Vec<Product> = store::load_all(self.store(), actor.organization_id).await?;
        let priced: HashSet<ProductId> = self
            .store()
            .prices(actor.organization_id, PriceFilter::default())
            .await?
            .into_iter()
            .filter(|p| p.price > 0)
            .map(|p| p.product_id)
            .collect();
        let featured = store::featured_ids(self.store(), actor.organization_id).await?;
        Ok(sellable_products(products, &priced, &featured, query))
    }

    // Price lists.

    pub async fn create_price_list(
        &self,
        actor: Actor,
        draft: PriceListDraft,
    ) -> BackOfficeResult<PriceList> {
        let list = PriceList::create(actor.organization_id, draft, self.now())?;
        self.store().save_price_list(&list).await?;
        Ok(list)
    }

    pub async fn list_price_lists(&self, actor: Actor) -> BackOfficeResult<Vec<PriceList>> {
        Ok(store::load_all(self.store(), actor.organization_id).await?)
    }

    pub async fn get_price_list(&self, actor: Actor, id: PriceListId) -> BackOfficeResult<PriceList> {
        self.find(actor.organization_id, id, "price list").await
    }

    pub async fn patch_price_list(
        &self,
        actor: Actor,
        id: PriceListId,
        patch: PriceListPatch,
    ) -> BackOfficeResult<PriceList> {
        let mut list: PriceList = self.find(actor.organization_id, id, "price list").await?;
        list.patch(patch, self.now())?;
        self.store().save_price_list(&list).await?;
        Ok(list)
    }

    pub async fn delete_price_list(&self, actor: Actor, id: PriceListId) -> BackOfficeResult<()> {
        if !self.store().delete_price_list(actor.organization_id, id).await? {
            return Err(BackOfficeError::NotFound("price list".to_string()));
        }
        Ok(())
    }

    pub async fn set_price(&self, actor: Actor, input: SetPrice) -> BackOfficeResult<ProductPrice> {
        let price = ProductPrice::new(
            actor.organization_id,
            input.price_list_id,
            input.product_id,
            input.price,
            self.now(),
        )?;
        let _: PriceList = self
            .referenced(actor.organization_id, input.price_list_id, "price list")
            .await?;
        let _: Product = self
            .referenced(actor.organization_id, input.product_id, "product")
            .await?;
        self.store().set_price(price.clone()).await?;
        Ok(price)
    }

    pub async fn list_prices(
        &self,
        actor: Actor,
        price_list_id: PriceListId,
    ) -> BackOfficeResult<Vec<ProductPrice>> {
        let _: PriceList = self
            .find(actor.organization_id, price_list_id, "price list")
            .await?;
        Ok(self
            .store()
            .prices(
                actor.organization_id,
                PriceFilter {
                    price_list_id: Some(price_list_id),
                    product_id: None,
                },
            )
            .await?)
    }
}
