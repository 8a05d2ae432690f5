//! Product lookup for the POS screen.

use std::collections::HashSet;

use serde::Deserialize;

use shopfloor_core::ProductId;

use crate::product::Product;

/// Query string of `GET /pos/filter-products`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, rename = "featured-only")]
    pub featured_only: bool,
}

/// Products a cashier can ring up, ordered by external name.
///
/// A product is sellable when it has a positive price in some list (`priced`)
/// or is a common product.
pub fn sellable_products(
    products: Vec<Product>,
    priced: &HashSet<ProductId>,
    featured: &HashSet<ProductId>,
    query: &ProductQuery,
) -> Vec<Product> {
    let needle = query.query.as_deref().unwrap_or("");
    let mut hits: Vec<Product> = products
        .into_iter()
        .filter(|p| p.is_common || priced.contains(&p.id))
        .filter(|p| !query.featured_only || featured.contains(&p.id))
        .filter(|p| p.matches_text(needle))
        .collect();
    hits.sort_by(|a, b| {
        a.external_name
            .to_lowercase()
            .cmp(&b.external_name.to_lowercase())
    });
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shopfloor_core::{CategoryId, OrganizationId, Status};

    use crate::product::ProductDraft;

    fn product(name: &str, is_common: bool) -> Product {
        Product::create(
            OrganizationId::new(),
            ProductDraft {
                category_id: CategoryId::new(),
                status: Status::Active,
                external_name: name.to_string(),
                internal_name: None,
                sku: None,
                model: None,
                brand: None,
                color: None,
                is_common,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn unpriced_products_are_hidden_unless_common() {
        let priced_one = product("Clavos", false);
        let unpriced = product("Tornillos", false);
        let common = product("Servicio de corte", true);
        let priced = HashSet::from([priced_one.id]);

        let hits = sellable_products(
            vec![unpriced, common.clone(), priced_one.clone()],
            &priced,
            &HashSet::new(),
            &ProductQuery::default(),
        );

        let names: Vec<&str> = hits.iter().map(|p| p.external_name.as_str()).collect();
        assert_eq!(names, vec!["Clavos", "Servicio de corte"]);
    }

    #[test]
    fn featured_only_restricts_results() {
        let a = product("Alambre", true);
        let b = product("Brocha", true);
        let featured = HashSet::from([b.id]);

        let hits = sellable_products(
            vec![a, b.clone()],
            &HashSet::new(),
            &featured,
            &ProductQuery {
                query: None,
                featured_only: true,
            },
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, b.id);
    }

    #[test]
    fn query_string_uses_dashed_flag_name() {
        let q: ProductQuery =
            serde_json::from_str(r#"{"query":"bro","featured-only":true}"#).unwrap();
        assert!(q.featured_only);
        assert_eq!(q.query.as_deref(), Some("bro"));
    }
}
