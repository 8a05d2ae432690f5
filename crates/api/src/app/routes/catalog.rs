use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, put},
};

use shopfloor_catalog::{CategoryDraft, CategoryPatch, ProductDraft, ProductPatch};
use shopfloor_core::{CategoryId, ProductId};

use crate::app::dto::{self, ValidJson, ValidQuery};
use crate::app::errors;
use crate::app::routes::common::{self, CmdAuth};
use crate::app::services::AppServices;
use crate::authz::perms;
use crate::context::{OrganizationContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category)
                .patch(patch_category)
                .put(replace_category)
                .delete(delete_category),
        )
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product)
                .patch(patch_product)
                .put(replace_product)
                .delete(delete_product),
        )
        .route(
            "/products/:id/featured",
            put(feature_product).delete(unfeature_product),
        )
}

// -------------------------
// Categories
// -------------------------

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<CategoryDraft>, Response>,
) -> Response {
    let draft = match CmdAuth::new(body, perms::CATALOG_WRITE).authorize_body(&org, &principal) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .create_category(principal.actor(&org), draft)
        .await;
    common::reply(StatusCode::CREATED, result)
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::CATALOG_READ) {
        return resp;
    }
    let result = services
        .back_office()
        .list_categories(principal.actor(&org))
        .await;
    common::reply(StatusCode::OK, result.map(dto::items))
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::CATALOG_READ) {
        return resp;
    }
    let id: CategoryId = match dto::parse_id(&id, "category") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .get_category(principal.actor(&org), id)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn patch_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<ValidJson<CategoryPatch>, Response>,
) -> Response {
    let patch = match CmdAuth::new(body, perms::CATALOG_WRITE).authorize_body(&org, &principal) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let id: CategoryId = match dto::parse_id(&id, "category") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .patch_category(principal.actor(&org), id, patch)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn replace_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<ValidJson<CategoryDraft>, Response>,
) -> Response {
    let draft = match CmdAuth::new(body, perms::CATALOG_WRITE).authorize_body(&org, &principal) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let id: CategoryId = match dto::parse_id(&id, "category") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .replace_category(principal.actor(&org), id, draft)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::CATALOG_WRITE) {
        return resp;
    }
    let id: CategoryId = match dto::parse_id(&id, "category") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::no_content(
        services
            .back_office()
            .delete_category(principal.actor(&org), id)
            .await,
    )
}

// -------------------------
// Products
// -------------------------

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<ProductDraft>, Response>,
) -> Response {
    let draft = match CmdAuth::new(body, perms::CATALOG_WRITE).authorize_body(&org, &principal) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .create_product(principal.actor(&org), draft)
        .await;
    common::reply(StatusCode::CREATED, result)
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    search: Result<ValidQuery<dto::TextQuery>, Response>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::CATALOG_READ) {
        return resp;
    }
    let ValidQuery(search) = match search {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .list_products(principal.actor(&org), search.query.as_deref())
        .await;
    common::reply(StatusCode::OK, result.map(dto::items))
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::CATALOG_READ) {
        return resp;
    }
    let id: ProductId = match dto::parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .get_product(principal.actor(&org), id)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn patch_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<ValidJson<ProductPatch>, Response>,
) -> Response {
    let patch = match CmdAuth::new(body, perms::CATALOG_WRITE).authorize_body(&org, &principal) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let id: ProductId = match dto::parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .patch_product(principal.actor(&org), id, patch)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn replace_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<ValidJson<ProductDraft>, Response>,
) -> Response {
    let draft = match CmdAuth::new(body, perms::CATALOG_WRITE).authorize_body(&org, &principal) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let id: ProductId = match dto::parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .replace_product(principal.actor(&org), id, draft)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::CATALOG_WRITE) {
        return resp;
    }
    let id: ProductId = match dto::parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::no_content(
        services
            .back_office()
            .delete_product(principal.actor(&org), id)
            .await,
    )
}

/// Body is optional: an empty body features the product organization-wide.
pub async fn feature_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: axum::body::Bytes,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::CATALOG_WRITE) {
        return resp;
    }
    let request: dto::FeatureProductRequest = if body.is_empty() {
        dto::FeatureProductRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(r) => r,
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", e.to_string());
            }
        }
    };
    let id: ProductId = match dto::parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::no_content(
        services
            .back_office()
            .feature_product(principal.actor(&org), id, request.branch_office_id)
            .await,
    )
}

pub async fn unfeature_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::CATALOG_WRITE) {
        return resp;
    }
    let id: ProductId = match dto::parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::no_content(
        services
            .back_office()
            .unfeature_product(principal.actor(&org), id)
            .await,
    )
}
