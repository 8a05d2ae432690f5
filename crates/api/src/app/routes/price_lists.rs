use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, patch},
};

use shopfloor_catalog::{PriceListDraft, PriceListPatch};
use shopfloor_core::PriceListId;
use shopfloor_infra::back_office::SetPrice;

use crate::app::dto::{self, ValidJson};
use crate::app::routes::common::{self, CmdAuth};
use crate::app::services::AppServices;
use crate::authz::perms;
use crate::context::{OrganizationContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_price_lists).post(create_price_list))
        .route("/price", patch(set_price))
        .route(
            "/:id",
            get(get_price_list)
                .patch(patch_price_list)
                .delete(delete_price_list),
        )
        .route("/:id/prices", get(list_prices))
}

pub async fn create_price_list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<PriceListDraft>, Response>,
) -> Response {
    let draft = match CmdAuth::new(body, perms::PRICE_LISTS_WRITE).authorize_body(&org, &principal) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .create_price_list(principal.actor(&org), draft)
        .await;
    common::reply(StatusCode::CREATED, result)
}

pub async fn list_price_lists(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::PRICE_LISTS_READ) {
        return resp;
    }
    let result = services
        .back_office()
        .list_price_lists(principal.actor(&org))
        .await;
    common::reply(StatusCode::OK, result.map(dto::items))
}

pub async fn get_price_list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::PRICE_LISTS_READ) {
        return resp;
    }
    let id: PriceListId = match dto::parse_id(&id, "price list") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .get_price_list(principal.actor(&org), id)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn patch_price_list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<ValidJson<PriceListPatch>, Response>,
) -> Response {
    let patch = match CmdAuth::new(body, perms::PRICE_LISTS_WRITE).authorize_body(&org, &principal) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let id: PriceListId = match dto::parse_id(&id, "price list") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .patch_price_list(principal.actor(&org), id, patch)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn delete_price_list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::PRICE_LISTS_WRITE) {
        return resp;
    }
    let id: PriceListId = match dto::parse_id(&id, "price list") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::no_content(
        services
            .back_office()
            .delete_price_list(principal.actor(&org), id)
            .await,
    )
}

pub async fn set_price(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<SetPrice>, Response>,
) -> Response {
    let input = match CmdAuth::new(body, perms::PRICE_LISTS_WRITE).authorize_body(&org, &principal) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .set_price(principal.actor(&org), input)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn list_prices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::PRICE_LISTS_READ) {
        return resp;
    }
    let id: PriceListId = match dto::parse_id(&id, "price list") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .list_prices(principal.actor(&org), id)
        .await;
    common::reply(StatusCode::OK, result.map(dto::items))
}
