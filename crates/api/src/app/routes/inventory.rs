use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::get,
};

use shopfloor_infra::back_office::{MovementInput, MovementQuery};

use crate::app::dto::{self, ValidJson, ValidQuery};
use crate::app::routes::common::{self, CmdAuth};
use crate::app::services::AppServices;
use crate::authz::perms;
use crate::context::{OrganizationContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route(
            "/stock-movements",
            get(list_movements).post(record_movement),
        )
        .route("/stock-counts", get(list_stock_counts))
}

pub async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<MovementInput>, Response>,
) -> Response {
    let input = match CmdAuth::new(body, perms::INVENTORY_WRITE).authorize_body(&org, &principal) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .record_movement(principal.actor(&org), input)
        .await;
    common::reply(StatusCode::CREATED, result)
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<ValidQuery<MovementQuery>, Response>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::INVENTORY_READ) {
        return resp;
    }
    let ValidQuery(query) = match query {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .list_movements(principal.actor(&org), query)
        .await;
    common::reply(StatusCode::OK, result.map(dto::items))
}

pub async fn list_stock_counts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<ValidQuery<MovementQuery>, Response>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::INVENTORY_READ) {
        return resp;
    }
    let ValidQuery(query) = match query {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .list_stock_counts(principal.actor(&org), query)
        .await;
    common::reply(StatusCode::OK, result.map(dto::items))
}
