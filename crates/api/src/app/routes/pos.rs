use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::{get, post},
};

use shopfloor_catalog::ProductQuery;
use shopfloor_sales::{OpenSession, SaleRequest, SessionUpdate};

use crate::app::dto::{self, ValidJson, ValidQuery};
use crate::app::routes::common::{self, CmdAuth};
use crate::app::services::AppServices;
use crate::authz::perms;
use crate::context::{OrganizationContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/filter-products", get(filter_products))
        .route(
            "/session",
            get(current_session).post(open_session).put(update_session),
        )
        .route("/sale", post(create_sale))
}

pub async fn filter_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<ValidQuery<ProductQuery>, Response>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::POS_OPERATE) {
        return resp;
    }
    let ValidQuery(query) = match query {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .filter_products(principal.actor(&org), &query)
        .await;
    common::reply(StatusCode::OK, result.map(dto::items))
}

pub async fn open_session(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<OpenSession>, Response>,
) -> Response {
    let input = match CmdAuth::new(body, perms::POS_OPERATE).authorize_body(&org, &principal) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .open_session(principal.actor(&org), input)
        .await;
    common::reply(StatusCode::CREATED, result)
}

pub async fn current_session(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::POS_OPERATE) {
        return resp;
    }
    let result = services
        .back_office()
        .current_session(principal.actor(&org))
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn update_session(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<SessionUpdate>, Response>,
) -> Response {
    let update = match CmdAuth::new(body, perms::POS_OPERATE).authorize_body(&org, &principal) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .update_session(principal.actor(&org), update)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn create_sale(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<SaleRequest>, Response>,
) -> Response {
    let request = match CmdAuth::new(body, perms::POS_OPERATE).authorize_body(&org, &principal) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .create_sale(principal.actor(&org), request)
        .await;
    common::reply(StatusCode::CREATED, result)
}
