use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
};

use shopfloor_core::OrganizationId;
use shopfloor_organization::{BusinessDetails, BusinessPatch};

use crate::app::dto::{self, ValidJson};
use crate::app::routes::common::{self, CmdAuth};
use crate::app::services::AppServices;
use crate::authz::perms;
use crate::context::{OrganizationContext, PrincipalContext};

/// `/organization`: the caller's own organization.
pub fn own_router() -> Router {
    Router::new().route("/", get(get_own).patch(patch_own))
}

/// `/organizations`: every organization, for platform operators.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_organizations).post(create_organization))
        .route(
            "/:id",
            get(get_organization)
                .patch(patch_organization)
                .delete(delete_organization),
        )
}

pub async fn get_own(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::ORGANIZATION_READ) {
        return resp;
    }
    let result = services
        .back_office()
        .get_organization(org.organization_id())
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn patch_own(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<BusinessPatch>, Response>,
) -> Response {
    let patch = match CmdAuth::new(body, perms::ORGANIZATION_WRITE).authorize_body(&org, &principal) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .patch_organization(org.organization_id(), patch)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn create_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<BusinessDetails>, Response>,
) -> Response {
    let draft = match CmdAuth::new(body, perms::ORGANIZATIONS_MANAGE).authorize_body(&org, &principal) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let result = services.back_office().create_organization(draft).await;
    common::reply(StatusCode::CREATED, result)
}

pub async fn list_organizations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::ORGANIZATIONS_MANAGE) {
        return resp;
    }
    let result = services.back_office().list_organizations().await;
    common::reply(StatusCode::OK, result.map(dto::items))
}

pub async fn get_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::ORGANIZATIONS_MANAGE) {
        return resp;
    }
    let id: OrganizationId = match dto::parse_id(&id, "organization") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.back_office().get_organization(id).await;
    common::reply(StatusCode::OK, result)
}

pub async fn patch_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<ValidJson<BusinessPatch>, Response>,
) -> Response {
    let patch = match CmdAuth::new(body, perms::ORGANIZATIONS_MANAGE).authorize_body(&org, &principal) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let id: OrganizationId = match dto::parse_id(&id, "organization") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.back_office().patch_organization(id, patch).await;
    common::reply(StatusCode::OK, result)
}

pub async fn delete_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::ORGANIZATIONS_MANAGE) {
        return resp;
    }
    let id: OrganizationId = match dto::parse_id(&id, "organization") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::no_content(services.back_office().delete_organization(id).await)
}
