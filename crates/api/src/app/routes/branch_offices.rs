use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
};

use shopfloor_core::BranchOfficeId;
use shopfloor_organization::{BusinessDetails, BusinessPatch};

use crate::app::dto::{self, ValidJson, ValidQuery};
use crate::app::routes::common::{self, CmdAuth};
use crate::app::services::AppServices;
use crate::authz::perms;
use crate::context::{OrganizationContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_branch_offices).post(create_branch_office))
        .route("/count", get(count_branch_offices))
        .route(
            "/:id",
            get(get_branch_office)
                .patch(patch_branch_office)
                .put(replace_branch_office)
                .delete(delete_branch_office),
        )
}

pub async fn create_branch_office(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<BusinessDetails>, Response>,
) -> Response {
    let draft = match CmdAuth::new(body, perms::BRANCH_OFFICES_WRITE).authorize_body(&org, &principal) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .create_branch_office(principal.actor(&org), draft)
        .await;
    common::reply(StatusCode::CREATED, result)
}

pub async fn count_branch_offices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::BRANCH_OFFICES_READ) {
        return resp;
    }
    let result = services
        .back_office()
        .count_branch_offices(principal.actor(&org))
        .await;
    common::reply(StatusCode::OK, result.map(dto::count))
}

pub async fn list_branch_offices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    filter: Result<ValidQuery<dto::NameFilter>, Response>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::BRANCH_OFFICES_READ) {
        return resp;
    }
    let ValidQuery(filter) = match filter {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .list_branch_offices(principal.actor(&org), filter.name.as_deref())
        .await;
    common::reply(StatusCode::OK, result.map(dto::items))
}

pub async fn get_branch_office(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::BRANCH_OFFICES_READ) {
        return resp;
    }
    let id: BranchOfficeId = match dto::parse_id(&id, "branch office") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .get_branch_office(principal.actor(&org), id)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn patch_branch_office(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<ValidJson<BusinessPatch>, Response>,
) -> Response {
    let patch = match CmdAuth::new(body, perms::BRANCH_OFFICES_WRITE).authorize_body(&org, &principal) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let id: BranchOfficeId = match dto::parse_id(&id, "branch office") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .patch_branch_office(principal.actor(&org), id, patch)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn replace_branch_office(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<ValidJson<BusinessDetails>, Response>,
) -> Response {
    let draft = match CmdAuth::new(body, perms::BRANCH_OFFICES_WRITE).authorize_body(&org, &principal) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let id: BranchOfficeId = match dto::parse_id(&id, "branch office") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .replace_branch_office(principal.actor(&org), id, draft)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn delete_branch_office(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::BRANCH_OFFICES_WRITE) {
        return resp;
    }
    let id: BranchOfficeId = match dto::parse_id(&id, "branch office") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::no_content(
        services
            .back_office()
            .delete_branch_office(principal.actor(&org), id)
            .await,
    )
}
