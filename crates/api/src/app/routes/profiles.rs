use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
};

use shopfloor_core::ProfileId;
use shopfloor_organization::{ProfileDraft, ProfilePatch};

use crate::app::dto::{self, ValidJson};
use crate::app::routes::common::{self, CmdAuth};
use crate::app::services::AppServices;
use crate::authz::perms;
use crate::context::{OrganizationContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_profiles).post(create_profile))
        .route("/me", get(my_profile))
        .route("/:id", get(get_profile).patch(patch_profile))
}

pub async fn create_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<ProfileDraft>, Response>,
) -> Response {
    let draft = match CmdAuth::new(body, perms::PROFILES_WRITE).authorize_body(&org, &principal) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .create_profile(principal.actor(&org), draft)
        .await;
    common::reply(StatusCode::CREATED, result)
}

pub async fn list_profiles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::PROFILES_READ) {
        return resp;
    }
    let result = services.back_office().list_profiles(principal.actor(&org)).await;
    common::reply(StatusCode::OK, result.map(dto::items))
}

/// Any authenticated caller may read their own profile.
pub async fn my_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    let result = services.back_office().my_profile(principal.actor(&org)).await;
    common::reply(StatusCode::OK, result)
}

pub async fn get_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::PROFILES_READ) {
        return resp;
    }
    let id: ProfileId = match dto::parse_id(&id, "profile") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .get_profile(principal.actor(&org), id)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn patch_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<ValidJson<ProfilePatch>, Response>,
) -> Response {
    let patch = match CmdAuth::new(body, perms::PROFILES_WRITE).authorize_body(&org, &principal) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let id: ProfileId = match dto::parse_id(&id, "profile") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .patch_profile(principal.actor(&org), id, patch)
        .await;
    common::reply(StatusCode::OK, result)
}
