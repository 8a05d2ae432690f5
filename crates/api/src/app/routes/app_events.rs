use std::sync::Arc;

use axum::{Router, extract::Extension, http::StatusCode, response::Response, routing::get};

use shopfloor_sales::AppEventDraft;

use crate::app::dto::{self, ValidJson};
use crate::app::routes::common::{self, CmdAuth};
use crate::app::services::AppServices;
use crate::authz::perms;
use crate::context::{OrganizationContext, PrincipalContext};

pub fn router() -> Router {
    Router::new().route("/", get(list_app_events).post(create_app_event))
}

pub async fn create_app_event(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<AppEventDraft>, Response>,
) -> Response {
    let draft = match CmdAuth::new(body, perms::APP_EVENTS_WRITE).authorize_body(&org, &principal) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .create_app_event(principal.actor(&org), draft)
        .await;
    common::reply(StatusCode::CREATED, result)
}

pub async fn list_app_events(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::APP_EVENTS_READ) {
        return resp;
    }
    let result = services
        .back_office()
        .list_app_events(principal.actor(&org))
        .await;
    common::reply(StatusCode::OK, result.map(dto::items))
}
