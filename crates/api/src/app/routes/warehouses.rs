use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
};

use shopfloor_core::WarehouseId;
use shopfloor_organization::{WarehouseDraft, WarehousePatch};

use crate::app::dto::{self, ValidJson, ValidQuery};
use crate::app::routes::common::{self, CmdAuth};
use crate::app::services::AppServices;
use crate::authz::perms;
use crate::context::{OrganizationContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_warehouses).post(create_warehouse))
        .route("/count", get(count_warehouses))
        .route(
            "/:id",
            get(get_warehouse)
                .patch(patch_warehouse)
                .put(replace_warehouse)
                .delete(delete_warehouse),
        )
}

pub async fn create_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<ValidJson<WarehouseDraft>, Response>,
) -> Response {
    let draft = match CmdAuth::new(body, perms::WAREHOUSES_WRITE).authorize_body(&org, &principal) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .create_warehouse(principal.actor(&org), draft)
        .await;
    common::reply(StatusCode::CREATED, result)
}

pub async fn count_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::WAREHOUSES_READ) {
        return resp;
    }
    let result = services
        .back_office()
        .count_warehouses(principal.actor(&org))
        .await;
    common::reply(StatusCode::OK, result.map(dto::count))
}

pub async fn list_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    filter: Result<ValidQuery<dto::BranchOfficeFilter>, Response>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::WAREHOUSES_READ) {
        return resp;
    }
    let ValidQuery(filter) = match filter {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .list_warehouses(principal.actor(&org), filter.branch_office_id)
        .await;
    common::reply(StatusCode::OK, result.map(dto::items))
}

pub async fn get_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::WAREHOUSES_READ) {
        return resp;
    }
    let id: WarehouseId = match dto::parse_id(&id, "warehouse") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .get_warehouse(principal.actor(&org), id)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn patch_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<ValidJson<WarehousePatch>, Response>,
) -> Response {
    let patch = match CmdAuth::new(body, perms::WAREHOUSES_WRITE).authorize_body(&org, &principal) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let id: WarehouseId = match dto::parse_id(&id, "warehouse") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .patch_warehouse(principal.actor(&org), id, patch)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn replace_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<ValidJson<WarehouseDraft>, Response>,
) -> Response {
    let draft = match CmdAuth::new(body, perms::WAREHOUSES_WRITE).authorize_body(&org, &principal) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let id: WarehouseId = match dto::parse_id(&id, "warehouse") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services
        .back_office()
        .replace_warehouse(principal.actor(&org), id, draft)
        .await;
    common::reply(StatusCode::OK, result)
}

pub async fn delete_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrganizationContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = common::require(&org, &principal, perms::WAREHOUSES_WRITE) {
        return resp;
    }
    let id: WarehouseId = match dto::parse_id(&id, "warehouse") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    common::no_content(
        services
            .back_office()
            .delete_warehouse(principal.actor(&org), id)
            .await,
    )
}
