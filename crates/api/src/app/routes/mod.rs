use axum::{Router, routing::get};

pub mod app_events;
pub mod branch_offices;
pub mod catalog;
pub mod common;
pub mod inventory;
pub mod organizations;
pub mod pos;
pub mod price_lists;
pub mod profiles;
pub mod system;
pub mod warehouses;

/// Router for all authenticated (organization-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/organization", organizations::own_router())
        .nest("/organizations", organizations::router())
        .nest("/profiles", profiles::router())
        .nest("/branch-offices", branch_offices::router())
        .nest("/warehouses", warehouses::router())
        .nest("/catalog", catalog::router())
        .nest("/price-lists", price_lists::router())
        .nest("/pos", pos::router())
        .nest("/app-events", app_events::router())
        .merge(inventory::router())
}
