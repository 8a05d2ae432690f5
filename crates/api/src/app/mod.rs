//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the back office and the store behind it
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: extractors, query strings and id parsing
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use shopfloor_infra::{BackOfficeStore, InMemoryStore};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Router backed by a fresh in-memory store.
pub async fn build_app(jwt_secret: String) -> Router {
    build_app_with_store(jwt_secret, Arc::new(InMemoryStore::new())).await
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app_with_store(jwt_secret: String, store: Arc<dyn BackOfficeStore>) -> Router {
    let jwt = Arc::new(shopfloor_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::AppServices::new(store));

    // Protected routes: require a token and an organization context.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
