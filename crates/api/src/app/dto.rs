//! Request extractors, query strings and id parsing.

use std::str::FromStr;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
    Json,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use shopfloor_core::BranchOfficeId;

use crate::app::errors;

/// JSON body whose rejections render as `400 invalid_body`.
///
/// Unknown-field and type errors from serde land here too, so request types
/// marked `deny_unknown_fields` are enforced with the same status.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(body_rejection(rejection)),
        }
    }
}

fn body_rejection(rejection: JsonRejection) -> axum::response::Response {
    tracing::debug!(error = %rejection.body_text(), "request body rejected");
    errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

/// Query string whose rejections render as `400 invalid_query`.
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_query",
                rejection.body_text(),
            )),
        }
    }
}

/// Parse a path segment into a typed id, `400 invalid_id` otherwise.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("invalid {what} id"),
        )
    })
}

// -------------------------
// Query strings
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct NameFilter {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BranchOfficeFilter {
    #[serde(default)]
    pub branch_office_id: Option<BranchOfficeId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextQuery {
    #[serde(default)]
    pub query: Option<String>,
}

// -------------------------
// Request bodies
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureProductRequest {
    #[serde(default)]
    pub branch_office_id: Option<BranchOfficeId>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn items<T: serde::Serialize>(items: Vec<T>) -> serde_json::Value {
    serde_json::json!({ "items": items })
}

pub fn count(count: usize) -> serde_json::Value {
    serde_json::json!({ "count": count })
}
