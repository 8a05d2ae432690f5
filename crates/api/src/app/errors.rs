use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use shopfloor_infra::BackOfficeError;

pub fn back_office_error_to_response(err: BackOfficeError) -> axum::response::Response {
    match err {
        BackOfficeError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        BackOfficeError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        BackOfficeError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        BackOfficeError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        BackOfficeError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        BackOfficeError::Store(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
