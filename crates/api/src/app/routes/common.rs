use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use shopfloor_auth::{CommandAuthorization, Permission};
use shopfloor_infra::BackOfficeResult;

use crate::app::dto::ValidJson;
use crate::app::errors;
use crate::authz;
use crate::context::{OrganizationContext, PrincipalContext};

/// Small helper wrapper to associate required permissions with a request.
pub struct CmdAuth<C> {
    pub inner: C,
    pub required: Vec<Permission>,
}

impl<C> CommandAuthorization for CmdAuth<C> {
    fn required_permissions(&self) -> &[Permission] {
        &self.required
    }
}

impl<C> CmdAuth<C> {
    pub fn new(inner: C, required: Permission) -> Self {
        Self {
            inner,
            required: vec![required],
        }
    }

    /// Unwrap the request once the caller holds every required permission,
    /// or render `403 forbidden`.
    pub fn authorize(
        self,
        organization: &OrganizationContext,
        principal: &PrincipalContext,
    ) -> Result<C, Response> {
        match authz::authorize_command(organization, principal, &self) {
            Ok(()) => Ok(self.inner),
            Err(e) => Err(errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())),
        }
    }
}

impl<T> CmdAuth<Result<ValidJson<T>, Response>> {
    /// Authorize before looking at the body, so a caller without the
    /// permission gets `403` whatever they sent.
    pub fn authorize_body(
        self,
        organization: &OrganizationContext,
        principal: &PrincipalContext,
    ) -> Result<T, Response> {
        self.authorize(organization, principal)?
            .map(|ValidJson(body)| body)
    }
}

/// Guard for requests without a body.
pub fn require(
    organization: &OrganizationContext,
    principal: &PrincipalContext,
    permission: Permission,
) -> Result<(), Response> {
    CmdAuth::new((), permission).authorize(organization, principal)
}

pub fn reply<T: Serialize>(status: StatusCode, result: BackOfficeResult<T>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(e) => errors::back_office_error_to_response(e),
    }
}

pub fn no_content(result: BackOfficeResult<()>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::back_office_error_to_response(e),
    }
}
