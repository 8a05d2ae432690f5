use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopfloor_core::OrganizationId;

use crate::{PrincipalId, Role};

/// Claims carried by a bearer token once its signature has been verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The caller. Doubles as their profile id inside the organization.
    pub sub: PrincipalId,

    pub organization_id: OrganizationId,

    pub roles: Vec<Role>,

    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Allowed clock difference between the issuer and this server, matching
/// `jsonwebtoken::Validation`'s default leeway. Applies to `issued_at` only.
pub const ISSUED_AT_LEEWAY_SECS: i64 = 60;

pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at - Duration::seconds(ISSUED_AT_LEEWAY_SECS) {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
