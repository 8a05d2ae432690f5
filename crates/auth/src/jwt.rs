//! Bearer token decoding.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::claims::{JwtClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JwtError {
    #[error("malformed or badly signed token: {0}")]
    Decode(String),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verifies a raw bearer token and returns its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError>;
}

/// HMAC-SHA256 shared-secret validator.
///
/// The token carries `issued_at`/`expires_at` rather than the registered
/// `iat`/`exp`, so the time window is checked by [`validate_claims`].
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, JwtError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| JwtError::Decode(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};
    use shopfloor_core::OrganizationId;

    use crate::{PrincipalId, Role};

    fn mint(secret: &str, claims: &JwtClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: PrincipalId::new(),
            organization_id: OrganizationId::new(),
            roles: vec![Role::new("admin")],
            issued_at: now,
            expires_at: now + Duration::minutes(5),
        }
    }

    #[test]
    fn accepts_token_signed_with_same_secret() {
        let now = Utc::now();
        let c = claims(now);
        let v = Hs256JwtValidator::new("s3cret");
        assert_eq!(v.validate(&mint("s3cret", &c), now).unwrap(), c);
    }

    #[test]
    fn rejects_wrong_secret_and_garbage() {
        let now = Utc::now();
        let v = Hs256JwtValidator::new("s3cret");
        assert!(matches!(
            v.validate(&mint("other", &claims(now)), now),
            Err(JwtError::Decode(_))
        ));
        assert!(matches!(v.validate("not.a.jwt", now), Err(JwtError::Decode(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let now = Utc::now();
        let v = Hs256JwtValidator::new("s3cret");
        let token = mint("s3cret", &claims(now));
        assert_eq!(
            v.validate(&token, now + Duration::hours(1)),
            Err(JwtError::Claims(TokenValidationError::Expired))
        );
    }
}
