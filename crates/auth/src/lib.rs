//! `shopfloor-auth`: token validation and permission checks.
//!
//! Decoupled from HTTP and storage: the API layer extracts the bearer token and
//! maps roles to permissions; this crate verifies and decides.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, CommandAuthorization, Principal, authorize};
pub use claims::{ISSUED_AT_LEEWAY_SECS, JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use permissions::Permission;
pub use principal::{OrganizationMembership, PrincipalId};
pub use roles::Role;
