//! Strongly-typed identifiers used across the domain.
//!
//! Every record in the back office is addressed by a UUIDv7 wrapped in its own
//! newtype, so a warehouse id can never be passed where a product id is expected.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new time-ordered identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

uuid_id!(
    /// Identifier of an organization (the tenant boundary).
    OrganizationId,
    "OrganizationId"
);
uuid_id!(
    /// Identifier of a profile (the person behind a token subject).
    ProfileId,
    "ProfileId"
);
uuid_id!(BranchOfficeId, "BranchOfficeId");
uuid_id!(WarehouseId, "WarehouseId");
uuid_id!(CategoryId, "CategoryId");
uuid_id!(ProductId, "ProductId");
uuid_id!(PriceListId, "PriceListId");
uuid_id!(PosSessionId, "PosSessionId");
uuid_id!(SaleId, "SaleId");
uuid_id!(StockMovementId, "StockMovementId");
uuid_id!(AppEventId, "AppEventId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_through_display() {
        let id = WarehouseId::new();
        let parsed: WarehouseId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_failure_names_the_id_kind() {
        match "not-a-uuid".parse::<ProductId>() {
            Err(DomainError::InvalidId(msg)) => assert!(msg.starts_with("ProductId")),
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }

    #[test]
    fn new_ids_are_time_ordered() {
        let a = SaleId::new();
        let b = SaleId::new();
        assert!(a <= b);
    }
}
