//! `shopfloor-core`: identifiers, errors and traits shared by every domain crate.
//!
//! Nothing in here performs IO.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, check_len, require_text};
pub use id::{
    AppEventId, BranchOfficeId, CategoryId, OrganizationId, PosSessionId, PriceListId, ProductId,
    ProfileId, SaleId, StockMovementId, WarehouseId,
};
pub use value_object::{ContactInfo, Status, ValueObject, same_name};
