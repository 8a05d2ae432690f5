//! Organization structure: the tenant, its branch offices and warehouses, and
//! the profiles of the people working there.
//!
//! Pure data and validation; lookups and uniqueness checks across records are
//! done by the caller against a store.

pub mod branch_office;
pub mod business;
pub mod organization;
pub mod profile;
pub mod warehouse;

pub use branch_office::BranchOffice;
pub use business::{BusinessDetails, BusinessPatch};
pub use organization::Organization;
pub use profile::{Profile, ProfileDraft, ProfilePatch};
pub use warehouse::{Warehouse, WarehouseDraft, WarehousePatch};
