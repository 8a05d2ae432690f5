//! Infrastructure layer: persistence, configuration and the back office use
//! cases that tie the domain crates to a store.

pub mod back_office;
pub mod config;
pub mod store;

pub use back_office::{Actor, BackOffice, BackOfficeError, BackOfficeResult};
pub use config::{AppConfig, ConfigError, StoreBackend};
pub use store::{BackOfficeStore, InMemoryStore, PostgresStore, StoreError, StoreResult};
