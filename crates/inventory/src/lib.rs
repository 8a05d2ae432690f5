//! Stock ledger.
//!
//! A stock count is the aggregate; each stock movement is both the immutable
//! ledger entry and the event that moves the count. The rules are pure: stores
//! load the count, call [`StockCount::record`], and persist both results in
//! one transaction.

pub mod stock;

pub use stock::{MovementType, RecordMovement, StockCount, StockKey, StockMovement};
