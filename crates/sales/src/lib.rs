//! Point of sale: cashier sessions, checkout and the events cashiers raise.
//!
//! Pure domain logic. Loading the records a sale references and committing the
//! sale with its stock movements belongs to the infrastructure layer.

pub mod app_event;
pub mod sale;
pub mod session;

pub use app_event::{AppEvent, AppEventDraft, AppEventKind};
pub use sale::{
    Checkout, Discount, DiscountKind, Payment, PaymentMethod, ProductFacts, Sale, SaleDetails,
    SaleFacts, SaleItemRequest, SaleLine, SaleRequest, SellerFacts, checkout,
};
pub use session::{OpenSession, PosSession, SessionStatus, SessionUpdate};
