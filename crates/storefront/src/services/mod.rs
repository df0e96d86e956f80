//! Request/response flows that sit beside the stores.
//!
//! # Services
//!
//! - `catalog` - Product, category and brand reads, with caching
//! - `checkout` - Order placement state machine
//! - `orders` - Order history for the signed-in user
//! - `recovery` - Password reset flow

mod catalog;
mod checkout;
mod orders;
mod recovery;

pub use catalog::Catalog;
pub use checkout::{CheckoutCoordinator, CheckoutOutcome, CheckoutState};
pub use orders::OrderHistory;
pub use recovery::PasswordRecovery;
