//! Observable client-side state.
//!
//! Each store mirrors one server resource and publishes snapshots through a
//! `tokio::sync::watch` channel. Stores never patch their snapshot from a
//! mutation's response: they re-fetch and republish, so the server stays
//! authoritative.

mod cart;
mod session;
mod wishlist;

pub use cart::CartStore;
pub use session::{SessionHandle, SessionStore};
pub use wishlist::{Toggled, WishlistStore};
