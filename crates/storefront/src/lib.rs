//! FreshCart storefront client library.
//!
//! The client-side state layer of the storefront: a session store, cart and
//! wishlist stores mirroring the server, a checkout coordinator, and catalog
//! reads with a short-lived cache. Front-ends (the `freshcart` CLI, tests)
//! build one [`Storefront`](state::Storefront) and drive it.
//!
//! # Modules
//!
//! - [`api`] - Commerce API traits and the `reqwest` implementation
//! - [`stores`] - Observable session, cart and wishlist state
//! - [`services`] - Catalog, checkout, orders, password recovery
//! - [`storage`] - Persisted client state (token copies, cart id)
//! - [`forms`] - Local input validation
//! - [`cache`] - Catalog response cache
//! - [`loading`] - In-flight request tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod forms;
pub mod loading;
pub mod services;
pub mod state;
pub mod storage;
pub mod stores;

#[cfg(test)]
mod test_support;

pub use state::Storefront;
