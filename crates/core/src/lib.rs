//! FreshCart Core - Shared domain types.
//!
//! This crate provides common types used across all FreshCart components:
//! - `storefront` - Client-side state layer (session, cart, wishlist, checkout)
//! - `cli` - Terminal front-end driving the storefront stores
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, emails, phones, passwords
//!   and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
