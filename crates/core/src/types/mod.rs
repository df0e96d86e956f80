//! Core types for FreshCart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod password;
pub mod phone;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use password::{Password, PasswordError};
pub use phone::{Phone, PhoneError};
pub use price::Money;
pub use status::*;
