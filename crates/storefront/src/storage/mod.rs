//! Persisted client state.
//!
//! A [`StorageLocation`] is one named key/value place the client can write
//! to, standing in for browser local storage or the cookie jar. The session
//! token is written to several keys in several locations; [`TokenVault`]
//! owns that layout.

mod file;
mod memory;
mod vault;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use vault::{CART_ID_KEY, COOKIE_TOKEN_KEYS, LOCAL_TOKEN_KEYS, TokenVault};

use thiserror::Error;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted file is not valid JSON.
    #[error("Corrupt state file: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A named key/value storage location.
pub trait StorageLocation: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
