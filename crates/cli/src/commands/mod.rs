//! Command implementations.
//!
//! Each command drives one [`Storefront`] built over JSON files under
//! `FRESHCART_STATE_DIR`: `local.json` and `cookies.json` stand in for the
//! browser's local storage and cookie jar.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod wishlist;

use std::sync::Arc;

use freshcart_storefront::Storefront;
use freshcart_storefront::config::{ClientConfig, ConfigError};
use freshcart_storefront::error::ClientError;
use freshcart_storefront::storage::{FileStorage, StorageError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid environment configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The state directory could not be read.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A storefront operation failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Checkout failed with a message meant for the shopper.
    #[error("{0}")]
    Checkout(String),
}

impl CliError {
    /// Text printed before exiting.
    pub fn user_message(&self) -> String {
        match self {
            Self::Client(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Build a storefront persisting its session under the configured state
/// directory.
///
/// # Errors
///
/// Returns an error if a state file exists but cannot be read, or the HTTP
/// client cannot be built.
pub fn open_storefront(config: ClientConfig) -> Result<Storefront, CliError> {
    let local = FileStorage::open("local", config.state_dir.join("local.json"))?;
    let cookies = FileStorage::open("cookies", config.state_dir.join("cookies.json"))?;
    tracing::debug!(state_dir = %config.state_dir.display(), "Opened session state");

    Ok(Storefront::new(config, Arc::new(local), Arc::new(cookies))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_open_storefront_with_empty_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            state_dir: dir.path().join("state"),
            ..ClientConfig::default()
        };

        let storefront = open_storefront(config).unwrap();
        assert!(!storefront.session().is_authenticated());
    }

    #[test]
    fn test_corrupt_state_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("local.json"), "{not json").unwrap();
        let config = ClientConfig {
            state_dir: dir.path().to_path_buf(),
            ..ClientConfig::default()
        };

        let err = open_storefront(config).unwrap_err();
        assert!(matches!(err, CliError::Storage(StorageError::Serialization(_))));
    }

    #[test]
    fn test_user_message_for_client_errors() {
        let err = CliError::from(ClientError::NotAuthenticated);
        assert_eq!(err.user_message(), "Please sign in to continue.");

        let err = CliError::Checkout("Cart not found".to_string());
        assert_eq!(err.user_message(), "Cart not found");
    }
}
