//! Redundant token persistence.

use std::sync::Arc;

use freshcart_core::CartId;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use super::{StorageError, StorageLocation};

/// Keys the token is written to in the local location.
pub const LOCAL_TOKEN_KEYS: [&str; 4] = ["token", "userToken", "authToken", "accessToken"];

/// Keys the token is written to in the cookie location.
pub const COOKIE_TOKEN_KEYS: [&str; 2] = ["token", "userToken"];

/// Cookie key holding the active cart resource id.
pub const CART_ID_KEY: &str = "cartId";

/// Writes, reads and wipes the session token across both locations.
///
/// Reads take the first non-empty copy, local keys first.
#[derive(Clone)]
pub struct TokenVault {
    local: Arc<dyn StorageLocation>,
    cookies: Arc<dyn StorageLocation>,
}

impl TokenVault {
    /// Create a vault over a local and a cookie location.
    pub fn new(local: Arc<dyn StorageLocation>, cookies: Arc<dyn StorageLocation>) -> Self {
        Self { local, cookies }
    }

    /// Every (location, key) pair that holds a token copy.
    fn token_slots(&self) -> impl Iterator<Item = (&dyn StorageLocation, &'static str)> {
        let local = LOCAL_TOKEN_KEYS
            .into_iter()
            .map(|key| (self.local.as_ref(), key));
        let cookies = COOKIE_TOKEN_KEYS
            .into_iter()
            .map(|key| (self.cookies.as_ref(), key));
        local.chain(cookies)
    }

    /// Write the token to every slot.
    ///
    /// # Errors
    ///
    /// Returns the first storage failure; remaining slots are still written.
    pub fn persist(&self, token: &SecretString) -> Result<(), StorageError> {
        let value = token.expose_secret();
        let mut first_error = None;
        for (location, key) in self.token_slots() {
            if let Err(e) = location.set(key, value) {
                warn!(location = location.name(), key, error = %e, "Failed to persist token");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// The persisted token, if any slot holds a non-empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if a location cannot be read.
    pub fn token(&self) -> Result<Option<SecretString>, StorageError> {
        for (location, key) in self.token_slots() {
            if let Some(value) = location.get(key)?
                && !value.trim().is_empty()
            {
                return Ok(Some(SecretString::from(value)));
            }
        }
        Ok(None)
    }

    /// Remove every token copy and the cart id cookie.
    ///
    /// # Errors
    ///
    /// Returns the first storage failure; remaining slots are still cleared.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut first_error = None;
        let slots = self
            .token_slots()
            .chain(std::iter::once((self.cookies.as_ref(), CART_ID_KEY)));
        for (location, key) in slots {
            if let Err(e) = location.remove(key) {
                warn!(location = location.name(), key, error = %e, "Failed to clear session key");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// The cached cart id cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie location cannot be read.
    pub fn cart_id(&self) -> Result<Option<CartId>, StorageError> {
        Ok(self
            .cookies
            .get(CART_ID_KEY)?
            .filter(|id| !id.is_empty())
            .map(CartId::new))
    }

    /// Remember the active cart id.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie location cannot be written.
    pub fn set_cart_id(&self, cart_id: &CartId) -> Result<(), StorageError> {
        self.cookies.set(CART_ID_KEY, cart_id.as_str())
    }

    /// Forget the active cart id.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie location cannot be written.
    pub fn clear_cart_id(&self) -> Result<(), StorageError> {
        self.cookies.remove(CART_ID_KEY)
    }
}
