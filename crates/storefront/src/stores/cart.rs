//! Cart store.
//!
//! Mirrors the server cart. Every mutation forwards to the API and then,
//! whatever the outcome, re-fetches the whole cart and republishes it. The
//! snapshot is never patched locally, so overlapping operations converge on
//! the server state once the last re-fetch lands. A response that arrives
//! after its session ended is dropped without publishing or persisting.

use std::sync::Arc;

use freshcart_core::{CartId, ProductId};
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::SessionHandle;
use crate::api::CartApi;
use crate::api::types::Cart;
use crate::error::{Result, ValidationError, add_breadcrumb};
use crate::storage::TokenVault;

/// Observable mirror of the server cart.
pub struct CartStore {
    api: Arc<dyn CartApi>,
    session: SessionHandle,
    vault: TokenVault,
    cart_tx: watch::Sender<Cart>,
}

impl CartStore {
    /// Create an empty store.
    pub fn new(api: Arc<dyn CartApi>, session: SessionHandle, vault: TokenVault) -> Self {
        let (cart_tx, _rx) = watch::channel(Cart::empty());
        Self {
            api,
            session,
            vault,
            cart_tx,
        }
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    /// Last synced cart.
    #[must_use]
    pub fn items(&self) -> Cart {
        self.cart_tx.borrow().clone()
    }

    /// Number of lines in the last synced cart.
    #[must_use]
    pub fn count(&self) -> usize {
        self.cart_tx.borrow().count()
    }

    /// Whether the last synced cart holds `product_id`.
    ///
    /// May be stale while a mutation is in flight.
    #[must_use]
    pub fn is_in_cart(&self, product_id: &ProductId) -> bool {
        self.cart_tx.borrow().contains(product_id)
    }

    /// Subscribe to cart snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.cart_tx.subscribe()
    }

    /// The active cart id: from the snapshot, else the persisted cookie.
    #[must_use]
    pub fn cart_id(&self) -> Option<CartId> {
        if let Some(id) = self.cart_tx.borrow().id.clone() {
            return Some(id);
        }
        self.vault.cart_id().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read cart id cookie");
            None
        })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero quantity, an auth error without
    /// a session, or the API error. The cart is re-fetched either way.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(ValidationError::field("quantity", "must be at least 1").into());
        }
        let token = self.session.require_token()?;
        let outcome = self.api.add_to_cart(&token, product_id, quantity).await;
        self.settle("add to cart", product_id, &token, outcome).await
    }

    /// Set the quantity of a line. Quantities below 1 are ignored.
    ///
    /// # Errors
    ///
    /// Returns an auth error without a session, or the API error. The cart
    /// is re-fetched either way.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<()> {
        if quantity < 1 {
            debug!(quantity, "Ignoring quantity below 1");
            return Ok(());
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| ValidationError::field("quantity", "is too large"))?;
        let token = self.session.require_token()?;
        let outcome = self.api.update_cart_item(&token, product_id, quantity).await;
        self.settle("update cart quantity", product_id, &token, outcome)
            .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an auth error without a session, or the API error. The cart
    /// is re-fetched either way.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: &ProductId) -> Result<()> {
        let token = self.session.require_token()?;
        let outcome = self.api.remove_cart_item(&token, product_id).await;
        self.settle("remove from cart", product_id, &token, outcome)
            .await
    }

    /// Delete the whole cart on the server.
    ///
    /// # Errors
    ///
    /// Returns an auth error without a session, or the API error. The cart
    /// is re-fetched either way.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        let token = self.session.require_token()?;
        let outcome = self.api.clear_cart(&token).await;
        if outcome.is_ok()
            && let Err(e) = self.vault.clear_cart_id()
        {
            warn!(error = %e, "Failed to remove cart id cookie");
        }

        let refreshed = self.fetch(&token).await;
        match outcome {
            Ok(()) => {
                info!("Cart cleared");
                add_breadcrumb("cart", "Cleared cart", None);
                refreshed
            }
            Err(e) => {
                e.report("clear cart");
                Err(e)
            }
        }
    }

    /// Re-fetch the cart. Without a session, publishes the empty cart.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous snapshot is kept.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        let Some(token) = self.session.token() else {
            self.reset();
            return Ok(());
        };
        self.fetch(&token).await
    }

    /// Drop the local snapshot without touching the server.
    pub fn reset(&self) {
        self.cart_tx.send_replace(Cart::empty());
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Record the cart id, re-fetch, and surface the mutation's error.
    async fn settle(
        &self,
        action: &'static str,
        product_id: &ProductId,
        token: &SecretString,
        outcome: Result<Option<CartId>>,
    ) -> Result<()> {
        if let Ok(Some(cart_id)) = &outcome
            && self.session.holds(token)
        {
            self.remember_cart_id(cart_id);
        }

        let refreshed = self.fetch(token).await;

        match outcome {
            Ok(_) => {
                add_breadcrumb("cart", action, Some(&[("product_id", product_id.as_str())]));
                refreshed
            }
            Err(e) => {
                e.report(action);
                Err(e)
            }
        }
    }

    async fn fetch(&self, token: &SecretString) -> Result<()> {
        let cart = self
            .api
            .get_cart(token)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to re-fetch cart"))?;
        let cart_id = cart.id.clone();
        let lines = cart.count();

        // Checked under the channel lock so a concurrent logout's reset wins.
        let published = self.cart_tx.send_if_modified(|current| {
            if !self.session.holds(token) {
                return false;
            }
            *current = cart;
            true
        });
        if !published {
            debug!("Session ended during request, dropping cart");
            return Ok(());
        }

        if let Some(cart_id) = &cart_id {
            self.remember_cart_id(cart_id);
        }
        debug!(lines, "Cart synced");
        Ok(())
    }

    fn remember_cart_id(&self, cart_id: &CartId) {
        if let Err(e) = self.vault.set_cart_id(cart_id) {
            warn!(error = %e, "Failed to persist cart id cookie");
        }
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}
