//! Wishlist store.
//!
//! Same shape as the cart store: mutations forward to the API, then the
//! full wishlist is re-fetched and republished, unless the session that
//! made the request has ended by the time the response lands.

use std::collections::HashSet;
use std::sync::Arc;

use freshcart_core::ProductId;
use futures::future::try_join_all;
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::SessionHandle;
use crate::api::WishlistApi;
use crate::api::types::Product;
use crate::error::{Result, add_breadcrumb};

/// What a [`WishlistStore::toggle`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

/// Observable mirror of the server wishlist.
pub struct WishlistStore {
    api: Arc<dyn WishlistApi>,
    session: SessionHandle,
    items_tx: watch::Sender<Vec<Product>>,
}

impl WishlistStore {
    /// Create an empty store.
    pub fn new(api: Arc<dyn WishlistApi>, session: SessionHandle) -> Self {
        let (items_tx, _rx) = watch::channel(Vec::new());
        Self {
            api,
            session,
            items_tx,
        }
    }

    /// Last synced products, in server order.
    #[must_use]
    pub fn items(&self) -> Vec<Product> {
        self.items_tx.borrow().clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.items_tx.borrow().len()
    }

    /// Whether the last synced wishlist holds `product_id`.
    #[must_use]
    pub fn is_present(&self, product_id: &ProductId) -> bool {
        self.items_tx
            .borrow()
            .iter()
            .any(|product| &product.id == product_id)
    }

    /// Subscribe to wishlist snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Product>> {
        self.items_tx.subscribe()
    }

    /// Save a product.
    ///
    /// # Errors
    ///
    /// Returns an auth error without a session, or the API error. The
    /// wishlist is re-fetched either way.
    #[instrument(skip_all, fields(product_id = %product.id))]
    pub async fn add(&self, product: &Product) -> Result<()> {
        let token = self.session.require_token()?;
        let outcome = self.api.add_to_wishlist(&token, &product.id).await;
        self.settle("add to wishlist", &product.id, &token, outcome)
            .await
    }

    /// Drop a product.
    ///
    /// # Errors
    ///
    /// Returns an auth error without a session, or the API error. The
    /// wishlist is re-fetched either way.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<()> {
        let token = self.session.require_token()?;
        let outcome = self.api.remove_from_wishlist(&token, product_id).await;
        self.settle("remove from wishlist", product_id, &token, outcome)
            .await
    }

    /// Remove the product if present, otherwise add it.
    ///
    /// Decided from the last synced snapshot. Two toggles racing from
    /// different callers are not serialized against each other.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying add or remove.
    pub async fn toggle(&self, product: &Product) -> Result<Toggled> {
        if self.is_present(&product.id) {
            self.remove(&product.id).await?;
            Ok(Toggled::Removed)
        } else {
            self.add(product).await?;
            Ok(Toggled::Added)
        }
    }

    /// Remove every entry, one request per product, concurrently.
    ///
    /// The empty set is published only after every removal succeeded; on
    /// failure the wishlist is re-fetched instead.
    ///
    /// # Errors
    ///
    /// Returns an auth error without a session, or the first removal error.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        let ids: Vec<ProductId> = self
            .items_tx
            .borrow()
            .iter()
            .map(|product| product.id.clone())
            .collect();
        if ids.is_empty() {
            return Ok(());
        }

        let token = self.session.require_token()?;
        let removals = ids
            .iter()
            .map(|id| self.api.remove_from_wishlist(&token, id));

        match try_join_all(removals).await {
            Ok(_) => {
                info!(removed = ids.len(), "Wishlist cleared");
                add_breadcrumb("wishlist", "Cleared wishlist", None);
                self.items_tx.send_replace(Vec::new());
                Ok(())
            }
            Err(e) => {
                e.report("clear wishlist");
                if let Err(refresh_error) = self.fetch(&token).await {
                    warn!(error = %refresh_error, "Failed to re-fetch wishlist");
                }
                Err(e)
            }
        }
    }

    /// Re-fetch the wishlist. Without a session, publishes the empty set.
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
        self.items_tx.send_replace(Vec::new());
    }

    async fn settle(
        &self,
        action: &'static str,
        product_id: &ProductId,
        token: &SecretString,
        outcome: Result<()>,
    ) -> Result<()> {
        let refreshed = self.fetch(token).await;
        match outcome {
            Ok(()) => {
                add_breadcrumb(
                    "wishlist",
                    action,
                    Some(&[("product_id", product_id.as_str())]),
                );
                refreshed
            }
            Err(e) => {
                e.report(action);
                Err(e)
            }
        }
    }

    async fn fetch(&self, token: &SecretString) -> Result<()> {
        let products = self.api.get_wishlist(token).await?;
        let unique = dedupe(products);
        let count = unique.len();

        let published = self.items_tx.send_if_modified(|current| {
            if !self.session.holds(token) {
                return false;
            }
            *current = unique;
            true
        });
        if published {
            debug!(count, "Wishlist synced");
        } else {
            debug!("Session ended during request, dropping wishlist");
        }
        Ok(())
    }
}

/// Keep the first occurrence of each product id, preserving order.
fn dedupe(products: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    products
        .into_iter()
        .filter(|product| seen.insert(product.id.clone()))
        .collect()
}
