//! The storefront container.
//!
//! Owns one instance of every store and service, wired to a shared API
//! client, session handle and token vault.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::api::{CommerceApi, HttpApi};
use crate::cache::ResponseCache;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::loading::LoadingTracker;
use crate::services::{Catalog, CheckoutCoordinator, OrderHistory, PasswordRecovery};
use crate::storage::{StorageLocation, TokenVault};
use crate::stores::{CartStore, SessionHandle, SessionStore, WishlistStore};

/// Client state shared across a front-end.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: ClientConfig,
    loading: LoadingTracker,
    session: Arc<SessionStore>,
    cart: Arc<CartStore>,
    wishlist: Arc<WishlistStore>,
    catalog: Catalog,
    orders: OrderHistory,
    checkout: CheckoutCoordinator,
    recovery: PasswordRecovery,
}

impl Storefront {
    /// Build a storefront talking to the configured API over HTTP.
    ///
    /// `local` and `cookies` are the two places the session token is
    /// persisted to.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        local: Arc<dyn StorageLocation>,
        cookies: Arc<dyn StorageLocation>,
    ) -> Result<Self> {
        let loading = LoadingTracker::new();
        let api = Arc::new(HttpApi::new(&config, loading.clone())?);
        Ok(Self::assemble(config, api, loading, local, cookies))
    }

    /// Build a storefront over any API implementation.
    pub fn assemble<A: CommerceApi + 'static>(
        config: ClientConfig,
        api: Arc<A>,
        loading: LoadingTracker,
        local: Arc<dyn StorageLocation>,
        cookies: Arc<dyn StorageLocation>,
    ) -> Self {
        let vault = TokenVault::new(local, cookies);
        let handle = SessionHandle::new();
        let cache = ResponseCache::new(config.cache_ttl, config.cache_capacity);

        let cart = Arc::new(CartStore::new(api.clone(), handle.clone(), vault.clone()));
        let wishlist = Arc::new(WishlistStore::new(api.clone(), handle.clone()));
        let session = Arc::new(SessionStore::new(
            api.clone(),
            api.clone(),
            handle.clone(),
            vault,
            cart.clone(),
            wishlist.clone(),
        ));
        let catalog = Catalog::new(api.clone(), cache, config.page_limit);
        let orders = OrderHistory::new(api.clone(), session.clone());
        let checkout = CheckoutCoordinator::new(
            api.clone(),
            handle,
            cart.clone(),
            config.checkout_return_url.clone(),
        );
        let recovery = PasswordRecovery::new(api);

        Self {
            inner: Arc::new(StorefrontInner {
                config,
                loading,
                session,
                cart,
                wishlist,
                catalog,
                orders,
                checkout,
                recovery,
            }),
        }
    }

    /// Resume a persisted session, if any. Returns whether one was resumed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if persisted state cannot be read.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<bool> {
        let restored = self.inner.session.restore().await?;
        info!(restored, "Storefront started");
        Ok(restored)
    }

    /// Drop cached catalog responses.
    pub fn shutdown(&self) {
        self.inner.catalog.invalidate();
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Tracker publishing whether any request is in flight.
    #[must_use]
    pub fn loading(&self) -> &LoadingTracker {
        &self.inner.loading
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn orders(&self) -> &OrderHistory {
        &self.inner.orders
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutCoordinator {
        &self.inner.checkout
    }

    #[must_use]
    pub fn recovery(&self) -> &PasswordRecovery {
        &self.inner.recovery
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("api_base_url", &self.inner.config.api_base_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}
