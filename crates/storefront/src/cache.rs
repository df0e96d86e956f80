//! Short-lived cache for catalog reads.
//!
//! Backed by `moka` with a time-to-live: an entry older than the freshness
//! window is treated as absent on lookup. Only product pages and single
//! products are cached; cart and wishlist state never goes through here.

use std::time::Duration;

use freshcart_core::ProductId;
use moka::future::Cache;
use tracing::debug;

use crate::api::types::{Page, Product};

/// Cache key for catalog responses.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// One unfiltered product listing page.
    ProductsPage { page: u32, limit: u32 },
    /// One product by id.
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    ProductsPage(Page<Product>),
    Product(Box<Product>),
}

/// Time-keyed lookup for catalog responses.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Cache<CacheKey, CacheValue>,
}

impl ResponseCache {
    /// Create a cache whose entries expire `ttl` after insertion.
    #[must_use]
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Look up a fresh entry.
    pub async fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        let value = self.entries.get(key).await;
        debug!(?key, hit = value.is_some(), "Catalog cache lookup");
        value
    }

    /// Insert or replace an entry, restarting its freshness window.
    pub async fn put(&self, key: CacheKey, value: CacheValue) {
        self.entries.insert(key, value).await;
    }

    /// Drop one entry.
    pub async fn invalidate(&self, key: &CacheKey) {
        self.entries.invalidate(key).await;
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    /// Cached page of products.
    pub async fn products_page(&self, page: u32, limit: u32) -> Option<Page<Product>> {
        match self.get(&CacheKey::ProductsPage { page, limit }).await {
            Some(CacheValue::ProductsPage(products)) => Some(products),
            _ => None,
        }
    }

    /// Cached product.
    pub async fn product(&self, id: &ProductId) -> Option<Product> {
        match self.get(&CacheKey::Product(id.clone())).await {
            Some(CacheValue::Product(product)) => Some(*product),
            _ => None,
        }
    }
}
