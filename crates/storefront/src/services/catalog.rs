//! Catalog reads.
//!
//! Unfiltered product pages and single products go through the response
//! cache. Searches and category filters always hit the API.

use std::sync::Arc;

use freshcart_core::{BrandId, CategoryId, ProductId};
use tracing::{debug, instrument};

use crate::api::types::{Brand, Category, Page, Product, Subcategory};
use crate::api::{CatalogApi, ProductQuery};
use crate::cache::{CacheKey, CacheValue, ResponseCache};
use crate::error::Result;

/// Read-only catalog access.
#[derive(Clone)]
pub struct Catalog {
    api: Arc<dyn CatalogApi>,
    cache: ResponseCache,
    page_limit: u32,
}

impl Catalog {
    pub fn new(api: Arc<dyn CatalogApi>, cache: ResponseCache, page_limit: u32) -> Self {
        Self {
            api,
            cache,
            page_limit,
        }
    }

    /// One page of the product listing.
    ///
    /// # Errors
    ///
    /// Returns the API error on a cache miss.
    #[instrument(skip(self))]
    pub async fn products(&self, page: u32) -> Result<Page<Product>> {
        if let Some(products) = self.cache.products_page(page, self.page_limit).await {
            return Ok(products);
        }

        let products = self
            .api
            .products(&ProductQuery::page(page, self.page_limit))
            .await?;
        self.cache
            .put(
                CacheKey::ProductsPage {
                    page,
                    limit: self.page_limit,
                },
                CacheValue::ProductsPage(products.clone()),
            )
            .await;
        Ok(products)
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns the API error on a cache miss.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product> {
        if let Some(product) = self.cache.product(id).await {
            return Ok(product);
        }

        let product = self.api.product(id).await?;
        self.cache
            .put(
                CacheKey::Product(id.clone()),
                CacheValue::Product(Box::new(product.clone())),
            )
            .await;
        Ok(product)
    }

    /// Products whose title matches `query`. A blank query returns an empty
    /// page without a request.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Page<Product>> {
        let query = query.trim();
        if query.is_empty() {
            debug!("Blank search, skipping request");
            return Ok(Page::empty());
        }

        self.api
            .products(&ProductQuery {
                title: Some(query.to_string()),
                ..ProductQuery::page(1, self.page_limit)
            })
            .await
    }

    /// One page of products in a category.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn products_by_category(
        &self,
        category_id: &CategoryId,
        page: u32,
    ) -> Result<Page<Product>> {
        self.api
            .products(&ProductQuery {
                category: Some(category_id.clone()),
                ..ProductQuery::page(page, self.page_limit)
            })
            .await
    }

    /// # Errors
    ///
    /// Returns the API error.
    pub async fn categories(&self, page: u32) -> Result<Page<Category>> {
        self.api.categories(page).await
    }

    /// # Errors
    ///
    /// Returns the API error.
    pub async fn subcategories(&self, category_id: &CategoryId) -> Result<Vec<Subcategory>> {
        self.api.subcategories(category_id).await
    }

    /// # Errors
    ///
    /// Returns the API error.
    pub async fn brands(&self, page: u32) -> Result<Page<Brand>> {
        self.api.brands(page).await
    }

    /// # Errors
    ///
    /// Returns the API error.
    pub async fn brand(&self, id: &BrandId) -> Result<Brand> {
        self.api.brand(id).await
    }

    /// Drop every cached response.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("page_limit", &self.page_limit)
            .finish_non_exhaustive()
    }
}
