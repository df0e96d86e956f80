//! Catalog endpoints. None of them need a session.

use async_trait::async_trait;
use freshcart_core::{BrandId, CategoryId, ProductId};
use reqwest::Method;
use tracing::instrument;

use super::wire::DataEnvelope;
use super::{Auth, HttpApi};
use crate::api::types::{Brand, Category, Page, Product, Subcategory};
use crate::api::{CatalogApi, ProductQuery};
use crate::error::Result;

#[async_trait]
impl CatalogApi for HttpApi {
    #[instrument(skip(self))]
    async fn products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        let mut url = self.url("products")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("page", &query.page.to_string())
                .append_pair("limit", &query.limit.to_string());
            if let Some(title) = &query.title {
                pairs.append_pair("title[regex]", title);
            }
            if let Some(category) = &query.category {
                pairs.append_pair("category", category.as_str());
            }
        }
        self.execute(self.request(Method::GET, url, Auth::Anonymous))
            .await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn product(&self, id: &ProductId) -> Result<Product> {
        let url = self.resource_url("products", id.as_str())?;
        let envelope: DataEnvelope<Product> = self
            .execute(self.request(Method::GET, url, Auth::Anonymous))
            .await?;
        Ok(envelope.data)
    }

    #[instrument(skip(self))]
    async fn categories(&self, page: u32) -> Result<Page<Category>> {
        let mut url = self.url("categories")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        self.execute(self.request(Method::GET, url, Auth::Anonymous))
            .await
    }

    #[instrument(skip(self), fields(category_id = %category_id))]
    async fn subcategories(&self, category_id: &CategoryId) -> Result<Vec<Subcategory>> {
        let url = self.url(&format!(
            "categories/{}/subcategories",
            urlencoding::encode(category_id.as_str())
        ))?;
        let envelope: DataEnvelope<Vec<Subcategory>> = self
            .execute(self.request(Method::GET, url, Auth::Anonymous))
            .await?;
        Ok(envelope.data)
    }

    #[instrument(skip(self))]
    async fn brands(&self, page: u32) -> Result<Page<Brand>> {
        let mut url = self.url("brands")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        self.execute(self.request(Method::GET, url, Auth::Anonymous))
            .await
    }

    #[instrument(skip(self), fields(brand_id = %id))]
    async fn brand(&self, id: &BrandId) -> Result<Brand> {
        let url = self.resource_url("brands", id.as_str())?;
        let envelope: DataEnvelope<Brand> = self
            .execute(self.request(Method::GET, url, Auth::Anonymous))
            .await?;
        Ok(envelope.data)
    }
}
