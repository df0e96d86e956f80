//! Wishlist endpoints.

use async_trait::async_trait;
use freshcart_core::ProductId;
use reqwest::Method;
use secrecy::SecretString;
use serde::de::IgnoredAny;
use tracing::instrument;

use super::wire::{ProductIdRequest, WishlistResponse};
use super::{Auth, HttpApi};
use crate::api::WishlistApi;
use crate::api::types::Product;
use crate::error::Result;

#[async_trait]
impl WishlistApi for HttpApi {
    #[instrument(skip_all)]
    async fn get_wishlist(&self, token: &SecretString) -> Result<Vec<Product>> {
        let url = self.url("wishlist")?;
        let response: WishlistResponse = self
            .execute(self.request(Method::GET, url, Auth::Token(token)))
            .await?;
        Ok(response.data)
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn add_to_wishlist(&self, token: &SecretString, product_id: &ProductId) -> Result<()> {
        let url = self.url("wishlist")?;
        let body = ProductIdRequest {
            product_id: product_id.as_str(),
        };
        let _: IgnoredAny = self
            .execute(self.request(Method::POST, url, Auth::Token(token)).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn remove_from_wishlist(
        &self,
        token: &SecretString,
        product_id: &ProductId,
    ) -> Result<()> {
        let url = self.resource_url("wishlist", product_id.as_str())?;
        let _: IgnoredAny = self
            .execute(self.request(Method::DELETE, url, Auth::Token(token)))
            .await?;
        Ok(())
    }
}
