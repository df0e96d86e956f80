//! Cart endpoints.

use async_trait::async_trait;
use freshcart_core::{CartId, ProductId};
use reqwest::Method;
use secrecy::SecretString;
use serde::de::IgnoredAny;
use tracing::{debug, instrument};

use super::wire::{AddToCartRequest, CartResponse, CountRequest};
use super::{Auth, HttpApi};
use crate::api::CartApi;
use crate::api::types::Cart;
use crate::error::{ClientError, Result};

#[async_trait]
impl CartApi for HttpApi {
    #[instrument(skip_all)]
    async fn get_cart(&self, token: &SecretString) -> Result<Cart> {
        let url = self.url("cart")?;
        match self
            .execute::<CartResponse>(self.request(Method::GET, url, Auth::Token(token)))
            .await
        {
            Ok(response) => Ok(response.into_cart()),
            // The API answers 404 until the user's first add-to-cart.
            Err(ClientError::NotFound(message)) => {
                debug!(%message, "No cart yet");
                Ok(Cart::empty())
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn add_to_cart(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Option<CartId>> {
        let url = self.url("cart")?;
        let body = AddToCartRequest {
            product_id: product_id.as_str(),
            count: quantity,
        };
        let response: CartResponse = self
            .execute(self.request(Method::POST, url, Auth::Token(token)).json(&body))
            .await?;
        Ok(response.cart_id())
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn update_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Option<CartId>> {
        let url = self.resource_url("cart", product_id.as_str())?;
        let response: CartResponse = self
            .execute(
                self.request(Method::PUT, url, Auth::Token(token))
                    .json(&CountRequest { count: quantity }),
            )
            .await?;
        Ok(response.cart_id())
    }

    #[instrument(skip(self, token), fields(product_id = %product_id))]
    async fn remove_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
    ) -> Result<Option<CartId>> {
        let url = self.resource_url("cart", product_id.as_str())?;
        let response: CartResponse = self
            .execute(self.request(Method::DELETE, url, Auth::Token(token)))
            .await?;
        Ok(response.cart_id())
    }

    #[instrument(skip_all)]
    async fn clear_cart(&self, token: &SecretString) -> Result<()> {
        let url = self.url("cart")?;
        let _: IgnoredAny = self
            .execute(self.request(Method::DELETE, url, Auth::Token(token)))
            .await?;
        Ok(())
    }
}
