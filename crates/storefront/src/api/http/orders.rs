//! Order placement and history.

use async_trait::async_trait;
use freshcart_core::{CartId, OrderId, UserId};
use reqwest::Method;
use secrecy::SecretString;
use tracing::instrument;

use super::wire::{CashOrderResponse, DataEnvelope, OrdersResponse, PaymentSessionResponse};
use super::{Auth, HttpApi};
use crate::api::OrderApi;
use crate::api::types::{CashOrderReceipt, Order, OrderRequest, PaymentSession};
use crate::error::Result;

#[async_trait]
impl OrderApi for HttpApi {
    #[instrument(skip(self, token, request), fields(cart_id = %cart_id))]
    async fn checkout_session(
        &self,
        token: &SecretString,
        cart_id: &CartId,
        request: &OrderRequest,
        return_url: &str,
    ) -> Result<PaymentSession> {
        let mut url = self.resource_url("orders/checkout-session", cart_id.as_str())?;
        url.query_pairs_mut().append_pair("url", return_url);
        let response: PaymentSessionResponse = self
            .execute(self.request(Method::POST, url, Auth::Token(token)).json(request))
            .await?;
        Ok(response.into())
    }

    #[instrument(skip(self, token, request), fields(cart_id = %cart_id))]
    async fn cash_order(
        &self,
        token: &SecretString,
        cart_id: &CartId,
        request: &OrderRequest,
    ) -> Result<CashOrderReceipt> {
        let url = self.resource_url("orders", cart_id.as_str())?;
        let response: CashOrderResponse = self
            .execute(self.request(Method::POST, url, Auth::Token(token)).json(request))
            .await?;
        Ok(response.into())
    }

    #[instrument(skip(self, token), fields(user_id = %user_id))]
    async fn user_orders(&self, token: &SecretString, user_id: &UserId) -> Result<Vec<Order>> {
        let url = self.resource_url("orders/user", user_id.as_str())?;
        let response: OrdersResponse = self
            .execute(self.request(Method::GET, url, Auth::Token(token)))
            .await?;
        Ok(response.into_orders())
    }

    #[instrument(skip(self, token), fields(order_id = %order_id))]
    async fn order(&self, token: &SecretString, order_id: &OrderId) -> Result<Order> {
        let url = self.resource_url("orders", order_id.as_str())?;
        let envelope: DataEnvelope<Order> = self
            .execute(self.request(Method::GET, url, Auth::Token(token)))
            .await?;
        Ok(envelope.data)
    }
}
