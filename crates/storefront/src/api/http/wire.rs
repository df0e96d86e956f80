//! Request and response envelopes as the commerce API spells them.

use freshcart_core::{CartId, CartLineId, Money, OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::api::types::{
    CashOrderReceipt, Cart, CartLine, Identity, Order, PaymentSession, Product, ProductRef,
    UserProfile,
};

// =============================================================================
// Errors
// =============================================================================

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    errors: Option<FieldError>,
}

#[derive(Deserialize)]
struct FieldError {
    msg: Option<String>,
}

/// Pull a human-readable message out of an error body.
///
/// Validation failures come back as `{"message": "fail", "errors": {"msg": ...}}`,
/// everything else as `{"message": ...}`.
pub fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let field_message = parsed
        .errors
        .and_then(|errors| errors.msg)
        .filter(|msg| !msg.is_empty());
    field_message.or_else(|| parsed.message.filter(|msg| !msg.is_empty()))
}

// =============================================================================
// Envelopes
// =============================================================================

/// `{"data": T}`.
#[derive(Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub re_password: &'a str,
    pub phone: &'a str,
}

#[derive(Deserialize)]
pub struct SignedInUser {
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct SignInResponse {
    pub message: Option<String>,
    pub token: Option<String>,
    pub user: Option<SignedInUser>,
}

#[derive(Deserialize)]
pub struct VerifyResponse {
    pub message: Option<String>,
    pub decoded: Option<Identity>,
}

// =============================================================================
// Account
// =============================================================================

/// `users/getMe` answers with `{"data": user}` or `{"user": user}`.
#[derive(Deserialize)]
pub struct ProfileResponse {
    data: Option<UserProfile>,
    user: Option<UserProfile>,
}

impl ProfileResponse {
    pub fn into_profile(self) -> Option<UserProfile> {
        self.data.or(self.user)
    }
}

#[derive(Serialize)]
pub struct ProfileUpdateRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
}

#[derive(Serialize)]
pub struct EmailRequest<'a> {
    pub email: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: Option<String>,
    pub status_msg: Option<String>,
    pub message: Option<String>,
}

impl StatusResponse {
    /// The most descriptive text the server sent.
    pub fn text(self) -> String {
        self.message
            .or(self.status)
            .or(self.status_msg)
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
pub struct TokenResponse {
    pub token: Option<String>,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest<'a> {
    pub product_id: &'a str,
    pub count: u32,
}

#[derive(Serialize)]
pub struct CountRequest {
    pub count: u32,
}

#[derive(Deserialize)]
pub struct WireCartLine {
    #[serde(rename = "_id")]
    pub id: Option<CartLineId>,
    pub count: u32,
    pub product: ProductRef,
    pub price: Money,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartData {
    #[serde(rename = "_id")]
    pub id: Option<CartId>,
    pub cart_owner: Option<UserId>,
    #[serde(default)]
    pub products: Vec<WireCartLine>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub cart_id: Option<CartId>,
    pub data: Option<CartData>,
}

impl CartResponse {
    /// Cart id from the top level or from the cart document.
    pub fn cart_id(&self) -> Option<CartId> {
        self.cart_id
            .clone()
            .or_else(|| self.data.as_ref().and_then(|data| data.id.clone()))
    }

    /// Convert into the domain cart, dropping lines with a zero count.
    pub fn into_cart(self) -> Cart {
        let id = self.cart_id();
        let Some(data) = self.data else {
            return Cart {
                id,
                ..Cart::default()
            };
        };

        let lines = data
            .products
            .into_iter()
            .filter(|line| line.count > 0)
            .map(|line| CartLine {
                id: line.id,
                product: line.product.into_summary(),
                quantity: line.count,
                unit_price: line.price,
            })
            .collect();

        Cart {
            id,
            owner: data.cart_owner,
            lines,
        }
    }
}

// =============================================================================
// Wishlist
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdRequest<'a> {
    pub product_id: &'a str,
}

/// `GET wishlist` answers with full products; mutations answer with ids.
#[derive(Deserialize)]
pub struct WishlistResponse {
    #[serde(default)]
    pub data: Vec<Product>,
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Deserialize)]
pub struct SessionUrl {
    pub url: Option<String>,
}

#[derive(Deserialize)]
pub struct PaymentSessionResponse {
    pub status: Option<String>,
    pub session: Option<SessionUrl>,
}

impl From<PaymentSessionResponse> for PaymentSession {
    fn from(response: PaymentSessionResponse) -> Self {
        Self {
            status: response.status,
            url: response.session.and_then(|session| session.url),
        }
    }
}

#[derive(Deserialize)]
pub struct CashOrderResponse {
    pub status: Option<String>,
    pub data: Option<serde_json::Value>,
    #[serde(rename = "_id")]
    pub id: Option<OrderId>,
}

impl From<CashOrderResponse> for CashOrderReceipt {
    fn from(response: CashOrderResponse) -> Self {
        let data = response.data.filter(|value| !value.is_null());
        let has_data = data.is_some();
        let order = data.and_then(|value| serde_json::from_value::<Order>(value).ok());
        Self {
            status: response.status,
            has_data,
            order_id: response
                .id
                .or_else(|| order.as_ref().map(|order| order.id.clone())),
            order,
        }
    }
}

/// Order history comes back as a bare array, `{"data": [...]}` or
/// `{"orders": [...]}` depending on the deployment.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum OrdersResponse {
    List(Vec<Order>),
    Data { data: Vec<Order> },
    Orders { orders: Vec<Order> },
}

impl OrdersResponse {
    pub fn into_orders(self) -> Vec<Order> {
        match self {
            Self::List(orders) | Self::Data { data: orders } | Self::Orders { orders } => orders,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use freshcart_core::ProductId;

    #[test]
    fn test_error_message_prefers_field_error() {
        let body = r#"{"message":"fail","errors":{"value":"x","msg":"Invalid email","param":"email","location":"body"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("Invalid email"));

        let body = r#"{"statusMsg":"fail","message":"Incorrect email or password"}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Incorrect email or password")
        );

        assert_eq!(error_message("<html></html>"), None);
    }

    #[test]
    fn test_cart_response_with_populated_products() {
        let body = serde_json::json!({
            "status": "success",
            "numOfCartItems": 1,
            "cartId": "cart-1",
            "data": {
                "_id": "cart-1",
                "cartOwner": "user-1",
                "products": [
                    {"count": 2, "_id": "line-1", "product": {"_id": "p1", "title": "Shawl", "imageCover": "c.jpeg"}, "price": 149},
                    {"count": 0, "_id": "line-2", "product": {"_id": "p2", "title": "Gone"}, "price": 10}
                ],
                "totalCartPrice": 298
            }
        });

        let cart = serde_json::from_value::<CartResponse>(body)
            .unwrap()
            .into_cart();
        assert_eq!(cart.id, Some(CartId::new("cart-1")));
        assert_eq!(cart.count(), 1);
        assert_eq!(cart.total(), Money::from_major(298));
        assert_eq!(cart.lines.first().unwrap().product.title, "Shawl");
    }

    #[test]
    fn test_cart_response_with_product_ids() {
        let body = serde_json::json!({
            "status": "success",
            "message": "Product added successfully to your cart",
            "numOfCartItems": 1,
            "cartId": "cart-9",
            "data": {
                "_id": "cart-9",
                "products": [{"count": 1, "_id": "l1", "product": "p1", "price": 20}],
                "totalCartPrice": 20
            }
        });

        let response: CartResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.cart_id(), Some(CartId::new("cart-9")));
        let cart = response.into_cart();
        assert!(cart.contains(&ProductId::new("p1")));
    }

    #[test]
    fn test_cash_order_receipt() {
        let receipt: CashOrderReceipt = serde_json::from_value::<CashOrderResponse>(
            serde_json::json!({"status": "success", "data": {"unexpected": true}}),
        )
        .unwrap()
        .into();
        assert!(receipt.has_data);
        assert!(receipt.order.is_none());
        assert!(receipt.is_confirmed());

        let receipt: CashOrderReceipt =
            serde_json::from_value::<CashOrderResponse>(serde_json::json!({"data": null}))
                .unwrap()
                .into();
        assert!(!receipt.is_confirmed());
    }

    #[test]
    fn test_orders_response_shapes() {
        let order = serde_json::json!({"_id": "o1", "totalOrderPrice": 10});
        for body in [
            serde_json::json!([order.clone()]),
            serde_json::json!({"data": [order.clone()]}),
            serde_json::json!({"orders": [order]}),
        ] {
            let orders = serde_json::from_value::<OrdersResponse>(body)
                .unwrap()
                .into_orders();
            assert_eq!(orders.len(), 1);
        }
    }
}
