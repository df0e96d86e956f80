//! The commerce API seam.
//!
//! Stores and services talk to the remote API only through these traits.
//! [`HttpApi`] is the `reqwest` implementation; tests substitute in-memory
//! fakes. Every authenticated call takes the session token explicitly: the
//! API layer holds no session state of its own.
//!
//! # Endpoints
//!
//! | Trait | Endpoints |
//! |-------|-----------|
//! | [`AuthApi`] | `auth/signin`, `auth/signup`, `auth/verifyToken` |
//! | [`AccountApi`] | `users/getMe`, `users/updateMe/`, password recovery paths |
//! | [`CartApi`] | `cart`, `cart/{product_id}` |
//! | [`WishlistApi`] | `wishlist`, `wishlist/{product_id}` |
//! | [`CatalogApi`] | `products`, `categories`, `brands` |
//! | [`OrderApi`] | `orders/{cart_id}`, `orders/checkout-session/{cart_id}`, `orders/user/{user_id}` |

pub mod http;
pub mod types;

pub use http::HttpApi;
pub use types::*;

use async_trait::async_trait;
use freshcart_core::{
    BrandId, CartId, CategoryId, Email, OrderId, Password, ProductId, UserId,
};
use secrecy::SecretString;

use crate::error::Result;

/// Sign-in, sign-up and token verification.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a session token.
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignIn>;

    /// Create an account. Does not sign in.
    async fn sign_up(&self, registration: &Registration) -> Result<()>;

    /// Verify a token sent in the `token` header.
    async fn verify_token(&self, token: &SecretString) -> Result<Identity>;

    /// Verify a token sent as `Authorization: Bearer`.
    async fn verify_token_bearer(&self, token: &SecretString) -> Result<Identity>;
}

/// Profile and password recovery.
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// Fetch the signed-in user.
    async fn current_user(&self, token: &SecretString) -> Result<UserProfile>;

    /// Update name, email and phone.
    async fn update_profile(&self, token: &SecretString, update: &ProfileUpdate) -> Result<()>;

    /// Ask the server to email a reset code. Returns the server's message.
    async fn forgot_password(&self, email: &Email) -> Result<String>;

    /// Check a reset code. Returns the server's status text.
    async fn verify_reset_code(&self, email: &Email, code: &str) -> Result<String>;

    /// Set a new password. Returns a fresh token if the server issued one.
    async fn reset_password(
        &self,
        email: &Email,
        code: &str,
        new_password: &Password,
    ) -> Result<Option<SecretString>>;
}

/// The server-side cart.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Fetch the cart. A user without a cart gets an empty one.
    async fn get_cart(&self, token: &SecretString) -> Result<Cart>;

    /// Add a product. Returns the cart id when the response carried one.
    async fn add_to_cart(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Option<CartId>>;

    /// Set a line's quantity.
    async fn update_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Option<CartId>>;

    /// Remove a line.
    async fn remove_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
    ) -> Result<Option<CartId>>;

    /// Delete the whole cart.
    async fn clear_cart(&self, token: &SecretString) -> Result<()>;
}

/// The server-side wishlist.
#[async_trait]
pub trait WishlistApi: Send + Sync {
    /// Fetch wishlisted products in server order.
    async fn get_wishlist(&self, token: &SecretString) -> Result<Vec<Product>>;

    async fn add_to_wishlist(&self, token: &SecretString, product_id: &ProductId) -> Result<()>;

    async fn remove_from_wishlist(
        &self,
        token: &SecretString,
        product_id: &ProductId,
    ) -> Result<()>;
}

/// Filters for a product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: u32,
    pub limit: u32,
    /// Case-insensitive title match.
    pub title: Option<String>,
    pub category: Option<CategoryId>,
}

impl ProductQuery {
    /// Unfiltered listing of one page.
    #[must_use]
    pub const fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            title: None,
            category: None,
        }
    }

    /// Whether any filter is set.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.title.is_some() || self.category.is_some()
    }
}

/// Read-only catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn products(&self, query: &ProductQuery) -> Result<Page<Product>>;

    async fn product(&self, id: &ProductId) -> Result<Product>;

    async fn categories(&self, page: u32) -> Result<Page<Category>>;

    async fn subcategories(&self, category_id: &CategoryId) -> Result<Vec<Subcategory>>;

    async fn brands(&self, page: u32) -> Result<Page<Brand>>;

    async fn brand(&self, id: &BrandId) -> Result<Brand>;
}

/// Order placement and history.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Open a card payment session; `return_url` is where the gateway sends
    /// the shopper back to.
    async fn checkout_session(
        &self,
        token: &SecretString,
        cart_id: &CartId,
        request: &OrderRequest,
        return_url: &str,
    ) -> Result<PaymentSession>;

    /// Place a cash-on-delivery order.
    async fn cash_order(
        &self,
        token: &SecretString,
        cart_id: &CartId,
        request: &OrderRequest,
    ) -> Result<CashOrderReceipt>;

    async fn user_orders(&self, token: &SecretString, user_id: &UserId) -> Result<Vec<Order>>;

    async fn order(&self, token: &SecretString, order_id: &OrderId) -> Result<Order>;
}

/// Everything the storefront needs from the remote API.
pub trait CommerceApi:
    AuthApi + AccountApi + CartApi + WishlistApi + CatalogApi + OrderApi
{
}

impl<T> CommerceApi for T where
    T: AuthApi + AccountApi + CartApi + WishlistApi + CatalogApi + OrderApi
{
}
