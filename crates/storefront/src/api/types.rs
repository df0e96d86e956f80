//! Domain types exchanged with the commerce API.
//!
//! Catalog types deserialize straight from the API's JSON (documents use
//! `_id` and camelCase field names). Cart and order payloads go through the
//! wire envelopes in `api::http::wire` first.

use chrono::{DateTime, Utc};
use freshcart_core::{
    BrandId, CartId, CartLineId, CategoryId, Email, Money, OrderId, OrderStatus, Password,
    PaymentMethod, Phone, ProductId, SubcategoryId, UserId,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog Types
// =============================================================================

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Subcategory belonging to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    #[serde(rename = "_id")]
    pub id: SubcategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    /// Parent category id.
    pub category: CategoryId,
}

/// Product brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    #[serde(rename = "_id")]
    pub id: BrandId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A catalog product. Wishlist entries are full product snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// Units in stock.
    #[serde(default)]
    pub quantity: u32,
    pub price: Money,
    #[serde(default)]
    pub price_after_discount: Option<Money>,
    #[serde(default)]
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub subcategory: Vec<Subcategory>,
    #[serde(default)]
    pub brand: Option<Brand>,
    #[serde(default)]
    pub ratings_average: f64,
    #[serde(default)]
    pub ratings_quantity: u32,
    #[serde(default)]
    pub sold: Option<u64>,
}

impl Product {
    /// The price a shopper pays: the discounted price when one is set.
    #[must_use]
    pub fn effective_price(&self) -> Money {
        self.price_after_discount.unwrap_or(self.price)
    }

    /// Reduced snapshot as carried by cart lines.
    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            image_cover: self.image_cover.clone(),
            category: self.category.clone(),
            brand: self.brand.clone(),
            ratings_average: self.ratings_average,
        }
    }
}

/// The product fields a cart or order line carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_cover: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub brand: Option<Brand>,
    #[serde(default)]
    pub ratings_average: f64,
}

impl ProductSummary {
    /// Summary that only knows the product id.
    #[must_use]
    pub fn bare(id: ProductId) -> Self {
        Self {
            id,
            title: String::new(),
            image_cover: String::new(),
            category: None,
            brand: None,
            ratings_average: 0.0,
        }
    }
}

/// A line item's product: a populated summary, or just the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Id(ProductId),
    Summary(ProductSummary),
}

impl ProductRef {
    /// The referenced product id.
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        match self {
            Self::Id(id) => id,
            Self::Summary(summary) => &summary.id,
        }
    }

    /// Populated summary, or a bare one built from the id.
    #[must_use]
    pub fn into_summary(self) -> ProductSummary {
        match self {
            Self::Id(id) => ProductSummary::bare(id),
            Self::Summary(summary) => summary,
        }
    }
}

/// Pagination block returned with list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub number_of_pages: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub prev_page: Option<u32>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Number of results on this page.
    #[serde(default)]
    pub results: u32,
    #[serde(default)]
    pub metadata: PageMetadata,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// An empty first page.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            results: 0,
            metadata: PageMetadata {
                current_page: 1,
                number_of_pages: 1,
                ..PageMetadata::default()
            },
            data: Vec::new(),
        }
    }

    /// Whether a following page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.metadata.next_page.is_some()
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// One line of the server cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Server id of the line, when the server sent one.
    pub id: Option<CartLineId>,
    pub product: ProductSummary,
    /// Always at least 1.
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartLine {
    /// `unit_price x quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// The authenticated user's cart as last confirmed by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Server cart resource id.
    pub id: Option<CartId>,
    /// Owning user.
    pub owner: Option<UserId>,
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// The empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn units(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product.id == product_id)
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.line(product_id).is_some()
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// Delivery address attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub details: String,
    pub phone: String,
    pub city: String,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub count: u32,
    pub price: Money,
    pub product: ProductRef,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub cart_items: Vec<OrderLine>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub tax_price: Money,
    #[serde(default)]
    pub shipping_price: Money,
    pub total_order_price: Money,
    #[serde(default, alias = "paymentMethod")]
    pub payment_method_type: PaymentMethod,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub is_delivered: bool,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Fulfilment status derived from the paid/delivered flags.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        OrderStatus::from_flags(self.is_paid, self.is_delivered)
    }
}

/// Body of an order placement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub shipping_address: ShippingAddress,
}

/// Server answer to a card checkout session request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaymentSession {
    /// `status` field of the response.
    pub status: Option<String>,
    /// External payment gateway URL.
    pub url: Option<String>,
}

impl PaymentSession {
    /// The gateway URL, when the server reported success and sent one.
    #[must_use]
    pub fn redirect_url(&self) -> Option<&str> {
        if self.status.as_deref() == Some("success") {
            self.url.as_deref().filter(|url| !url.is_empty())
        } else {
            None
        }
    }
}

/// Server answer to a cash order request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CashOrderReceipt {
    /// `status` field of the response.
    pub status: Option<String>,
    /// Whether the response carried a non-null `data` field.
    pub has_data: bool,
    /// The order, when `data` parsed as one.
    pub order: Option<Order>,
    /// Top-level `_id`, when present.
    pub order_id: Option<OrderId>,
}

impl CashOrderReceipt {
    /// A response carrying `data`, `status == "success"` or an `_id`
    /// confirms the order.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.has_data || self.status.as_deref() == Some("success") || self.order_id.is_some()
    }
}

// =============================================================================
// Account Types
// =============================================================================

/// Decoded token claims returned by token verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

/// Signed-in user as returned by `users/getMe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: String,
}

/// Validated sign-in form.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: Password,
}

/// Successful sign-in.
#[derive(Debug, Clone)]
pub struct SignIn {
    pub token: SecretString,
    /// Display name of the user, when the server sent it.
    pub name: Option<String>,
}

/// Validated sign-up form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub password: Password,
    pub phone: Phone,
}

/// Validated profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: Email,
    pub phone: Phone,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: &str, quantity: u32, price: i64) -> CartLine {
        CartLine {
            id: None,
            product: ProductSummary::bare(ProductId::new(id)),
            quantity,
            unit_price: Money::from_major(price),
        }
    }

    #[test]
    fn test_cart_total_is_sum_of_line_totals() {
        let cart = Cart {
            id: Some(CartId::new("c1")),
            owner: None,
            lines: vec![line("p1", 2, 149), line("p2", 1, 20)],
        };
        assert_eq!(cart.total(), Money::from_major(318));
        assert_eq!(cart.count(), 2);
        assert_eq!(cart.units(), 3);
        assert!(cart.contains(&ProductId::new("p2")));
        assert!(!cart.contains(&ProductId::new("p3")));
    }

    #[test]
    fn test_product_deserializes_api_document() {
        let json = serde_json::json!({
            "sold": 4,
            "images": ["a.jpeg"],
            "subcategory": [{"_id": "s1", "name": "Women's Clothing", "slug": "women's-clothing", "category": "c1"}],
            "ratingsQuantity": 18,
            "_id": "6428ebc6dc1175abc65ca0b9",
            "title": "Woman Shawl",
            "slug": "woman-shawl",
            "description": "Material Polyester Blend",
            "quantity": 225,
            "price": 149,
            "imageCover": "cover.jpeg",
            "category": {"_id": "c1", "name": "Women's Fashion", "slug": "women's-fashion", "image": "c.jpeg"},
            "brand": {"_id": "b1", "name": "DeFacto", "slug": "defacto", "image": "b.png"},
            "ratingsAverage": 4.8,
            "createdAt": "2023-04-02T02:43:18.400Z",
            "updatedAt": "2023-04-02T02:43:18.400Z",
            "id": "6428ebc6dc1175abc65ca0b9"
        });

        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.id.as_str(), "6428ebc6dc1175abc65ca0b9");
        assert_eq!(product.price, Money::from_major(149));
        assert_eq!(product.effective_price(), Money::from_major(149));
        assert_eq!(product.brand.unwrap().name, "DeFacto");
        assert_eq!(product.subcategory.len(), 1);
    }

    #[test]
    fn test_product_ref_accepts_id_or_object() {
        let bare: ProductRef = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(bare.id().as_str(), "p1");

        let full: ProductRef =
            serde_json::from_str(r#"{"_id": "p2", "title": "Shawl", "imageCover": "x"}"#).unwrap();
        assert_eq!(full.into_summary().title, "Shawl");
    }

    #[test]
    fn test_checkout_outcome_rules() {
        let failed = PaymentSession {
            status: Some("fail".into()),
            url: Some("https://pay.example/session".into()),
        };
        assert_eq!(failed.redirect_url(), None);

        let ok = PaymentSession {
            status: Some("success".into()),
            url: Some("https://pay.example/session".into()),
        };
        assert_eq!(ok.redirect_url(), Some("https://pay.example/session"));

        assert!(!CashOrderReceipt::default().is_confirmed());
        assert!(
            CashOrderReceipt {
                order_id: Some(OrderId::new("o1")),
                ..CashOrderReceipt::default()
            }
            .is_confirmed()
        );
    }

    #[test]
    fn test_order_status_and_payment_method() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "_id": "o1",
            "cartItems": [{"count": 1, "price": 50, "product": "p1"}],
            "shippingAddress": {"details": "12 Tahrir Street", "phone": "01012345678", "city": "Cairo"},
            "totalOrderPrice": 50,
            "paymentMethodType": "cash",
            "isPaid": false,
            "isDelivered": false,
            "createdAt": "2024-01-10T09:30:00.000Z"
        }))
        .unwrap();

        assert_eq!(order.payment_method_type, PaymentMethod::Cash);
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.cart_items.first().unwrap().product.id().as_str(), "p1");
    }
}
