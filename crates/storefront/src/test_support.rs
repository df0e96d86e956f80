//! In-memory commerce API and store harness for unit tests.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use freshcart_core::{
    BrandId, CartId, CartLineId, CategoryId, Email, Money, OrderId, Password, PaymentMethod,
    ProductId, UserId,
};
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Notify;

use crate::api::types::{
    Brand, Cart, CartLine, CashOrderReceipt, Category, Credentials, Identity, Order, OrderLine,
    OrderRequest, Page, PageMetadata, PaymentSession, Product, ProductRef, ProductSummary,
    ProfileUpdate, Registration, SignIn, Subcategory, UserProfile,
};
use crate::api::{
    AccountApi, AuthApi, CartApi, CatalogApi, OrderApi, ProductQuery, WishlistApi,
};
use crate::error::{ClientError, Result};
use crate::forms;
use crate::services::{CheckoutCoordinator, OrderHistory};
use crate::storage::{MemoryStorage, TokenVault};
use crate::stores::{CartStore, SessionHandle, SessionStore, WishlistStore};

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "Aa1@aaaa";
pub const TOKEN: &str = "T1";
pub const USER_ID: &str = "user-1";
const RESET_CODE: &str = "482913";
const RESET_TOKEN: &str = "T2";

/// A catalog product titled `Product {id}`.
pub fn product(id: &str, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        slug: id.to_string(),
        description: String::new(),
        quantity: 100,
        price: Money::from_major(price),
        price_after_discount: None,
        image_cover: format!("{id}.jpeg"),
        images: Vec::new(),
        category: None,
        subcategory: Vec::new(),
        brand: None,
        ratings_average: 4.5,
        ratings_quantity: 10,
        sold: None,
    }
}

fn order(id: &str, lines: Vec<OrderLine>, total: Money, method: PaymentMethod) -> Order {
    Order {
        id: OrderId::new(id),
        cart_items: lines,
        shipping_address: None,
        tax_price: Money::default(),
        shipping_price: Money::default(),
        total_order_price: total,
        payment_method_type: method,
        is_paid: false,
        is_delivered: false,
        paid_at: None,
        delivered_at: None,
        created_at: None,
        updated_at: None,
    }
}

#[derive(Default)]
struct FakeState {
    cart_id: Option<CartId>,
    cart_lines: Vec<(ProductId, u32)>,
    fail_next_cart_mutation: Option<ClientError>,
    wishlist: Vec<Product>,
    wishlist_removal_failures: HashMap<ProductId, ClientError>,
    verify_failure: Option<ClientError>,
    catalog: Vec<Product>,
    orders: Vec<(Order, UserId)>,
    order_failure: Option<ClientError>,
    order_gate: Option<Arc<Notify>>,
    add_gate: Option<Arc<Notify>>,
    payment_session_status: Option<String>,
    last_return_url: Option<String>,
    reset_code: Option<String>,
    profile: Option<UserProfile>,
}

/// In-memory stand-in for the remote API.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
    calls: AtomicUsize,
    cart_fetches: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of API calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of `get_cart` calls made so far.
    pub fn cart_fetches(&self) -> usize {
        self.cart_fetches.load(Ordering::SeqCst)
    }

    /// The cart as the server holds it.
    pub fn server_cart(&self) -> Cart {
        let state = self.state.lock();
        Self::cart_of(&state)
    }

    pub fn server_wishlist(&self) -> Vec<Product> {
        self.state.lock().wishlist.clone()
    }

    /// Change the server cart behind the client's back.
    pub fn put_server_line(&self, product_id: &str, quantity: u32) {
        let mut state = self.state.lock();
        state.cart_id.get_or_insert_with(|| CartId::new("cart-1"));
        state
            .cart_lines
            .push((ProductId::new(product_id), quantity));
    }

    pub fn put_server_wishlist(&self, product: Product) {
        self.state.lock().wishlist.push(product);
    }

    pub fn put_catalog_product(&self, product: Product) {
        self.state.lock().catalog.push(product);
    }

    pub fn put_order(&self, id: &str, user_id: &str) {
        let placed = order(id, Vec::new(), Money::from_major(10), PaymentMethod::Cash);
        self.state
            .lock()
            .orders
            .push((placed, UserId::new(user_id)));
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state
            .lock()
            .orders
            .iter()
            .map(|(order, _)| order.clone())
            .collect()
    }

    pub fn fail_next_cart_mutation(&self, error: ClientError) {
        self.state.lock().fail_next_cart_mutation = Some(error);
    }

    pub fn fail_wishlist_removal(&self, product_id: &str, error: ClientError) {
        self.state
            .lock()
            .wishlist_removal_failures
            .insert(ProductId::new(product_id), error);
    }

    /// Fail the next token verification.
    pub fn fail_verification(&self, error: ClientError) {
        self.state.lock().verify_failure = Some(error);
    }

    pub fn fail_next_order(&self, error: ClientError) {
        self.state.lock().order_failure = Some(error);
    }

    /// Hold the next order request until the returned gate is notified.
    pub fn hold_orders(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().order_gate = Some(gate.clone());
        gate
    }

    /// Hold the next cart or wishlist add until the returned gate is
    /// notified.
    pub fn hold_adds(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().add_gate = Some(gate.clone());
        gate
    }

    pub fn set_payment_session_status(&self, status: &str) {
        self.state.lock().payment_session_status = Some(status.to_string());
    }

    pub fn last_return_url(&self) -> Option<String> {
        self.state.lock().last_return_url.clone()
    }

    pub fn issued_reset_code(&self) -> Option<String> {
        self.state.lock().reset_code.clone()
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn check_token(token: &SecretString) -> Result<()> {
        if token.expose_secret() == TOKEN {
            Ok(())
        } else {
            Err(ClientError::Unauthorized(
                "Invalid Token. please login again".into(),
            ))
        }
    }

    fn identity() -> Identity {
        Identity {
            id: UserId::new(USER_ID),
            name: "Mona Ali".into(),
            role: "user".into(),
        }
    }

    fn verify(&self, token: &SecretString) -> Result<Identity> {
        self.record_call();
        if let Some(error) = self.state.lock().verify_failure.take() {
            return Err(error);
        }
        Self::check_token(token)?;
        Ok(Self::identity())
    }

    fn summary_of(state: &FakeState, product_id: &ProductId) -> ProductSummary {
        state
            .catalog
            .iter()
            .find(|product| &product.id == product_id)
            .map_or_else(|| ProductSummary::bare(product_id.clone()), Product::summary)
    }

    fn cart_of(state: &FakeState) -> Cart {
        let lines = state
            .cart_lines
            .iter()
            .map(|(product_id, quantity)| CartLine {
                id: Some(CartLineId::new(format!("line-{product_id}"))),
                product: Self::summary_of(state, product_id),
                quantity: *quantity,
                unit_price: Money::from_major(10),
            })
            .collect();
        Cart {
            id: state.cart_id.clone(),
            owner: state.cart_id.as_ref().map(|_| UserId::new(USER_ID)),
            lines,
        }
    }

    /// Pre-flight for cart mutations: token check and injected failure.
    fn begin_cart_mutation(&self, token: &SecretString) -> Result<parking_lot::MutexGuard<'_, FakeState>> {
        self.record_call();
        Self::check_token(token)?;
        let mut state = self.state.lock();
        if let Some(error) = state.fail_next_cart_mutation.take() {
            return Err(error);
        }
        Ok(state)
    }

    async fn wait_for_gate(&self) {
        let gate = self.state.lock().order_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    async fn wait_for_add_gate(&self) {
        let gate = self.state.lock().add_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl AuthApi for FakeApi {
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignIn> {
        self.record_call();
        if credentials.email.as_str() == EMAIL && credentials.password.expose() == PASSWORD {
            Ok(SignIn {
                token: SecretString::from(TOKEN),
                name: Some("Mona Ali".into()),
            })
        } else {
            Err(ClientError::Unauthorized("Incorrect email or password".into()))
        }
    }

    async fn sign_up(&self, _registration: &Registration) -> Result<()> {
        self.record_call();
        Ok(())
    }

    async fn verify_token(&self, token: &SecretString) -> Result<Identity> {
        self.verify(token)
    }

    async fn verify_token_bearer(&self, token: &SecretString) -> Result<Identity> {
        self.verify(token)
    }
}

#[async_trait]
impl AccountApi for FakeApi {
    async fn current_user(&self, token: &SecretString) -> Result<UserProfile> {
        self.record_call();
        Self::check_token(token)?;
        let state = self.state.lock();
        Ok(state.profile.clone().unwrap_or_else(|| UserProfile {
            id: UserId::new(USER_ID),
            name: "Mona Ali".into(),
            email: EMAIL.into(),
            phone: None,
            role: "user".into(),
        }))
    }

    async fn update_profile(&self, token: &SecretString, update: &ProfileUpdate) -> Result<()> {
        self.record_call();
        Self::check_token(token)?;
        self.state.lock().profile = Some(UserProfile {
            id: UserId::new(USER_ID),
            name: update.name.clone(),
            email: update.email.as_str().to_string(),
            phone: Some(update.phone.as_str().to_string()),
            role: "user".into(),
        });
        Ok(())
    }

    async fn forgot_password(&self, _email: &Email) -> Result<String> {
        self.record_call();
        self.state.lock().reset_code = Some(RESET_CODE.into());
        Ok("Reset code sent to your email".into())
    }

    async fn verify_reset_code(&self, _email: &Email, code: &str) -> Result<String> {
        self.record_call();
        if self.state.lock().reset_code.as_deref() == Some(code) {
            Ok("Success".into())
        } else {
            Err(ClientError::Rejected {
                status: 400,
                message: "Reset code is invalid or has expired".into(),
            })
        }
    }

    async fn reset_password(
        &self,
        _email: &Email,
        code: &str,
        _new_password: &Password,
    ) -> Result<Option<SecretString>> {
        self.record_call();
        let mut state = self.state.lock();
        if state.reset_code.as_deref() == Some(code) {
            state.reset_code = None;
            Ok(Some(SecretString::from(RESET_TOKEN)))
        } else {
            Err(ClientError::Rejected {
                status: 400,
                message: "Reset code is invalid or has expired".into(),
            })
        }
    }
}

#[async_trait]
impl CartApi for FakeApi {
    async fn get_cart(&self, token: &SecretString) -> Result<Cart> {
        self.record_call();
        self.cart_fetches.fetch_add(1, Ordering::SeqCst);
        Self::check_token(token)?;
        Ok(Self::cart_of(&self.state.lock()))
    }

    async fn add_to_cart(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Option<CartId>> {
        self.wait_for_add_gate().await;
        let mut state = self.begin_cart_mutation(token)?;
        let cart_id = state
            .cart_id
            .get_or_insert_with(|| CartId::new("cart-1"))
            .clone();
        match state.cart_lines.iter_mut().find(|(id, _)| id == product_id) {
            Some((_, count)) => *count += quantity,
            None => state.cart_lines.push((product_id.clone(), quantity)),
        }
        Ok(Some(cart_id))
    }

    async fn update_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Option<CartId>> {
        let mut state = self.begin_cart_mutation(token)?;
        let Some((_, count)) = state.cart_lines.iter_mut().find(|(id, _)| id == product_id) else {
            return Err(ClientError::NotFound("product not in cart".into()));
        };
        *count = quantity;
        Ok(state.cart_id.clone())
    }

    async fn remove_cart_item(
        &self,
        token: &SecretString,
        product_id: &ProductId,
    ) -> Result<Option<CartId>> {
        let mut state = self.begin_cart_mutation(token)?;
        state.cart_lines.retain(|(id, _)| id != product_id);
        Ok(state.cart_id.clone())
    }

    async fn clear_cart(&self, token: &SecretString) -> Result<()> {
        let mut state = self.begin_cart_mutation(token)?;
        state.cart_id = None;
        state.cart_lines.clear();
        Ok(())
    }
}

#[async_trait]
impl WishlistApi for FakeApi {
    async fn get_wishlist(&self, token: &SecretString) -> Result<Vec<Product>> {
        self.record_call();
        Self::check_token(token)?;
        Ok(self.state.lock().wishlist.clone())
    }

    async fn add_to_wishlist(&self, token: &SecretString, product_id: &ProductId) -> Result<()> {
        self.wait_for_add_gate().await;
        self.record_call();
        Self::check_token(token)?;
        let mut state = self.state.lock();
        let saved = state
            .catalog
            .iter()
            .find(|product| &product.id == product_id)
            .cloned()
            .unwrap_or_else(|| product(product_id.as_str(), 10));
        // Some deployments echo repeated saves as duplicate entries.
        state.wishlist.push(saved);
        Ok(())
    }

    async fn remove_from_wishlist(
        &self,
        token: &SecretString,
        product_id: &ProductId,
    ) -> Result<()> {
        self.record_call();
        Self::check_token(token)?;
        let mut state = self.state.lock();
        if let Some(error) = state.wishlist_removal_failures.remove(product_id) {
            return Err(error);
        }
        state.wishlist.retain(|product| &product.id != product_id);
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for FakeApi {
    async fn products(&self, query: &ProductQuery) -> Result<Page<Product>> {
        self.record_call();
        let state = self.state.lock();
        let matching: Vec<Product> = state
            .catalog
            .iter()
            .filter(|product| {
                query.title.as_ref().is_none_or(|title| {
                    product.title.to_lowercase().contains(&title.to_lowercase())
                })
            })
            .filter(|product| {
                query.category.as_ref().is_none_or(|category| {
                    product.category.as_ref().map(|c| &c.id) == Some(category)
                })
            })
            .cloned()
            .collect();

        let limit = query.limit.max(1) as usize;
        let pages = matching.len().div_ceil(limit).max(1);
        let page = query.page.max(1) as usize;
        let data: Vec<Product> = matching
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();
        Ok(Page {
            results: u32::try_from(data.len()).unwrap(),
            metadata: PageMetadata {
                current_page: query.page,
                number_of_pages: u32::try_from(pages).unwrap(),
                limit: query.limit,
                next_page: (page < pages).then(|| query.page + 1),
                prev_page: (page > 1).then(|| query.page - 1),
            },
            data,
        })
    }

    async fn product(&self, id: &ProductId) -> Result<Product> {
        self.record_call();
        self.state
            .lock()
            .catalog
            .iter()
            .find(|product| &product.id == id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("No product for this id".into()))
    }

    async fn categories(&self, _page: u32) -> Result<Page<Category>> {
        self.record_call();
        Ok(Page::empty())
    }

    async fn subcategories(&self, _category_id: &CategoryId) -> Result<Vec<Subcategory>> {
        self.record_call();
        Ok(Vec::new())
    }

    async fn brands(&self, _page: u32) -> Result<Page<Brand>> {
        self.record_call();
        Ok(Page::empty())
    }

    async fn brand(&self, id: &BrandId) -> Result<Brand> {
        self.record_call();
        self.state
            .lock()
            .catalog
            .iter()
            .filter_map(|product| product.brand.clone())
            .find(|brand| &brand.id == id)
            .ok_or_else(|| ClientError::NotFound("No brand for this id".into()))
    }
}

#[async_trait]
impl OrderApi for FakeApi {
    async fn checkout_session(
        &self,
        token: &SecretString,
        cart_id: &CartId,
        _request: &OrderRequest,
        return_url: &str,
    ) -> Result<PaymentSession> {
        self.record_call();
        Self::check_token(token)?;
        self.wait_for_gate().await;

        let mut state = self.state.lock();
        if let Some(error) = state.order_failure.take() {
            return Err(error);
        }
        state.last_return_url = Some(return_url.to_string());
        let status = state
            .payment_session_status
            .clone()
            .unwrap_or_else(|| "success".into());
        let url = (status == "success")
            .then(|| format!("https://checkout.stripe.com/c/pay/cs_test_{cart_id}"));
        Ok(PaymentSession {
            status: Some(status),
            url,
        })
    }

    async fn cash_order(
        &self,
        token: &SecretString,
        cart_id: &CartId,
        request: &OrderRequest,
    ) -> Result<CashOrderReceipt> {
        self.record_call();
        Self::check_token(token)?;
        self.wait_for_gate().await;

        let mut state = self.state.lock();
        if let Some(error) = state.order_failure.take() {
            return Err(error);
        }
        if state.cart_id.as_ref() != Some(cart_id) {
            return Err(ClientError::NotFound(format!("No cart for this id: {cart_id}")));
        }

        let cart = Self::cart_of(&state);
        let lines = cart
            .lines
            .iter()
            .map(|line| OrderLine {
                count: line.quantity,
                price: line.unit_price,
                product: ProductRef::Id(line.product.id.clone()),
            })
            .collect();
        let id = format!("order-{}", state.orders.len() + 1);
        let mut placed = order(&id, lines, cart.total(), PaymentMethod::Cash);
        placed.shipping_address = Some(request.shipping_address.clone());
        state.orders.push((placed.clone(), UserId::new(USER_ID)));

        Ok(CashOrderReceipt {
            status: Some("success".into()),
            has_data: true,
            order_id: Some(placed.id.clone()),
            order: Some(placed),
        })
    }

    async fn user_orders(&self, token: &SecretString, user_id: &UserId) -> Result<Vec<Order>> {
        self.record_call();
        Self::check_token(token)?;
        Ok(self
            .state
            .lock()
            .orders
            .iter()
            .filter(|(_, owner)| owner == user_id)
            .map(|(order, _)| order.clone())
            .collect())
    }

    async fn order(&self, token: &SecretString, order_id: &OrderId) -> Result<Order> {
        self.record_call();
        Self::check_token(token)?;
        self.state
            .lock()
            .orders
            .iter()
            .find(|(order, _)| &order.id == order_id)
            .map(|(order, _)| order.clone())
            .ok_or_else(|| ClientError::NotFound("No order for this id".into()))
    }
}

/// Stores wired to one [`FakeApi`] and in-memory storage.
pub struct Harness {
    pub api: Arc<FakeApi>,
    pub local: MemoryStorage,
    pub cookies: MemoryStorage,
    pub vault: TokenVault,
    pub session: Arc<SessionStore>,
    pub cart: Arc<CartStore>,
    pub wishlist: Arc<WishlistStore>,
    pub orders: OrderHistory,
    pub checkout: CheckoutCoordinator,
}

impl Harness {
    pub fn signed_out() -> Self {
        let api = Arc::new(FakeApi::new());
        let local = MemoryStorage::new("local");
        let cookies = MemoryStorage::new("cookies");
        let vault = TokenVault::new(Arc::new(local.clone()), Arc::new(cookies.clone()));
        let handle = SessionHandle::new();

        let cart = Arc::new(CartStore::new(api.clone(), handle.clone(), vault.clone()));
        let wishlist = Arc::new(WishlistStore::new(api.clone(), handle.clone()));
        let session = Arc::new(SessionStore::new(
            api.clone(),
            api.clone(),
            handle.clone(),
            vault.clone(),
            cart.clone(),
            wishlist.clone(),
        ));
        let orders = OrderHistory::new(api.clone(), session.clone());
        let checkout =
            CheckoutCoordinator::new(api.clone(), handle, cart.clone(), "http://localhost:4200");

        Self {
            api,
            local,
            cookies,
            vault,
            session,
            cart,
            wishlist,
            orders,
            checkout,
        }
    }

    pub async fn signed_in() -> Self {
        let harness = Self::signed_out();
        harness
            .session
            .login(&forms::sign_in(EMAIL, PASSWORD).unwrap())
            .await
            .unwrap();
        harness
    }
}
