//! In-process double of the commerce REST API.
//!
//! [`ApiDouble::start`] binds an axum server to an ephemeral localhost port
//! and serves the endpoints the storefront client calls, with the same
//! envelopes and error bodies the real API uses. State lives in memory and
//! is reachable from tests through [`ApiDouble::state`].
//!
//! # Usage
//!
//! ```rust,ignore
//! let api = ApiDouble::start().await;
//! let storefront = Storefront::new(api.config(), local, cookies)?;
//! storefront.session().login(&credentials).await?;
//! assert!(api.requests().contains(&"GET /auth/verifyToken".to_string()));
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use freshcart_storefront::config::ClientConfig;
use parking_lot::{Mutex, MutexGuard};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Mount point of the API on the double.
const API_PREFIX: &str = "/api/v1";

pub const USER_ID: &str = "6407cf6f515bdcf347c09f17";
pub const USER_NAME: &str = "Mona Ali";
pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "Aa1@aaaa";
pub const PHONE: &str = "01012345678";
pub const TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.mona.sig";
pub const RESET_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.mona.reset";
pub const RESET_CODE: &str = "482913";

pub const SHAWL: &str = "6428ebc6dc1175abc65ca0b9";
pub const SCARF: &str = "6428de2adc1175abc65ca05b";
pub const HEADPHONES: &str = "6428e997dc1175abc65ca0a1";
pub const WOMENS_FASHION: &str = "6439d58a0049ad0b52b9003f";
pub const ELECTRONICS: &str = "6439d2d167d9aa4ca970649f";
pub const DEFACTO: &str = "64089bbe24b25627a253158b";
pub const SONY: &str = "64089fe824b25627a25315d1";

// =============================================================================
// State
// =============================================================================

/// A registered account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
}

/// One product line in the server cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartEntry {
    pub product_id: String,
    pub count: u32,
}

/// The server cart. Created on the first add, deleted on clear and after a
/// cash order.
#[derive(Debug, Clone, Default)]
pub struct ServerCart {
    pub id: String,
    pub entries: Vec<CartEntry>,
}

/// A canned response returned instead of routing the next request.
#[derive(Debug, Clone)]
pub struct InjectedResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Everything the double knows.
#[derive(Debug)]
pub struct ApiState {
    pub accounts: Vec<Account>,
    /// The one token `auth/verifyToken` and authenticated routes accept.
    pub valid_token: String,
    pub products: Vec<Value>,
    pub categories: Vec<Value>,
    pub subcategories: Vec<Value>,
    pub brands: Vec<Value>,
    pub cart: Option<ServerCart>,
    pub wishlist: Vec<String>,
    pub orders: Vec<Value>,
    /// JSON field the reset-code endpoint reads the code from.
    pub reset_code_field: String,
    /// Code issued by the last `auth/forgotPasswords` call.
    pub issued_reset_code: Option<String>,
    /// `METHOD /path?query` of every request, API prefix stripped.
    pub requests: Vec<String>,
    pub injected: Option<InjectedResponse>,
    carts_created: u32,
}

impl Default for ApiState {
    fn default() -> Self {
        let womens = category_json(WOMENS_FASHION, "Women's Fashion");
        let electronics = category_json(ELECTRONICS, "Electronics");
        let defacto = brand_json(DEFACTO, "DeFacto");
        let sony = brand_json(SONY, "Sony");

        Self {
            accounts: vec![Account {
                id: USER_ID.to_string(),
                name: USER_NAME.to_string(),
                email: EMAIL.to_string(),
                password: PASSWORD.to_string(),
                phone: PHONE.to_string(),
            }],
            valid_token: TOKEN.to_string(),
            products: vec![
                product_json(SHAWL, "Woman Shawl", 149, None, &womens, &defacto),
                product_json(SCARF, "Printed Scarf", 120, Some(99), &womens, &defacto),
                product_json(HEADPHONES, "Sony WH-1000XM5", 15000, None, &electronics, &sony),
            ],
            subcategories: vec![json!({
                "_id": "6407f1bcb575d3b90bf95797",
                "name": "Women's Clothing",
                "slug": "women's-clothing",
                "category": WOMENS_FASHION,
            })],
            categories: vec![womens, electronics],
            brands: vec![defacto, sony],
            cart: None,
            wishlist: Vec::new(),
            orders: Vec::new(),
            reset_code_field: "resetCode".to_string(),
            issued_reset_code: None,
            requests: Vec::new(),
            injected: None,
            carts_created: 0,
        }
    }
}

impl ApiState {
    fn product(&self, id: &str) -> Option<&Value> {
        self.products.iter().find(|product| product["_id"] == id)
    }

    fn price_of(&self, id: &str) -> u64 {
        self.product(id)
            .and_then(|product| {
                product["priceAfterDiscount"]
                    .as_u64()
                    .or_else(|| product["price"].as_u64())
            })
            .unwrap_or_default()
    }

    fn account_mut(&mut self) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == USER_ID)
    }
}

type Shared = Arc<Mutex<ApiState>>;

// =============================================================================
// Server
// =============================================================================

/// A running API double. The server stops when this is dropped.
pub struct ApiDouble {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl ApiDouble {
    /// Start the double on an ephemeral localhost port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(ApiState::default()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local address");

        let app = router(state.clone());
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// API root, ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}{API_PREFIX}/", self.addr)
    }

    /// Client configuration pointing at this double.
    ///
    /// # Panics
    ///
    /// Never in practice: the base URL is always absolute.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::with_base_url(&self.base_url()).expect("double base URL is valid")
    }

    /// Lock the double's state.
    pub fn state(&self) -> MutexGuard<'_, ApiState> {
        self.state.lock()
    }

    /// Requests seen so far, as `METHOD /path?query`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    /// How many requests started with `prefix`.
    #[must_use]
    pub fn count_requests(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|request| request.starts_with(prefix))
            .count()
    }

    /// Answer the next request with `status` and a raw `body`.
    pub fn inject_next(&self, status: StatusCode, body: &str) {
        self.state.lock().injected = Some(InjectedResponse {
            status,
            body: body.to_string(),
        });
    }

    /// Stop accepting the current token, as if it expired server-side.
    pub fn revoke_tokens(&self) {
        self.state.lock().valid_token = "revoked".to_string();
    }

    /// Product ids in the server cart, with counts.
    #[must_use]
    pub fn cart_entries(&self) -> Vec<CartEntry> {
        self.state
            .lock()
            .cart
            .as_ref()
            .map(|cart| cart.entries.clone())
            .unwrap_or_default()
    }

    /// Product ids on the server wishlist.
    #[must_use]
    pub fn wishlist_ids(&self) -> Vec<String> {
        self.state.lock().wishlist.clone()
    }
}

impl Drop for ApiDouble {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/signin", post(sign_in))
        .route("/auth/signup", post(sign_up))
        .route("/auth/verifyToken", get(verify_token))
        .route("/auth/forgotPasswords", post(forgot_password))
        .route("/auth/verifyResetCode", post(verify_reset_code))
        .route("/auth/resetPassword", put(reset_password).post(reset_password))
        .route("/users/getMe", get(get_me))
        .route("/users/updateMe/", put(update_me))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/categories", get(list_categories))
        .route("/categories/{id}/subcategories", get(list_subcategories))
        .route("/brands", get(list_brands))
        .route("/brands/{id}", get(get_brand))
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/cart/{id}", put(update_cart_item).delete(remove_cart_item))
        .route("/wishlist", get(get_wishlist).post(add_to_wishlist))
        .route("/wishlist/{id}", delete(remove_from_wishlist))
        .route("/orders/checkout-session/{cart_id}", post(checkout_session))
        .route("/orders/user/{user_id}", get(user_orders))
        .route("/orders/{id}", post(cash_order).get(get_order));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

/// Log the request, then either answer with an injected response or route it.
async fn record(State(api): State<Shared>, request: Request, next: Next) -> Response {
    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    let target = target.strip_prefix(API_PREFIX).unwrap_or(&target).to_string();

    let injected = {
        let mut state = api.lock();
        state.requests.push(format!("{} {target}", request.method()));
        state.injected.take()
    };

    match injected {
        Some(InjectedResponse { status, body }) => {
            let content_type = if body.trim_start().starts_with(['{', '[']) {
                "application/json"
            } else {
                "text/html"
            };
            (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        None => next.run(request).await,
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn category_json(id: &str, name: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "slug": slug(name),
        "image": format!("https://ecommerce.routemisr.com/Route-Academy-categories/{id}.png"),
    })
}

fn brand_json(id: &str, name: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "slug": slug(name),
        "image": format!("https://ecommerce.routemisr.com/Route-Academy-brands/{id}.png"),
    })
}

fn product_json(
    id: &str,
    title: &str,
    price: u64,
    discounted: Option<u64>,
    category: &Value,
    brand: &Value,
) -> Value {
    let mut product = json!({
        "_id": id,
        "id": id,
        "title": title,
        "slug": slug(title),
        "description": format!("{title}, from the test catalog"),
        "quantity": 50,
        "price": price,
        "imageCover": format!("https://ecommerce.routemisr.com/Route-Academy-products/{id}-cover.jpeg"),
        "images": [],
        "category": category,
        "subcategory": [],
        "brand": brand,
        "ratingsAverage": 4.6,
        "ratingsQuantity": 18,
        "sold": 120,
        "createdAt": "2023-04-02T02:43:18.400Z",
        "updatedAt": "2023-04-02T02:43:18.400Z",
    });
    if let (Some(discounted), Some(fields)) = (discounted, product.as_object_mut()) {
        fields.insert("priceAfterDiscount".to_string(), json!(discounted));
    }
    product
}

fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

fn account_json(account: &Account) -> Value {
    json!({
        "_id": account.id,
        "name": account.name,
        "email": account.email,
        "phone": account.phone,
        "role": "user",
    })
}

// =============================================================================
// Responses
// =============================================================================

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"statusMsg": "fail", "message": message}))).into_response()
}

/// Validation failures use their own envelope.
fn field_error(param: &str, msg: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "message": "fail",
            "errors": {"value": "", "msg": msg, "param": param, "location": "body"},
        })),
    )
        .into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn authorize(state: &ApiState, headers: &HeaderMap) -> Result<(), Response> {
    match header_str(headers, "token") {
        Some(token) if token == state.valid_token => Ok(()),
        Some(_) => Err(fail(
            StatusCode::UNAUTHORIZED,
            "Invalid Token. please login again",
        )),
        None => Err(fail(
            StatusCode::UNAUTHORIZED,
            "You are not logged in. Please login to get access",
        )),
    }
}

fn str_field<'a>(body: &'a Value, field: &str) -> &'a str {
    body[field].as_str().unwrap_or_default()
}

fn page_of(items: &[Value], query: &HashMap<String, String>, default_limit: usize) -> Value {
    let limit = query
        .get("limit")
        .and_then(|limit| limit.parse::<usize>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(default_limit);
    let page = query
        .get("page")
        .and_then(|page| page.parse::<usize>().ok())
        .filter(|page| *page > 0)
        .unwrap_or(1);
    let pages = items.len().div_ceil(limit).max(1);
    let data: Vec<Value> = items.iter().skip((page - 1) * limit).take(limit).cloned().collect();

    let mut metadata = json!({
        "currentPage": page,
        "numberOfPages": pages,
        "limit": limit,
    });
    if let Some(fields) = metadata.as_object_mut() {
        if page < pages {
            fields.insert("nextPage".to_string(), json!(page + 1));
        }
        if page > 1 {
            fields.insert("prevPage".to_string(), json!(page - 1));
        }
    }

    json!({"results": data.len(), "metadata": metadata, "data": data})
}

/// Cart envelope. Reads answer with populated products, mutations with ids.
fn cart_body(state: &ApiState, populated: bool, message: Option<&str>) -> Value {
    let Some(cart) = &state.cart else {
        return json!({"status": "success", "numOfCartItems": 0, "data": null});
    };

    let products: Vec<Value> = cart
        .entries
        .iter()
        .map(|entry| {
            let product = if populated {
                state.product(&entry.product_id).map_or_else(
                    || json!(entry.product_id),
                    |product| {
                        json!({
                            "_id": product["_id"],
                            "id": product["_id"],
                            "title": product["title"],
                            "imageCover": product["imageCover"],
                            "category": product["category"],
                            "brand": product["brand"],
                            "ratingsAverage": product["ratingsAverage"],
                            "quantity": product["quantity"],
                        })
                    },
                )
            } else {
                json!(entry.product_id)
            };
            json!({
                "count": entry.count,
                "_id": format!("line-{}", entry.product_id),
                "product": product,
                "price": state.price_of(&entry.product_id),
            })
        })
        .collect();
    let total: u64 = cart
        .entries
        .iter()
        .map(|entry| state.price_of(&entry.product_id) * u64::from(entry.count))
        .sum();

    let mut body = json!({
        "status": "success",
        "numOfCartItems": cart.entries.len(),
        "cartId": cart.id,
        "data": {
            "_id": cart.id,
            "cartOwner": USER_ID,
            "products": products,
            "totalCartPrice": total,
        },
    });
    if let (Some(message), Some(fields)) = (message, body.as_object_mut()) {
        fields.insert("message".to_string(), json!(message));
    }
    body
}

// =============================================================================
// Auth
// =============================================================================

async fn sign_in(State(api): State<Shared>, Json(body): Json<Value>) -> Response {
    let state = api.lock();
    let email = str_field(&body, "email");
    let password = str_field(&body, "password");

    match state
        .accounts
        .iter()
        .find(|account| account.email == email && account.password == password)
    {
        Some(account) => Json(json!({
            "message": "success",
            "user": {"name": account.name, "email": account.email, "role": "user"},
            "token": state.valid_token,
        }))
        .into_response(),
        None => fail(StatusCode::UNAUTHORIZED, "Incorrect email or password"),
    }
}

async fn sign_up(State(api): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = api.lock();
    let email = str_field(&body, "email").to_string();

    if str_field(&body, "password") != str_field(&body, "rePassword") {
        return field_error("rePassword", "Password confirmation is incorrect");
    }
    if state.accounts.iter().any(|account| account.email == email) {
        return fail(StatusCode::CONFLICT, "Account Already Exists");
    }

    let account = Account {
        id: format!("user-{}", state.accounts.len() + 1),
        name: str_field(&body, "name").to_string(),
        email,
        password: str_field(&body, "password").to_string(),
        phone: str_field(&body, "phone").to_string(),
    };
    let response = json!({
        "message": "success",
        "user": {"name": account.name, "email": account.email, "role": "user"},
        "token": format!("{}.signup", account.id),
    });
    state.accounts.push(account);
    (StatusCode::CREATED, Json(response)).into_response()
}

async fn verify_token(State(api): State<Shared>, headers: HeaderMap) -> Response {
    let state = api.lock();
    let bearer = header_str(&headers, "authorization")
        .and_then(|value| value.strip_prefix("Bearer "));
    let presented = header_str(&headers, "token").or(bearer);

    match presented {
        Some(token) if token == state.valid_token => Json(json!({
            "message": "verified",
            "decoded": {
                "id": USER_ID,
                "name": USER_NAME,
                "role": "user",
                "iat": 1_700_000_000,
                "exp": 1_707_776_000,
            },
        }))
        .into_response(),
        _ => fail(
            StatusCode::UNAUTHORIZED,
            "Invalid Token. please login again",
        ),
    }
}

async fn forgot_password(State(api): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = api.lock();
    let email = str_field(&body, "email");
    if !state.accounts.iter().any(|account| account.email == email) {
        return fail(
            StatusCode::NOT_FOUND,
            &format!("There is no user registered with this email address {email}"),
        );
    }
    state.issued_reset_code = Some(RESET_CODE.to_string());
    Json(json!({"statusMsg": "success", "message": "Reset code sent to your email"}))
        .into_response()
}

async fn verify_reset_code(State(api): State<Shared>, Json(body): Json<Value>) -> Response {
    let state = api.lock();
    let code = str_field(&body, &state.reset_code_field);
    if code.is_empty() {
        return field_error(&state.reset_code_field, "Reset code is required");
    }
    if state.issued_reset_code.as_deref() == Some(code) {
        Json(json!({"status": "Success"})).into_response()
    } else {
        fail(
            StatusCode::BAD_REQUEST,
            "Reset code is invalid or has expired",
        )
    }
}

async fn reset_password(State(api): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = api.lock();
    let email = str_field(&body, "email").to_string();
    let new_password = str_field(&body, "newPassword").to_string();
    if state.issued_reset_code.is_none() {
        return fail(StatusCode::BAD_REQUEST, "reset code not verified");
    }

    let Some(account) = state
        .accounts
        .iter_mut()
        .find(|account| account.email == email)
    else {
        return fail(
            StatusCode::NOT_FOUND,
            &format!("There is no user with email {email}"),
        );
    };
    account.password = new_password;
    state.issued_reset_code = None;
    Json(json!({"token": RESET_TOKEN})).into_response()
}

// =============================================================================
// Account
// =============================================================================

async fn get_me(State(api): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    match state.account_mut() {
        Some(account) => Json(json!({"data": account_json(account)})).into_response(),
        None => fail(StatusCode::NOT_FOUND, "User not found"),
    }
}

async fn update_me(
    State(api): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let email = str_field(&body, "email").to_string();
    if state
        .accounts
        .iter()
        .any(|account| account.email == email && account.id != USER_ID)
    {
        return field_error("email", "E-mail already in use");
    }

    let Some(account) = state.account_mut() else {
        return fail(StatusCode::NOT_FOUND, "User not found");
    };
    account.name = str_field(&body, "name").to_string();
    account.email = email;
    account.phone = str_field(&body, "phone").to_string();
    Json(json!({
        "message": "success",
        "user": {"name": account.name, "email": account.email, "role": "user"},
    }))
    .into_response()
}

// =============================================================================
// Catalog
// =============================================================================

async fn list_products(
    State(api): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = api.lock();
    let title = query.get("title[regex]").map(|title| title.to_lowercase());
    let category = query.get("category");

    let matching: Vec<Value> = state
        .products
        .iter()
        .filter(|product| {
            title.as_ref().is_none_or(|title| {
                product["title"]
                    .as_str()
                    .is_some_and(|t| t.to_lowercase().contains(title))
            })
        })
        .filter(|product| {
            category.is_none_or(|category| product["category"]["_id"] == category.as_str())
        })
        .cloned()
        .collect();

    Json(page_of(&matching, &query, 40)).into_response()
}

async fn get_product(State(api): State<Shared>, Path(id): Path<String>) -> Response {
    let state = api.lock();
    match state.product(&id) {
        Some(product) => Json(json!({"data": product})).into_response(),
        None => fail(
            StatusCode::NOT_FOUND,
            &format!("No product for this id {id}"),
        ),
    }
}

async fn list_categories(
    State(api): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = api.lock();
    Json(page_of(&state.categories, &query, 40)).into_response()
}

async fn list_subcategories(State(api): State<Shared>, Path(id): Path<String>) -> Response {
    let state = api.lock();
    let data: Vec<&Value> = state
        .subcategories
        .iter()
        .filter(|subcategory| subcategory["category"] == id.as_str())
        .collect();
    Json(json!({"results": data.len(), "data": data})).into_response()
}

async fn list_brands(
    State(api): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = api.lock();
    Json(page_of(&state.brands, &query, 40)).into_response()
}

async fn get_brand(State(api): State<Shared>, Path(id): Path<String>) -> Response {
    let state = api.lock();
    match state.brands.iter().find(|brand| brand["_id"] == id.as_str()) {
        Some(brand) => Json(json!({"data": brand})).into_response(),
        None => fail(StatusCode::NOT_FOUND, &format!("No brand for this id {id}")),
    }
}

// =============================================================================
// Cart
// =============================================================================

async fn get_cart(State(api): State<Shared>, headers: HeaderMap) -> Response {
    let state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    if state.cart.is_none() {
        return fail(
            StatusCode::NOT_FOUND,
            &format!("No cart exist for this user: {USER_ID}"),
        );
    }
    Json(cart_body(&state, true, None)).into_response()
}

async fn add_to_cart(
    State(api): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let product_id = str_field(&body, "productId").to_string();
    if state.product(&product_id).is_none() {
        return fail(StatusCode::BAD_REQUEST, "product not found");
    }
    let count = body["count"]
        .as_u64()
        .and_then(|count| u32::try_from(count).ok())
        .unwrap_or(1);

    if state.cart.is_none() {
        state.carts_created += 1;
        state.cart = Some(ServerCart {
            id: format!("cart-{}", state.carts_created),
            entries: Vec::new(),
        });
    }
    if let Some(cart) = state.cart.as_mut() {
        match cart
            .entries
            .iter_mut()
            .find(|entry| entry.product_id == product_id)
        {
            Some(entry) => entry.count += count,
            None => cart.entries.push(CartEntry { product_id, count }),
        }
    }
    Json(cart_body(
        &state,
        false,
        Some("Product added successfully to your cart"),
    ))
    .into_response()
}

async fn update_cart_item(
    State(api): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let count = body["count"]
        .as_u64()
        .and_then(|count| u32::try_from(count).ok())
        .unwrap_or_default();

    let Some(entry) = state
        .cart
        .as_mut()
        .and_then(|cart| cart.entries.iter_mut().find(|entry| entry.product_id == id))
    else {
        return fail(
            StatusCode::NOT_FOUND,
            &format!("No product in cart with id {id}"),
        );
    };
    entry.count = count;
    Json(cart_body(&state, true, None)).into_response()
}

async fn remove_cart_item(
    State(api): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let Some(cart) = state.cart.as_mut() else {
        return fail(
            StatusCode::NOT_FOUND,
            &format!("No cart exist for this user: {USER_ID}"),
        );
    };
    cart.entries.retain(|entry| entry.product_id != id);
    Json(cart_body(&state, true, None)).into_response()
}

async fn clear_cart(State(api): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    state.cart = None;
    Json(json!({"message": "success"})).into_response()
}

// =============================================================================
// Wishlist
// =============================================================================

async fn get_wishlist(State(api): State<Shared>, headers: HeaderMap) -> Response {
    let state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let data: Vec<&Value> = state
        .wishlist
        .iter()
        .filter_map(|id| state.product(id))
        .collect();
    Json(json!({"status": "success", "count": data.len(), "data": data})).into_response()
}

async fn add_to_wishlist(
    State(api): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let product_id = str_field(&body, "productId").to_string();
    if state.product(&product_id).is_none() {
        return fail(
            StatusCode::NOT_FOUND,
            &format!("No product for this id {product_id}"),
        );
    }
    if !state.wishlist.contains(&product_id) {
        state.wishlist.push(product_id);
    }
    Json(json!({
        "status": "success",
        "message": "Product added successfully to your wishlist",
        "data": state.wishlist,
    }))
    .into_response()
}

async fn remove_from_wishlist(
    State(api): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    state.wishlist.retain(|product_id| *product_id != id);
    Json(json!({
        "status": "success",
        "message": "Product removed successfully to your wishlist",
        "data": state.wishlist,
    }))
    .into_response()
}

// =============================================================================
// Orders
// =============================================================================

fn known_cart(state: &ApiState, cart_id: &str) -> bool {
    state.cart.as_ref().is_some_and(|cart| cart.id == cart_id)
}

async fn checkout_session(
    State(api): State<Shared>,
    headers: HeaderMap,
    Path(cart_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    if !known_cart(&state, &cart_id) {
        return fail(
            StatusCode::NOT_FOUND,
            &format!("There is no such cart with id {cart_id}"),
        );
    }
    let return_url = query.get("url").cloned().unwrap_or_default();
    Json(json!({
        "status": "success",
        "session": {
            "url": format!("https://checkout.stripe.com/c/pay/cs_test_{cart_id}"),
            "success_url": format!("{return_url}/allorders"),
            "cancel_url": format!("{return_url}/cart"),
        },
    }))
    .into_response()
}

async fn cash_order(
    State(api): State<Shared>,
    headers: HeaderMap,
    Path(cart_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    if !known_cart(&state, &cart_id) {
        return fail(
            StatusCode::NOT_FOUND,
            &format!("There is no such cart with id {cart_id}"),
        );
    }

    let entries = state
        .cart
        .take()
        .map(|cart| cart.entries)
        .unwrap_or_default();
    let items: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!({
                "count": entry.count,
                "_id": format!("line-{}", entry.product_id),
                "product": entry.product_id,
                "price": state.price_of(&entry.product_id),
            })
        })
        .collect();
    let total: u64 = entries
        .iter()
        .map(|entry| state.price_of(&entry.product_id) * u64::from(entry.count))
        .sum();

    let id = format!("order-{}", state.orders.len() + 1);
    let order = json!({
        "_id": id,
        "id": id,
        "user": USER_ID,
        "cartItems": items,
        "shippingAddress": body["shippingAddress"],
        "taxPrice": 0,
        "shippingPrice": 0,
        "totalOrderPrice": total,
        "paymentMethodType": "cash",
        "isPaid": false,
        "isDelivered": false,
        "createdAt": "2026-10-18T09:30:00.000Z",
        "updatedAt": "2026-10-18T09:30:00.000Z",
    });
    state.orders.push(order.clone());
    (
        StatusCode::CREATED,
        Json(json!({"status": "success", "data": order})),
    )
        .into_response()
}

async fn user_orders(
    State(api): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    let state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let orders: Vec<&Value> = state
        .orders
        .iter()
        .filter(|order| order["user"] == user_id.as_str())
        .collect();
    Json(json!(orders)).into_response()
}

async fn get_order(
    State(api): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let state = api.lock();
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    match state.orders.iter().find(|order| order["_id"] == id.as_str()) {
        Some(order) => Json(json!({"data": order})).into_response(),
        None => fail(StatusCode::NOT_FOUND, &format!("No order for this id {id}")),
    }
}
