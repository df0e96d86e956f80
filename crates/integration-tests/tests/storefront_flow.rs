//! End-to-end storefront flows over HTTP.
//!
//! Each test starts an API double, builds a `Storefront` pointed at it and
//! drives the stores the way the CLI does: sign in, shop, check out, sign
//! out, restart.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;

use freshcart_core::{PaymentMethod, ProductId};
use freshcart_integration_tests::{
    ApiDouble, CartEntry, EMAIL, HEADPHONES, PASSWORD, PHONE, RESET_CODE, SCARF, SHAWL, TOKEN,
    USER_ID, USER_NAME,
};
use freshcart_storefront::Storefront;
use freshcart_storefront::error::{ClientError, ErrorKind};
use freshcart_storefront::forms::{self, AddressForm};
use freshcart_storefront::services::{CheckoutOutcome, CheckoutState};
use freshcart_storefront::storage::{
    CART_ID_KEY, COOKIE_TOKEN_KEYS, FileStorage, LOCAL_TOKEN_KEYS, MemoryStorage,
    StorageLocation,
};
use freshcart_storefront::stores::Toggled;

struct Shop {
    storefront: Storefront,
    local: Arc<MemoryStorage>,
    cookies: Arc<MemoryStorage>,
}

fn shop(double: &ApiDouble) -> Shop {
    let local = Arc::new(MemoryStorage::new("local"));
    let cookies = Arc::new(MemoryStorage::new("cookies"));
    let storefront = Storefront::new(double.config(), local.clone(), cookies.clone()).unwrap();
    Shop {
        storefront,
        local,
        cookies,
    }
}

async fn signed_in(double: &ApiDouble) -> Shop {
    let shop = shop(double);
    let credentials = forms::sign_in(EMAIL, PASSWORD).unwrap();
    shop.storefront.session().login(&credentials).await.unwrap();
    shop
}

fn file_storefront(double: &ApiDouble, dir: &Path) -> Storefront {
    let local = FileStorage::open("local", dir.join("local.json")).unwrap();
    let cookies = FileStorage::open("cookies", dir.join("cookies.json")).unwrap();
    Storefront::new(double.config(), Arc::new(local), Arc::new(cookies)).unwrap()
}

fn address() -> AddressForm {
    AddressForm {
        details: "12 Tahrir Street, Apartment 4".to_string(),
        phone: PHONE.to_string(),
        city: "Cairo".to_string(),
    }
}

// =============================================================================
// Session
// =============================================================================

#[tokio::test]
async fn test_login_persists_token_and_loads_stores() {
    let double = ApiDouble::start().await;
    {
        let mut state = double.state();
        state.wishlist.push(HEADPHONES.to_string());
    }
    let shop = signed_in(&double).await;
    shop.storefront
        .cart()
        .add_item(&ProductId::new(SHAWL), 1)
        .await
        .unwrap();

    let session = shop.storefront.session();
    assert!(session.is_authenticated());
    let identity = session.identity().unwrap();
    assert_eq!(identity.id.as_str(), USER_ID);
    assert_eq!(identity.name, USER_NAME);

    for key in LOCAL_TOKEN_KEYS {
        assert_eq!(shop.local.get(key).unwrap().as_deref(), Some(TOKEN));
    }
    for key in COOKIE_TOKEN_KEYS {
        assert_eq!(shop.cookies.get(key).unwrap().as_deref(), Some(TOKEN));
    }

    assert!(shop.storefront.wishlist().is_present(&ProductId::new(HEADPHONES)));
    assert!(shop.storefront.cart().is_in_cart(&ProductId::new(SHAWL)));
    assert_eq!(double.count_requests("GET /auth/verifyToken"), 1);
    assert_eq!(double.count_requests("GET /wishlist"), 1);
}

#[tokio::test]
async fn test_login_with_wrong_password_leaves_session_empty() {
    let double = ApiDouble::start().await;
    let shop = shop(&double);

    let credentials = forms::sign_in(EMAIL, "Aa1@bbbb").unwrap();
    let err = shop
        .storefront
        .session()
        .login(&credentials)
        .await
        .unwrap_err();

    assert!(err.is_auth());
    assert!(!shop.storefront.session().is_authenticated());
    assert!(shop.local.is_empty());
    assert!(shop.cookies.is_empty());
    assert_eq!(double.count_requests("GET /auth/verifyToken"), 0);
}

#[tokio::test]
async fn test_logout_wipes_everything_without_network() {
    let double = ApiDouble::start().await;
    let shop = signed_in(&double).await;
    shop.storefront
        .cart()
        .add_item(&ProductId::new(SHAWL), 1)
        .await
        .unwrap();
    let requests_before = double.requests().len();

    shop.storefront.session().logout();

    assert!(!shop.storefront.session().is_authenticated());
    assert!(shop.storefront.session().identity().is_none());
    assert_eq!(shop.storefront.cart().count(), 0);
    assert_eq!(shop.storefront.wishlist().count(), 0);
    assert!(shop.local.is_empty());
    assert!(shop.cookies.is_empty());
    assert_eq!(double.requests().len(), requests_before);
}

#[tokio::test]
async fn test_restart_resumes_persisted_session() {
    let double = ApiDouble::start().await;
    let dir = tempfile::tempdir().unwrap();

    {
        let storefront = file_storefront(&double, dir.path());
        let credentials = forms::sign_in(EMAIL, PASSWORD).unwrap();
        storefront.session().login(&credentials).await.unwrap();
        storefront
            .cart()
            .add_item(&ProductId::new(SCARF), 2)
            .await
            .unwrap();
        storefront.shutdown();
    }

    let storefront = file_storefront(&double, dir.path());
    assert!(storefront.start().await.unwrap());
    assert!(storefront.session().is_authenticated());
    assert_eq!(
        storefront
            .cart()
            .items()
            .line(&ProductId::new(SCARF))
            .unwrap()
            .quantity,
        2
    );
}

#[tokio::test]
async fn test_restart_with_revoked_token_wipes_it() {
    let double = ApiDouble::start().await;
    let dir = tempfile::tempdir().unwrap();

    {
        let storefront = file_storefront(&double, dir.path());
        let credentials = forms::sign_in(EMAIL, PASSWORD).unwrap();
        storefront.session().login(&credentials).await.unwrap();
    }
    double.revoke_tokens();

    let storefront = file_storefront(&double, dir.path());
    assert!(!storefront.start().await.unwrap());
    assert!(!storefront.session().is_authenticated());

    // A third start finds nothing to resume and makes no request.
    let verifications = double.count_requests("GET /auth/verifyToken");
    let storefront = file_storefront(&double, dir.path());
    assert!(!storefront.start().await.unwrap());
    assert_eq!(double.count_requests("GET /auth/verifyToken"), verifications);
}

#[tokio::test]
async fn test_profile_read_and_update() {
    let double = ApiDouble::start().await;
    let shop = signed_in(&double).await;
    let session = shop.storefront.session();

    let profile = session.current_user().await.unwrap();
    assert_eq!(profile.email, EMAIL);
    assert_eq!(profile.phone.as_deref(), Some(PHONE));

    session
        .update_profile("Mona Hassan", "mona@example.com", "01123456789")
        .await
        .unwrap();
    let profile = session.current_user().await.unwrap();
    assert_eq!(profile.name, "Mona Hassan");
    assert_eq!(profile.email, "mona@example.com");
}

#[tokio::test]
async fn test_password_recovery_flow() {
    let double = ApiDouble::start().await;
    let shop = shop(&double);
    let recovery = shop.storefront.recovery();

    recovery.forgot_password(EMAIL).await.unwrap();
    recovery.verify_reset_code(EMAIL, RESET_CODE).await.unwrap();
    let token = recovery
        .reset_password(EMAIL, RESET_CODE, "n3wpass")
        .await
        .unwrap();

    assert!(token.is_some());
    // The issued token is not persisted; the user signs in again.
    assert!(shop.local.is_empty());
    assert!(!shop.storefront.session().is_authenticated());
    let account = double.state().accounts.first().unwrap().clone();
    assert_eq!(account.password, "n3wpass");
}

// =============================================================================
// Cart and wishlist
// =============================================================================

#[tokio::test]
async fn test_cart_mutations_track_server_state() {
    let double = ApiDouble::start().await;
    let shop = signed_in(&double).await;
    let cart = shop.storefront.cart();
    let shawl = ProductId::new(SHAWL);

    cart.add_item(&shawl, 2).await.unwrap();
    assert_eq!(cart.items().line(&shawl).unwrap().quantity, 2);
    assert_eq!(shop.cookies.get(CART_ID_KEY).unwrap().as_deref(), Some("cart-1"));

    cart.update_quantity(&shawl, 3).await.unwrap();
    assert_eq!(
        double.cart_entries(),
        vec![CartEntry {
            product_id: SHAWL.to_string(),
            count: 3
        }]
    );

    let requests = double.requests().len();
    cart.update_quantity(&shawl, 0).await.unwrap();
    assert_eq!(double.requests().len(), requests);
    assert_eq!(cart.items().line(&shawl).unwrap().quantity, 3);

    cart.remove_item(&shawl).await.unwrap();
    assert!(!cart.is_in_cart(&shawl));
    assert_eq!(cart.count(), 0);
}

#[tokio::test]
async fn test_failed_add_still_refreshes_cart() {
    let double = ApiDouble::start().await;
    let shop = signed_in(&double).await;
    let cart = shop.storefront.cart();
    cart.add_item(&ProductId::new(SHAWL), 1).await.unwrap();

    let err = cart
        .add_item(&ProductId::new("missing"), 1)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Rejected);
    assert_eq!(err.user_message(), "product not found");
    assert_eq!(cart.count(), 1);
    assert_eq!(double.count_requests("GET /cart"), 3);
}

#[tokio::test]
async fn test_cart_requires_session() {
    let double = ApiDouble::start().await;
    let shop = shop(&double);

    let err = shop
        .storefront
        .cart()
        .add_item(&ProductId::new(SHAWL), 1)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::NotAuthenticated));
    assert!(double.requests().is_empty());
}

#[tokio::test]
async fn test_wishlist_toggle_and_clear() {
    let double = ApiDouble::start().await;
    let shop = signed_in(&double).await;
    let catalog = shop.storefront.catalog();
    let wishlist = shop.storefront.wishlist();

    let shawl = catalog.product(&ProductId::new(SHAWL)).await.unwrap();
    let headphones = catalog.product(&ProductId::new(HEADPHONES)).await.unwrap();

    assert_eq!(wishlist.toggle(&shawl).await.unwrap(), Toggled::Added);
    assert_eq!(wishlist.toggle(&headphones).await.unwrap(), Toggled::Added);
    assert_eq!(wishlist.toggle(&shawl).await.unwrap(), Toggled::Removed);
    assert_eq!(double.wishlist_ids(), vec![HEADPHONES.to_string()]);
    assert_eq!(wishlist.count(), 1);

    wishlist.add(&shawl).await.unwrap();
    wishlist.clear().await.unwrap();
    assert_eq!(wishlist.count(), 0);
    assert!(double.wishlist_ids().is_empty());
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_pages_are_cached() {
    let double = ApiDouble::start().await;
    let shop = shop(&double);
    let catalog = shop.storefront.catalog();

    let first = catalog.products(1).await.unwrap();
    let again = catalog.products(1).await.unwrap();
    assert_eq!(first, again);
    assert_eq!(double.count_requests("GET /products?"), 1);

    let blank = catalog.search("   ").await.unwrap();
    assert!(blank.data.is_empty());
    assert_eq!(double.count_requests("GET /products?"), 1);

    let found = catalog.search("sony").await.unwrap();
    assert_eq!(found.data.len(), 1);

    shop.storefront.shutdown();
    catalog.products(1).await.unwrap();
    assert_eq!(double.count_requests("GET /products?"), 3);
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_card_checkout_redirects_and_keeps_cart() {
    let double = ApiDouble::start().await;
    let shop = signed_in(&double).await;
    shop.storefront
        .cart()
        .add_item(&ProductId::new(SHAWL), 1)
        .await
        .unwrap();

    let outcome = shop
        .storefront
        .checkout()
        .submit(&address(), PaymentMethod::Card)
        .await
        .unwrap();

    let url = "https://checkout.stripe.com/c/pay/cs_test_cart-1".to_string();
    assert_eq!(outcome, CheckoutOutcome::Redirect { url: url.clone() });
    assert_eq!(
        shop.storefront.checkout().state(),
        CheckoutState::Redirecting(url)
    );
    assert_eq!(shop.storefront.cart().count(), 1);
    assert_eq!(
        double.count_requests(
            "POST /orders/checkout-session/cart-1?url=http%3A%2F%2Flocalhost%3A4200"
        ),
        1
    );
}

#[tokio::test]
async fn test_cash_checkout_places_order_and_empties_cart() {
    let double = ApiDouble::start().await;
    let shop = signed_in(&double).await;
    shop.storefront
        .cart()
        .add_item(&ProductId::new(SCARF), 2)
        .await
        .unwrap();

    let outcome = shop
        .storefront
        .checkout()
        .submit(&address(), PaymentMethod::Cash)
        .await
        .unwrap();

    let order = match outcome {
        CheckoutOutcome::OrderPlaced { order: Some(order) } => order,
        other => panic!("expected a placed order, got {other:?}"),
    };
    assert!(matches!(
        shop.storefront.checkout().state(),
        CheckoutState::Success(Some(_))
    ));
    assert_eq!(shop.storefront.cart().count(), 0);
    assert!(shop.cookies.get(CART_ID_KEY).unwrap().is_none());

    let orders = shop.storefront.orders().orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders.first().unwrap().id, order.id);
    assert_eq!(double.count_requests(&format!("GET /orders/user/{USER_ID}")), 1);
}

#[tokio::test]
async fn test_checkout_without_cart_fails() {
    let double = ApiDouble::start().await;
    let shop = signed_in(&double).await;

    let err = shop
        .storefront
        .checkout()
        .submit(&address(), PaymentMethod::Cash)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        shop.storefront.checkout().state(),
        CheckoutState::Failed("Cart not found".to_string())
    );
    assert_eq!(double.count_requests("POST /orders"), 0);

    assert_eq!(
        shop.storefront.checkout().take_failure().as_deref(),
        Some("Cart not found")
    );
    assert_eq!(shop.storefront.checkout().state(), CheckoutState::Idle);
}

#[tokio::test]
async fn test_invalid_address_never_reaches_server() {
    let double = ApiDouble::start().await;
    let shop = signed_in(&double).await;
    shop.storefront
        .cart()
        .add_item(&ProductId::new(SHAWL), 1)
        .await
        .unwrap();

    let form = AddressForm {
        details: "short".to_string(),
        ..address()
    };
    let err = shop
        .storefront
        .checkout()
        .submit(&form, PaymentMethod::Card)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(shop.storefront.checkout().state(), CheckoutState::Idle);
    assert_eq!(double.count_requests("POST /orders"), 0);
}
