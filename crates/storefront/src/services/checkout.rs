//! Checkout coordinator.
//!
//! Validates the shipping address, places the order with the chosen payment
//! method and publishes a [`CheckoutState`]. One submission runs at a time.
//!
//! ```text
//! Idle -> Submitting -> Redirecting(url)   card: hand the shopper to the gateway
//!                    -> Success(order)     cash: cart cleared, show order history
//!                    -> Failed(message)    back to Idle once the message is taken
//! ```

use std::sync::Arc;

use freshcart_core::{CartId, PaymentMethod};
use secrecy::SecretString;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::api::OrderApi;
use crate::api::types::{Order, OrderRequest};
use crate::error::{ClientError, Result, add_breadcrumb};
use crate::forms::{self, AddressForm};
use crate::stores::{CartStore, SessionHandle};

const CART_NOT_FOUND: &str = "Cart not found";
const PAYMENT_SESSION_FAILED: &str = "Payment session failed";
const CARD_PAYMENT_FAILED: &str = "Payment failed. Please try again.";
const CASH_ORDER_FAILED: &str = "Failed to create order. Please try again.";
const CASH_ORDER_UNEXPECTED: &str = "Failed to create order - unexpected response";

/// Where the checkout flow stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    Submitting,
    /// Card payment: the external gateway URL to open.
    Redirecting(String),
    /// Cash order placed. Carries the order when the server returned one.
    Success(Option<Order>),
    /// User-visible failure message.
    ///
    /// Published until [`CheckoutCoordinator::take_failure`] hands the
    /// message out, [`CheckoutCoordinator::reset`] runs, or the next
    /// submission claims the coordinator. Each of these leaves `Idle` (or
    /// `Submitting`) behind. Nothing retries on its own.
    Failed(String),
}

impl CheckoutState {
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }
}

/// What the caller should do after a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// Open the payment gateway.
    Redirect { url: String },
    /// Navigate to order history.
    OrderPlaced { order: Option<Order> },
}

/// Drives order placement for the current cart.
pub struct CheckoutCoordinator {
    api: Arc<dyn OrderApi>,
    session: SessionHandle,
    cart: Arc<CartStore>,
    return_url: String,
    state_tx: watch::Sender<CheckoutState>,
}

impl CheckoutCoordinator {
    /// `return_url` is the origin the payment gateway sends the shopper
    /// back to.
    pub fn new(
        api: Arc<dyn OrderApi>,
        session: SessionHandle,
        cart: Arc<CartStore>,
        return_url: impl Into<String>,
    ) -> Self {
        let (state_tx, _rx) = watch::channel(CheckoutState::Idle);
        Self {
            api,
            session,
            cart,
            return_url: return_url.into(),
            state_tx,
        }
    }

    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.state_tx.subscribe()
    }

    /// Return to `Idle` unless a submission is in flight.
    pub fn reset(&self) {
        self.state_tx.send_if_modified(|state| {
            if state.is_submitting() || *state == CheckoutState::Idle {
                return false;
            }
            *state = CheckoutState::Idle;
            true
        });
    }

    /// Take the message of a `Failed` submission and return to `Idle`.
    ///
    /// Returns `None`, leaving the state untouched, in any other state.
    pub fn take_failure(&self) -> Option<String> {
        let mut message = None;
        self.state_tx.send_if_modified(|state| {
            let CheckoutState::Failed(failed) = state else {
                return false;
            };
            message = Some(std::mem::take(failed));
            *state = CheckoutState::Idle;
            true
        });
        message
    }

    /// Place an order for the current cart.
    ///
    /// Validation and the session check run before any state change.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Validation`] for a bad address; nothing is sent.
    /// - [`ClientError::NotAuthenticated`] when signed out.
    /// - [`ClientError::Busy`] while another submission is in flight.
    /// - [`ClientError::NotFound`] when no cart id is known.
    /// - The API error, or [`ClientError::Rejected`] when the server did
    ///   not confirm; the state moves to `Failed`.
    #[instrument(skip(self, form), fields(payment = %method))]
    pub async fn submit(&self, form: &AddressForm, method: PaymentMethod) -> Result<CheckoutOutcome> {
        let address = forms::shipping_address(form)?;
        let token = self.session.require_token()?;

        if !self.claim() {
            warn!("Checkout already in progress");
            return Err(ClientError::Busy);
        }
        add_breadcrumb("checkout", "Submitted order", Some(&[("payment", method.as_str())]));

        let Some(cart_id) = self.cart.cart_id() else {
            return Err(self.fail(
                ClientError::NotFound(CART_NOT_FOUND.to_string()),
                CART_NOT_FOUND.to_string(),
            ));
        };

        let request = OrderRequest {
            shipping_address: address,
        };
        match method {
            PaymentMethod::Card => self.pay_by_card(&token, &cart_id, &request).await,
            PaymentMethod::Cash => self.pay_cash(&token, &cart_id, &request).await,
        }
    }

    async fn pay_by_card(
        &self,
        token: &SecretString,
        cart_id: &CartId,
        request: &OrderRequest,
    ) -> Result<CheckoutOutcome> {
        let session = match self
            .api
            .checkout_session(token, cart_id, request, &self.return_url)
            .await
        {
            Ok(session) => session,
            Err(e) => return Err(self.fail(e, CARD_PAYMENT_FAILED.to_string())),
        };

        let Some(url) = session.redirect_url().map(str::to_string) else {
            return Err(self.fail(
                ClientError::Rejected {
                    status: 200,
                    message: PAYMENT_SESSION_FAILED.to_string(),
                },
                PAYMENT_SESSION_FAILED.to_string(),
            ));
        };

        info!(cart_id = %cart_id, "Redirecting to payment gateway");
        add_breadcrumb("checkout", "Payment session opened", None);
        self.state_tx
            .send_replace(CheckoutState::Redirecting(url.clone()));
        Ok(CheckoutOutcome::Redirect { url })
    }

    async fn pay_cash(
        &self,
        token: &SecretString,
        cart_id: &CartId,
        request: &OrderRequest,
    ) -> Result<CheckoutOutcome> {
        let receipt = match self.api.cash_order(token, cart_id, request).await {
            Ok(receipt) => receipt,
            Err(e) => {
                let message = cash_failure_message(&e);
                return Err(self.fail(e, message));
            }
        };

        if !receipt.is_confirmed() {
            return Err(self.fail(
                ClientError::UnknownShape(CASH_ORDER_UNEXPECTED.to_string()),
                CASH_ORDER_UNEXPECTED.to_string(),
            ));
        }

        if let Err(e) = self.cart.clear().await {
            warn!(error = %e, "Failed to clear cart after cash order");
        }

        info!(order_id = ?receipt.order_id, "Cash order placed");
        add_breadcrumb("checkout", "Cash order placed", None);
        self.state_tx
            .send_replace(CheckoutState::Success(receipt.order.clone()));
        Ok(CheckoutOutcome::OrderPlaced {
            order: receipt.order,
        })
    }

    /// Move to `Submitting` unless already there.
    fn claim(&self) -> bool {
        self.state_tx.send_if_modified(|state| {
            if state.is_submitting() {
                return false;
            }
            *state = CheckoutState::Submitting;
            true
        })
    }

    fn fail(&self, error: ClientError, message: String) -> ClientError {
        error.report("checkout");
        self.state_tx.send_replace(CheckoutState::Failed(message));
        error
    }
}

impl std::fmt::Debug for CheckoutCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutCoordinator")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Server message when there is one, otherwise a status-based fallback.
fn cash_failure_message(error: &ClientError) -> String {
    match error {
        ClientError::Rejected { message, .. }
        | ClientError::NotFound(message)
        | ClientError::Unauthorized(message)
            if !message.is_empty() =>
        {
            message.clone()
        }
        ClientError::NotAuthenticated | ClientError::Unauthorized(_) => {
            "Please login first".to_string()
        }
        ClientError::Rejected { status: 400, .. } => "Invalid order data".to_string(),
        _ => CASH_ORDER_FAILED.to_string(),
    }
}
