//! Order history for the signed-in user.

use std::sync::Arc;

use freshcart_core::OrderId;
use tracing::instrument;

use crate::api::OrderApi;
use crate::api::types::Order;
use crate::error::Result;
use crate::stores::SessionStore;

/// Lists and fetches the current user's orders.
pub struct OrderHistory {
    api: Arc<dyn OrderApi>,
    session: Arc<SessionStore>,
}

impl OrderHistory {
    pub fn new(api: Arc<dyn OrderApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    /// Every order the signed-in user placed.
    ///
    /// # Errors
    ///
    /// Returns an auth error when signed out, or the API error. A token that
    /// no longer verifies ends the session and returns
    /// [`ClientError::VerificationFailed`](crate::error::ClientError::VerificationFailed).
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>> {
        let token = self.session.handle().require_token()?;
        let user_id = self.session.verified_identity(&token).await?.id;
        self.api
            .user_orders(&token, &user_id)
            .await
            .inspect_err(|e| e.report("list orders"))
    }

    /// One order.
    ///
    /// # Errors
    ///
    /// Returns an auth error when signed out, or the API error.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order(&self, id: &OrderId) -> Result<Order> {
        let token = self.session.handle().require_token()?;
        self.api.order(&token, id).await
    }
}

impl std::fmt::Debug for OrderHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderHistory").finish_non_exhaustive()
    }
}
