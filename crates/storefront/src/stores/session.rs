//! Session store.
//!
//! [`SessionHandle`] is the shared token and identity slot every store reads
//! from. [`SessionStore`] owns the transitions: login, logout, restore at
//! start-up, and token verification. Verification fails closed: any error,
//! network failures included, tears the session down.

use std::sync::Arc;

use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::{CartStore, WishlistStore};
use crate::api::types::{Credentials, Identity, UserProfile};
use crate::api::{AccountApi, AuthApi};
use crate::error::{
    ClientError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user,
};
use crate::forms::{self, RegistrationForm};
use crate::storage::TokenVault;

// =============================================================================
// Handle
// =============================================================================

/// Shared, cloneable view of the current session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    token: RwLock<Option<SecretString>>,
    identity: RwLock<Option<Identity>>,
    authenticated_tx: watch::Sender<bool>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    /// A signed-out session.
    #[must_use]
    pub fn new() -> Self {
        let (authenticated_tx, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(None),
                identity: RwLock::new(None),
                authenticated_tx,
            }),
        }
    }

    /// The current token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.inner.token.read().clone()
    }

    /// The current token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when signed out.
    pub fn require_token(&self) -> Result<SecretString> {
        self.token().ok_or(ClientError::NotAuthenticated)
    }

    /// Whether `token` is still the session's token.
    ///
    /// Results of a request made with `token` are only published while this
    /// holds.
    #[must_use]
    pub fn holds(&self, token: &SecretString) -> bool {
        self.inner
            .token
            .read()
            .as_ref()
            .is_some_and(|current| current.expose_secret() == token.expose_secret())
    }

    /// Claims of the verified token.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.inner.identity.read().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        *self.inner.authenticated_tx.borrow()
    }

    /// Subscribe to authentication changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.authenticated_tx.subscribe()
    }

    pub(crate) fn set_token(&self, token: SecretString) {
        *self.inner.token.write() = Some(token);
        self.publish(true);
    }

    pub(crate) fn set_identity(&self, identity: Identity) {
        *self.inner.identity.write() = Some(identity);
    }

    pub(crate) fn clear(&self) {
        *self.inner.token.write() = None;
        *self.inner.identity.write() = None;
        self.publish(false);
    }

    fn publish(&self, authenticated: bool) {
        self.inner.authenticated_tx.send_if_modified(|current| {
            let changed = *current != authenticated;
            *current = authenticated;
            changed
        });
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("authenticated", &self.is_authenticated())
            .field("identity", &self.identity())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Store
// =============================================================================

/// Session transitions.
pub struct SessionStore {
    auth: Arc<dyn AuthApi>,
    account: Arc<dyn AccountApi>,
    session: SessionHandle,
    vault: TokenVault,
    cart: Arc<CartStore>,
    wishlist: Arc<WishlistStore>,
}

impl SessionStore {
    pub fn new(
        auth: Arc<dyn AuthApi>,
        account: Arc<dyn AccountApi>,
        session: SessionHandle,
        vault: TokenVault,
        cart: Arc<CartStore>,
        wishlist: Arc<WishlistStore>,
    ) -> Self {
        Self {
            auth,
            account,
            session,
            vault,
            cart,
            wishlist,
        }
    }

    /// The shared handle stores read the token from.
    #[must_use]
    pub const fn handle(&self) -> &SessionHandle {
        &self.session
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.session.token()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.session.identity()
    }

    /// Subscribe to authentication changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.session.subscribe()
    }

    /// Sign in, persist the token, verify it, then load cart and wishlist.
    ///
    /// # Errors
    ///
    /// Returns the sign-in error, a storage error if the token could not be
    /// persisted, or [`ClientError::VerificationFailed`] after tearing the
    /// session down.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<SecretString> {
        let sign_in = self.auth.sign_in(credentials).await.inspect_err(|e| {
            e.report("login");
        })?;

        if let Err(e) = self.vault.persist(&sign_in.token) {
            let e = ClientError::from(e);
            e.report("persist token");
            if let Err(wipe_error) = self.vault.clear() {
                warn!(error = %wipe_error, "Failed to wipe partially persisted token");
            }
            return Err(e);
        }
        self.session.set_token(sign_in.token.clone());
        debug!(name = ?sign_in.name, "Signed in, verifying token");

        self.verify(&sign_in.token).await?;
        info!("Login complete");
        add_breadcrumb("auth", "Logged in", None);
        Ok(sign_in.token)
    }

    /// Tear the session down locally. Never touches the network.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        if let Err(e) = self.vault.clear() {
            warn!(error = %e, "Failed to wipe persisted token");
        }
        self.session.clear();
        self.cart.reset();
        self.wishlist.reset();
        clear_sentry_user();
        add_breadcrumb("auth", "Logged out", None);
        info!("Logged out");
    }

    /// Resume a persisted session at start-up.
    ///
    /// Returns `true` when a persisted token verified. A token that fails
    /// verification is wiped and `false` is returned.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the persisted state cannot be read.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<bool> {
        let Some(token) = self.vault.token()? else {
            debug!("No persisted session");
            return Ok(false);
        };

        self.session.set_token(token.clone());
        match self.verify(&token).await {
            Ok(()) => {
                info!("Session restored");
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Persisted session rejected");
                Ok(false)
            }
        }
    }

    /// Re-verify the current token over the legacy bearer header.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when signed out, or
    /// [`ClientError::VerificationFailed`] after tearing the session down.
    #[instrument(skip(self))]
    pub async fn verify_token_bearer(&self) -> Result<Identity> {
        let token = self.session.require_token()?;
        match self.auth.verify_token_bearer(&token).await {
            Ok(identity) => {
                self.session.set_identity(identity.clone());
                Ok(identity)
            }
            Err(e) => Err(self.fail_verification(e)),
        }
    }

    /// Create an account. The new user still has to sign in.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or the API error.
    #[instrument(skip_all, fields(email = %form.email))]
    pub async fn register(&self, form: &RegistrationForm) -> Result<()> {
        let registration = forms::registration(form)?;
        self.auth
            .sign_up(&registration)
            .await
            .inspect_err(|e| e.report("register"))?;
        info!("Account created");
        add_breadcrumb("auth", "Registered", None);
        Ok(())
    }

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an auth error when signed out, or the API error.
    pub async fn current_user(&self) -> Result<UserProfile> {
        let token = self.session.require_token()?;
        self.account.current_user(&token).await
    }

    /// Update name, email and phone.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, an auth error when signed out,
    /// or the API error.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, name: &str, email: &str, phone: &str) -> Result<()> {
        let update = forms::profile_update(name, email, phone)?;
        let token = self.session.require_token()?;
        self.account
            .update_profile(&token, &update)
            .await
            .inspect_err(|e| e.report("update profile"))?;
        add_breadcrumb("account", "Updated profile", None);
        Ok(())
    }

    /// Identity of the signed-in user, verifying `token` again if the session
    /// was resumed without one. A failed verification logs out.
    pub(crate) async fn verified_identity(&self, token: &SecretString) -> Result<Identity> {
        if let Some(identity) = self.session.identity() {
            return Ok(identity);
        }
        match self.auth.verify_token(token).await {
            Ok(identity) => {
                if self.session.holds(token) {
                    self.session.set_identity(identity.clone());
                }
                Ok(identity)
            }
            Err(e) => Err(self.fail_verification(e)),
        }
    }

    /// Verify `token`; on success record the identity and load the stores,
    /// on failure log out.
    async fn verify(&self, token: &SecretString) -> Result<()> {
        let identity = match self.auth.verify_token(token).await {
            Ok(identity) => identity,
            Err(e) => return Err(self.fail_verification(e)),
        };

        set_sentry_user(&identity.id, Some(identity.name.as_str()));
        self.session.set_identity(identity);

        let (cart, wishlist) = tokio::join!(self.cart.refresh(), self.wishlist.refresh());
        if let Err(e) = cart {
            warn!(error = %e, "Failed to load cart after sign-in");
        }
        if let Err(e) = wishlist {
            warn!(error = %e, "Failed to load wishlist after sign-in");
        }
        Ok(())
    }

    fn fail_verification(&self, error: ClientError) -> ClientError {
        error.report("verify token");
        self.logout();
        match error {
            ClientError::VerificationFailed(message) => ClientError::VerificationFailed(message),
            other => ClientError::VerificationFailed(other.to_string()),
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
