//! Password recovery: request a code, check it, set a new password.
//!
//! Paths, the reset verb and the code field name come from
//! [`PasswordResetContract`](crate::config::PasswordResetContract); this
//! layer only validates input and forwards it.

use std::sync::Arc;

use freshcart_core::{Email, Password};
use secrecy::SecretString;
use tracing::{info, instrument};

use crate::api::AccountApi;
use crate::error::{Result, add_breadcrumb};
use crate::forms;

/// The three-step recovery flow.
pub struct PasswordRecovery {
    api: Arc<dyn AccountApi>,
}

impl PasswordRecovery {
    pub fn new(api: Arc<dyn AccountApi>) -> Self {
        Self { api }
    }

    /// Ask the server to email a reset code. Returns the server's message.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed email, or the API error.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<String> {
        let email = Email::parse(email)?;
        let message = self
            .api
            .forgot_password(&email)
            .await
            .inspect_err(|e| e.report("forgot password"))?;
        add_breadcrumb("auth", "Requested reset code", None);
        Ok(message)
    }

    /// Check a reset code. Returns the server's status text.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed email or a code shorter
    /// than six characters, or the API error.
    #[instrument(skip(self, code))]
    pub async fn verify_reset_code(&self, email: &str, code: &str) -> Result<String> {
        let email = Email::parse(email)?;
        let code = forms::reset_code(code)?;
        self.api
            .verify_reset_code(&email, &code)
            .await
            .inspect_err(|e| e.report("verify reset code"))
    }

    /// Set a new password.
    ///
    /// Returns the token the server issued, if any. It is not persisted: the
    /// user signs in with the new password.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or the API error.
    #[instrument(skip(self, code, new_password))]
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<Option<SecretString>> {
        let email = Email::parse(email)?;
        let code = forms::reset_code(code)?;
        let new_password = Password::parse_reset(new_password)?;

        let token = self
            .api
            .reset_password(&email, &code, &new_password)
            .await
            .inspect_err(|e| e.report("reset password"))?;
        info!(issued_token = token.is_some(), "Password reset");
        add_breadcrumb("auth", "Reset password", None);
        Ok(token)
    }
}

impl std::fmt::Debug for PasswordRecovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordRecovery").finish_non_exhaustive()
    }
}
