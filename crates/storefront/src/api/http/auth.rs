//! Sign-in, sign-up and token verification.

use async_trait::async_trait;
use reqwest::Method;
use secrecy::SecretString;
use serde::de::IgnoredAny;
use tracing::{debug, instrument};

use super::wire::{SignInRequest, SignInResponse, SignUpRequest, VerifyResponse};
use super::{Auth, HttpApi};
use crate::api::AuthApi;
use crate::api::types::{Credentials, Identity, Registration, SignIn};
use crate::error::{ClientError, Result};

impl HttpApi {
    async fn verify_with(&self, auth: Auth<'_>) -> Result<Identity> {
        let url = self.url("auth/verifyToken")?;
        let response: VerifyResponse = self.execute(self.request(Method::GET, url, auth)).await?;

        match (response.message.as_deref(), response.decoded) {
            (Some("verified") | None, Some(identity)) => Ok(identity),
            (message, _) => Err(ClientError::VerificationFailed(
                message.unwrap_or("token not verified").to_string(),
            )),
        }
    }
}

#[async_trait]
impl AuthApi for HttpApi {
    #[instrument(skip_all, fields(email = %credentials.email))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignIn> {
        let url = self.url("auth/signin")?;
        let body = SignInRequest {
            email: credentials.email.as_str(),
            password: credentials.password.expose(),
        };
        let response: SignInResponse = self
            .execute(self.request(Method::POST, url, Auth::Anonymous).json(&body))
            .await?;

        if response.message.as_deref() != Some("success") {
            return Err(ClientError::Rejected {
                status: 200,
                message: response
                    .message
                    .unwrap_or_else(|| "Sign in failed".to_string()),
            });
        }

        let token = response
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ClientError::UnknownShape("sign-in response has no token".into()))?;

        debug!("Signed in");
        Ok(SignIn {
            token: SecretString::from(token),
            name: response.user.and_then(|user| user.name),
        })
    }

    #[instrument(skip_all, fields(email = %registration.email))]
    async fn sign_up(&self, registration: &Registration) -> Result<()> {
        let url = self.url("auth/signup")?;
        let body = SignUpRequest {
            name: &registration.name,
            email: registration.email.as_str(),
            password: registration.password.expose(),
            re_password: registration.password.expose(),
            phone: registration.phone.as_str(),
        };
        let _: IgnoredAny = self
            .execute(self.request(Method::POST, url, Auth::Anonymous).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn verify_token(&self, token: &SecretString) -> Result<Identity> {
        self.verify_with(Auth::Token(token)).await
    }

    #[instrument(skip_all)]
    async fn verify_token_bearer(&self, token: &SecretString) -> Result<Identity> {
        self.verify_with(Auth::Bearer(token)).await
    }
}
