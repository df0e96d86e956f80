//! Profile and password recovery.

use async_trait::async_trait;
use freshcart_core::{Email, Password};
use reqwest::Method;
use secrecy::SecretString;
use serde::de::IgnoredAny;
use serde_json::{Map, Value};
use tracing::instrument;

use super::wire::{EmailRequest, ProfileResponse, ProfileUpdateRequest, StatusResponse, TokenResponse};
use super::{Auth, HttpApi};
use crate::api::AccountApi;
use crate::api::types::{ProfileUpdate, UserProfile};
use crate::config::ResetMethod;
use crate::error::{ClientError, Result};

impl HttpApi {
    /// `{"email": ..., <code_field>: code}` plus any extra fields.
    fn reset_body(&self, email: &Email, code: &str, extra: &[(&str, &str)]) -> Value {
        let mut body = Map::new();
        body.insert("email".into(), Value::String(email.as_str().to_string()));
        body.insert(
            self.password_reset().code_field.clone(),
            Value::String(code.trim().to_string()),
        );
        for (key, value) in extra {
            body.insert((*key).to_string(), Value::String((*value).to_string()));
        }
        Value::Object(body)
    }
}

#[async_trait]
impl AccountApi for HttpApi {
    #[instrument(skip_all)]
    async fn current_user(&self, token: &SecretString) -> Result<UserProfile> {
        let url = self.url("users/getMe")?;
        let response: ProfileResponse = self
            .execute(self.request(Method::GET, url, Auth::Token(token)))
            .await?;
        response
            .into_profile()
            .ok_or_else(|| ClientError::UnknownShape("profile response has no user".into()))
    }

    #[instrument(skip_all)]
    async fn update_profile(&self, token: &SecretString, update: &ProfileUpdate) -> Result<()> {
        let url = self.url("users/updateMe/")?;
        let body = ProfileUpdateRequest {
            name: &update.name,
            email: update.email.as_str(),
            phone: update.phone.as_str(),
        };
        let _: IgnoredAny = self
            .execute(self.request(Method::PUT, url, Auth::Token(token)).json(&body))
            .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn forgot_password(&self, email: &Email) -> Result<String> {
        let url = self.url(&self.password_reset().forgot_path)?;
        let body = EmailRequest {
            email: email.as_str(),
        };
        let response: StatusResponse = self
            .execute(self.request(Method::POST, url, Auth::Anonymous).json(&body))
            .await?;
        Ok(response.text())
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn verify_reset_code(&self, email: &Email, code: &str) -> Result<String> {
        let url = self.url(&self.password_reset().verify_code_path)?;
        let body = self.reset_body(email, code, &[]);
        let response: StatusResponse = self
            .execute(self.request(Method::POST, url, Auth::Anonymous).json(&body))
            .await?;
        Ok(response.text())
    }

    #[instrument(skip_all, fields(email = %email))]
    async fn reset_password(
        &self,
        email: &Email,
        code: &str,
        new_password: &Password,
    ) -> Result<Option<SecretString>> {
        let contract = self.password_reset();
        let url = self.url(&contract.reset_path)?;
        let method = match contract.reset_method {
            ResetMethod::Put => Method::PUT,
            ResetMethod::Post => Method::POST,
        };
        let body = self.reset_body(email, code, &[("newPassword", new_password.expose())]);
        let response: TokenResponse = self
            .execute(self.request(method, url, Auth::Anonymous).json(&body))
            .await?;
        Ok(response
            .token
            .filter(|token| !token.is_empty())
            .map(SecretString::from))
    }
}
