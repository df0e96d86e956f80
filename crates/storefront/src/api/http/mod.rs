//! `reqwest` implementation of the commerce API.
//!
//! All endpoints share one [`HttpApi::execute`] path: it holds a loading
//! guard for the duration of the request, maps HTTP status codes onto
//! [`ClientError`] variants, and parses the body into the expected shape.

mod account;
mod auth;
mod cart;
mod catalog;
mod orders;
mod wire;
mod wishlist;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::{ClientConfig, PasswordResetContract};
use crate::error::{ClientError, Result};
use crate::loading::LoadingTracker;

/// Header carrying the session token on authenticated calls.
const TOKEN_HEADER: &str = "token";

/// Longest body excerpt kept in logs and fallback error messages.
const BODY_EXCERPT_CHARS: usize = 200;

/// How a request proves who is calling.
#[derive(Clone, Copy)]
enum Auth<'a> {
    Anonymous,
    Token(&'a SecretString),
    Bearer(&'a SecretString),
}

/// Client for the commerce REST API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct HttpApi {
    inner: Arc<HttpApiInner>,
}

struct HttpApiInner {
    client: reqwest::Client,
    base_url: Url,
    password_reset: PasswordResetContract,
    loading: LoadingTracker,
}

impl HttpApi {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, loading: LoadingTracker) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpApiInner {
                client,
                base_url: config.api_base_url.clone(),
                password_reset: config.password_reset.clone(),
                loading,
            }),
        })
    }

    /// The API root every path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Tracker counting this client's in-flight requests.
    #[must_use]
    pub fn loading(&self) -> &LoadingTracker {
        &self.inner.loading
    }

    fn password_reset(&self) -> &PasswordResetContract {
        &self.inner.password_reset
    }

    /// Resolve a path relative to the API root.
    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// `{resource}/{id}` with the id percent-encoded.
    fn resource_url(&self, resource: &str, id: &str) -> Result<Url> {
        self.url(&format!("{resource}/{}", urlencoding::encode(id)))
    }

    fn request(&self, method: Method, url: Url, auth: Auth<'_>) -> RequestBuilder {
        let builder = self
            .inner
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");

        match auth {
            Auth::Anonymous => builder,
            Auth::Token(token) => builder.header(TOKEN_HEADER, token.expose_secret()),
            Auth::Bearer(token) => builder.bearer_auth(token.expose_secret()),
        }
    }

    /// Send a request and parse a successful body as `T`.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let _guard = self.inner.loading.begin();

        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            let message = wire::error_message(&body)
                .unwrap_or_else(|| fallback_message(status, &body));
            debug!(
                status = %status,
                path = %url,
                body = %excerpt(&body),
                "Commerce API returned non-success status"
            );
            return Err(classify(status, message));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                path = %url,
                body = %excerpt(&body),
                "Failed to parse commerce API response"
            );
            ClientError::UnknownShape(e.to_string())
        })
    }
}

/// Map a non-success status onto an error variant.
fn classify(status: StatusCode, message: String) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        s if s.is_client_error() => ClientError::Rejected {
            status: s.as_u16(),
            message,
        },
        s => {
            if !s.is_server_error() {
                warn!(status = %s, "Unexpected non-success status");
            }
            ClientError::Server {
                status: s.as_u16(),
                message,
            }
        }
    }
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed.starts_with('<') {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        excerpt(trimmed)
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn api(base: &str) -> HttpApi {
        let config = ClientConfig::with_base_url(base).unwrap();
        HttpApi::new(&config, LoadingTracker::new()).unwrap()
    }

    #[test]
    fn test_resource_url_encodes_id() {
        let api = api("http://localhost:9000/api/v1");
        let url = api.resource_url("cart", "a b/c").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/api/v1/cart/a%20b%2Fc");
    }

    #[test]
    fn test_url_ignores_leading_slash() {
        let api = api("http://localhost:9000/api/v1/");
        assert_eq!(
            api.url("/auth/signin").unwrap().as_str(),
            "http://localhost:9000/api/v1/auth/signin"
        );
    }

    #[test]
    fn test_classify_statuses() {
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, String::new()).kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            classify(StatusCode::FORBIDDEN, String::new()).kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            classify(StatusCode::NOT_FOUND, String::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, "no".into()).kind(),
            ErrorKind::Rejected
        );
        assert_eq!(
            classify(StatusCode::BAD_GATEWAY, String::new()).kind(),
            ErrorKind::Network
        );
    }

    #[test]
    fn test_fallback_message_skips_html() {
        assert_eq!(
            fallback_message(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            "Bad Gateway"
        );
        assert_eq!(
            fallback_message(StatusCode::BAD_REQUEST, "plain text reason"),
            "plain text reason"
        );
    }
}
