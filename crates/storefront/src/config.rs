//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults target the public commerce API.
//!
//! - `FRESHCART_API_BASE_URL` - Commerce API root (default: `https://ecommerce.routemisr.com/api/v1/`)
//! - `FRESHCART_CACHE_TTL_SECS` - Catalog cache freshness window (default: 300)
//! - `FRESHCART_CACHE_CAPACITY` - Maximum cached catalog responses (default: 1000)
//! - `FRESHCART_PAGE_LIMIT` - Products per page (default: 20)
//! - `FRESHCART_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `FRESHCART_RETURN_URL` - Origin the payment gateway returns to (default: `http://localhost:4200`)
//! - `FRESHCART_STATE_DIR` - Directory for persisted session state (default: `.freshcart`)
//! - `FRESHCART_FORGOT_PASSWORD_PATH` - Recovery step 1 path (default: `auth/forgotPasswords`)
//! - `FRESHCART_VERIFY_RESET_CODE_PATH` - Recovery step 2 path (default: `auth/verifyResetCode`)
//! - `FRESHCART_RESET_PASSWORD_PATH` - Recovery step 3 path (default: `auth/resetPassword`)
//! - `FRESHCART_RESET_PASSWORD_METHOD` - `PUT` or `POST` (default: `PUT`)
//! - `FRESHCART_RESET_CODE_FIELD` - JSON field carrying the reset code (default: `resetCode`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default commerce API root.
pub const DEFAULT_API_BASE_URL: &str = "https://ecommerce.routemisr.com/api/v1/";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// HTTP method used for the final password reset call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetMethod {
    #[default]
    Put,
    Post,
}

impl FromStr for ResetMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PUT" => Ok(Self::Put),
            "POST" => Ok(Self::Post),
            other => Err(format!("expected PUT or POST, got {other}")),
        }
    }
}

/// The one request shape used for each password recovery step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetContract {
    /// Path that emails a reset code.
    pub forgot_path: String,
    /// Path that checks a reset code.
    pub verify_code_path: String,
    /// Path that sets the new password.
    pub reset_path: String,
    /// Method for `reset_path`.
    pub reset_method: ResetMethod,
    /// JSON field name carrying the code in the verify step.
    pub code_field: String,
}

impl Default for PasswordResetContract {
    fn default() -> Self {
        Self {
            forgot_path: "auth/forgotPasswords".to_string(),
            verify_code_path: "auth/verifyResetCode".to_string(),
            reset_path: "auth/resetPassword".to_string(),
            reset_method: ResetMethod::Put,
            code_field: "resetCode".to_string(),
        }
    }
}

impl PasswordResetContract {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            forgot_path: get_env_or_default("FRESHCART_FORGOT_PASSWORD_PATH", &defaults.forgot_path),
            verify_code_path: get_env_or_default(
                "FRESHCART_VERIFY_RESET_CODE_PATH",
                &defaults.verify_code_path,
            ),
            reset_path: get_env_or_default("FRESHCART_RESET_PASSWORD_PATH", &defaults.reset_path),
            reset_method: parse_env("FRESHCART_RESET_PASSWORD_METHOD", "PUT")?,
            code_field: get_env_or_default("FRESHCART_RESET_CODE_FIELD", &defaults.code_field),
        })
    }
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Commerce API root, always ending in `/`
    pub api_base_url: Url,
    /// Freshness window for catalog responses
    pub cache_ttl: Duration,
    /// Maximum number of cached catalog responses
    pub cache_capacity: u64,
    /// Products per page
    pub page_limit: u32,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Origin the card payment gateway redirects back to
    pub checkout_return_url: String,
    /// Directory holding persisted session state
    pub state_dir: PathBuf,
    /// Password recovery request shapes
    pub password_reset: PasswordResetContract,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        #[allow(clippy::expect_used)]
        let api_base_url = Url::parse(DEFAULT_API_BASE_URL).expect("default base URL is valid");

        Self {
            api_base_url,
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1000,
            page_limit: 20,
            request_timeout: Duration::from_secs(30),
            checkout_return_url: "http://localhost:4200".to_string(),
            state_dir: PathBuf::from(".freshcart"),
            password_reset: PasswordResetContract::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(&get_env_or_default(
            "FRESHCART_API_BASE_URL",
            DEFAULT_API_BASE_URL,
        ))
        .map_err(|e| ConfigError::InvalidEnvVar("FRESHCART_API_BASE_URL".to_string(), e))?;

        Ok(Self {
            api_base_url,
            cache_ttl: Duration::from_secs(parse_env("FRESHCART_CACHE_TTL_SECS", "300")?),
            cache_capacity: parse_env("FRESHCART_CACHE_CAPACITY", "1000")?,
            page_limit: parse_env("FRESHCART_PAGE_LIMIT", "20")?,
            request_timeout: Duration::from_secs(parse_env(
                "FRESHCART_REQUEST_TIMEOUT_SECS",
                "30",
            )?),
            checkout_return_url: get_env_or_default(
                "FRESHCART_RETURN_URL",
                "http://localhost:4200",
            ),
            state_dir: PathBuf::from(get_env_or_default("FRESHCART_STATE_DIR", ".freshcart")),
            password_reset: PasswordResetContract::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at a different API root, other fields default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let api_base_url = parse_base_url(base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("api_base_url".to_string(), e))?;
        Ok(Self {
            api_base_url,
            ..Self::default()
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a base URL, normalising it to end in `/` so relative joins append.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let trimmed = raw.trim();
    let normalised = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&normalised).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err("must be an absolute http(s) URL".to_string());
    }
    Ok(url)
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
