//! Unified error handling with Sentry integration.
//!
//! Every store and service operation returns `Result<T, ClientError>`.
//! Errors are classified by [`ErrorKind`] so callers can branch on the
//! category without matching every variant, and [`ClientError::user_message`]
//! gives the text a UI should show.

use freshcart_core::{EmailError, PasswordError, PhoneError};
use thiserror::Error;

use crate::storage::StorageError;

/// Local form validation failures. These never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Email field failed validation.
    #[error(transparent)]
    Email(#[from] EmailError),

    /// Phone field failed validation.
    #[error(transparent)]
    Phone(#[from] PhoneError),

    /// Password field failed validation.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// The confirmation password does not match.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Any other field rule.
    #[error("{field}: {message}")]
    Field {
        /// Form field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

impl ValidationError {
    /// Build a [`ValidationError::Field`].
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Field {
            field,
            message: message.into(),
        }
    }
}

/// Error category, independent of the variant that carries the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or rejected credentials.
    Auth,
    /// Transport failure, timeout, or server-side 5xx.
    Network,
    /// Local input validation.
    Validation,
    /// The server answered with a body we could not interpret.
    UnknownShape,
    /// The server refused the request with a 4xx and a message.
    Rejected,
    /// The resource does not exist.
    NotFound,
    /// Another submission is already in flight.
    Busy,
    /// Persisted client state could not be read or written.
    Storage,
}

/// Error type for the storefront client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No session token is present.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The server answered 401 or 403.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Token verification failed; the session was torn down.
    #[error("Token verification failed: {0}")]
    VerificationFailed(String),

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request URL could not be built.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The server answered with a 5xx status.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the body, if any.
        message: String,
    },

    /// Local validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnknownShape(String),

    /// The server refused the request.
    #[error("Rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the body.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A checkout submission is already in flight.
    #[error("A submission is already in progress")]
    Busy,

    /// Session storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ClientError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthenticated | Self::Unauthorized(_) | Self::VerificationFailed(_) => {
                ErrorKind::Auth
            }
            Self::Http(_) | Self::InvalidUrl(_) | Self::Server { .. } => ErrorKind::Network,
            Self::Validation(_) => ErrorKind::Validation,
            Self::UnknownShape(_) => ErrorKind::UnknownShape,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Busy => ErrorKind::Busy,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether this is an authentication failure.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self.kind(), ErrorKind::Auth)
    }

    /// Text suitable for showing to the user.
    ///
    /// Server messages are passed through for rejections; transport and
    /// shape failures get generic text so internals are not exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Please sign in to continue.".to_string(),
            Self::Unauthorized(message) if !message.is_empty() => message.clone(),
            Self::Unauthorized(_) | Self::VerificationFailed(_) => {
                "Your session has expired. Please sign in again.".to_string()
            }
            Self::Http(_) | Self::InvalidUrl(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            Self::Server { .. } => {
                "The store is temporarily unavailable. Please try again later.".to_string()
            }
            Self::Validation(err) => err.to_string(),
            Self::UnknownShape(_) => "Unexpected response from the store.".to_string(),
            Self::Rejected { message, .. } | Self::NotFound(message) => message.clone(),
            Self::Busy => "Your order is already being submitted.".to_string(),
            Self::Storage(_) => "Could not save your session on this device.".to_string(),
        }
    }

    /// Log the error, leave a breadcrumb, and capture server-side failures.
    pub fn report(&self, action: &str) {
        add_breadcrumb("error", action, Some(&[("error", &self.to_string())]));

        if matches!(self.kind(), ErrorKind::Network | ErrorKind::UnknownShape) {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                action,
                sentry_event_id = %event_id,
                "Storefront request failed"
            );
        } else {
            tracing::warn!(error = %self, action, "Storefront operation failed");
        }
    }
}

impl From<EmailError> for ClientError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.into())
    }
}

impl From<PhoneError> for ClientError {
    fn from(err: PhoneError) -> Self {
        Self::Validation(err.into())
    }
}

impl From<PasswordError> for ClientError {
    fn from(err: PasswordError) -> Self {
        Self::Validation(err.into())
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context.
///
/// Call this after the session is verified to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "6428ebc6")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data.unwrap_or_default() {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
