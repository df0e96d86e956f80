//! Account password rules.
//!
//! Sign-up and sign-in forms accept a password only when it mixes lower
//! case, upper case, a digit and one of `@$!%*?&`, uses nothing outside
//! those classes, and is at least six characters long. Password recovery
//! uses the looser [`Password::parse_reset`] rule (length only).

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Special characters a password may (and must) contain.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

static ALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9@$!%*?&]+$").expect("static password regex is valid")
});

/// Errors returned when a password does not satisfy the rules.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// The password is empty.
    #[error("password is required")]
    Empty,
    /// The password is shorter than the minimum.
    #[error("password must be at least {min} characters")]
    TooShort {
        /// Minimum length.
        min: usize,
    },
    /// The password uses a character outside the allowed set.
    #[error("password may only contain letters, digits and {}", PASSWORD_SPECIALS)]
    DisallowedCharacter,
    /// A required character class is missing.
    #[error(
        "password must contain a lowercase letter, an uppercase letter, a digit and one of {}",
        PASSWORD_SPECIALS
    )]
    MissingClass,
}

/// A password that passed form validation.
///
/// The value is never printed: `Debug` and `Display` are redacted.
///
/// ```
/// use freshcart_core::Password;
///
/// assert!(Password::parse("Aa1@aaaa").is_ok());
/// assert!(Password::parse("password").is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Minimum length for both rule sets.
    pub const MIN_LENGTH: usize = 6;

    /// Validate a sign-up / sign-in password.
    ///
    /// # Errors
    ///
    /// Returns a [`PasswordError`] for the first rule that fails.
    pub fn parse(s: &str) -> Result<Self, PasswordError> {
        let password = Self::parse_reset(s)?;

        if !ALLOWED_CHARS.is_match(s) {
            return Err(PasswordError::DisallowedCharacter);
        }

        let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = s.chars().any(|c| c.is_ascii_digit());
        let has_special = s.chars().any(|c| PASSWORD_SPECIALS.contains(c));
        if !(has_lower && has_upper && has_digit && has_special) {
            return Err(PasswordError::MissingClass);
        }

        Ok(password)
    }

    /// Validate a new password chosen during password recovery.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError::Empty`] or [`PasswordError::TooShort`].
    pub fn parse_reset(s: &str) -> Result<Self, PasswordError> {
        if s.is_empty() {
            return Err(PasswordError::Empty);
        }
        if s.chars().count() < Self::MIN_LENGTH {
            return Err(PasswordError::TooShort {
                min: Self::MIN_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Expose the raw password for sending in a request body.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
