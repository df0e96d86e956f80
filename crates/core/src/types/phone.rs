//! Mobile phone numbers accepted for sign-up, profile and shipping.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static MOBILE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^01[0125][0-9]{8}$").expect("static phone regex is valid")
});

/// Errors returned when a phone number is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input is empty.
    #[error("phone number is required")]
    Empty,
    /// The input is not an 11-digit `010`/`011`/`012`/`015` mobile number.
    #[error("phone number format is invalid")]
    InvalidFormat,
}

/// An Egyptian mobile number such as `01012345678`.
///
/// ```
/// use freshcart_core::Phone;
///
/// assert!(Phone::parse("01012345678").is_ok());
/// assert!(Phone::parse("01312345678").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Parse a phone number, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] if the input is empty or malformed.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }
        if !MOBILE_NUMBER.is_match(s) {
            return Err(PhoneError::InvalidFormat);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_known_prefixes() {
        for number in ["01012345678", "01112345678", "01212345678", "01512345678"] {
            assert!(Phone::parse(number).is_ok(), "{number} should be valid");
        }
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("0101234567"), Err(PhoneError::InvalidFormat));
        assert_eq!(Phone::parse("01412345678"), Err(PhoneError::InvalidFormat));
        assert_eq!(Phone::parse("+201012345678"), Err(PhoneError::InvalidFormat));
    }
}
