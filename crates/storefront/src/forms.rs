//! Form validation.
//!
//! Each function takes raw user input and returns the validated value the
//! API layer accepts, or the first [`ValidationError`]. Nothing here touches
//! the network.

use freshcart_core::{Email, Password, Phone};

use crate::api::types::{Credentials, ProfileUpdate, Registration, ShippingAddress};
use crate::error::ValidationError;

/// Registration name length bounds, in characters.
pub const NAME_LENGTH: std::ops::RangeInclusive<usize> = 2..=20;

/// Minimum length of the shipping address details line.
pub const MIN_ADDRESS_DETAILS: usize = 10;

/// Minimum length of the shipping city.
pub const MIN_CITY: usize = 2;

/// Minimum length of a password reset code.
pub const MIN_RESET_CODE: usize = 6;

/// Raw sign-up form input.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub re_password: String,
    pub phone: String,
}

/// Raw checkout address input.
#[derive(Debug, Clone, Default)]
pub struct AddressForm {
    pub details: String,
    pub phone: String,
    pub city: String,
}

fn min_chars(field: &'static str, value: &str, min: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::field(field, "is required"));
    }
    if trimmed.chars().count() < min {
        return Err(ValidationError::field(
            field,
            format!("must be at least {min} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate the sign-in form.
///
/// # Errors
///
/// Returns the first failing field rule.
pub fn sign_in(email: &str, password: &str) -> Result<Credentials, ValidationError> {
    Ok(Credentials {
        email: Email::parse(email)?,
        password: Password::parse(password)?,
    })
}

/// Validate the sign-up form.
///
/// # Errors
///
/// Returns the first failing field rule.
pub fn registration(form: &RegistrationForm) -> Result<Registration, ValidationError> {
    let name = min_chars("name", &form.name, *NAME_LENGTH.start())?;
    if name.chars().count() > *NAME_LENGTH.end() {
        return Err(ValidationError::field(
            "name",
            format!("must be at most {} characters", NAME_LENGTH.end()),
        ));
    }
    let email = Email::parse(&form.email)?;
    let password = Password::parse(&form.password)?;
    if form.password != form.re_password {
        return Err(ValidationError::PasswordMismatch);
    }
    let phone = Phone::parse(&form.phone)?;

    Ok(Registration {
        name,
        email,
        password,
        phone,
    })
}

/// Validate the checkout address form.
///
/// # Errors
///
/// Returns the first failing field rule.
pub fn shipping_address(form: &AddressForm) -> Result<ShippingAddress, ValidationError> {
    let details = min_chars("details", &form.details, MIN_ADDRESS_DETAILS)?;
    let phone = Phone::parse(&form.phone)?;
    let city = min_chars("city", &form.city, MIN_CITY)?;

    Ok(ShippingAddress {
        details,
        phone: phone.into(),
        city,
    })
}

/// Validate the profile form.
///
/// # Errors
///
/// Returns the first failing field rule.
pub fn profile_update(name: &str, email: &str, phone: &str) -> Result<ProfileUpdate, ValidationError> {
    Ok(ProfileUpdate {
        name: min_chars("name", name, *NAME_LENGTH.start())?,
        email: Email::parse(email)?,
        phone: Phone::parse(phone)?,
    })
}

/// Validate a password reset code.
///
/// # Errors
///
/// Returns an error if the code is empty or too short.
pub fn reset_code(code: &str) -> Result<String, ValidationError> {
    min_chars("reset code", code, MIN_RESET_CODE)
}
