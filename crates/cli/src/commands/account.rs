//! Session, profile and password recovery commands.
//!
//! # Usage
//!
//! ```bash
//! freshcart login -e a@b.com -p 'Aa1@aaaa'
//! freshcart whoami
//! freshcart profile update -n Mona -e mona@example.com --phone 01012345678
//! freshcart password forgot -e a@b.com
//! freshcart password verify -e a@b.com -c 482913
//! freshcart password reset -e a@b.com -c 482913 --new-password 'n3wpass'
//! freshcart logout
//! ```

use freshcart_storefront::Storefront;
use freshcart_storefront::error::ClientError;
use freshcart_storefront::forms::{self, RegistrationForm};

use super::CliError;

pub async fn login(storefront: &Storefront, email: &str, password: &str) -> Result<(), CliError> {
    let credentials = forms::sign_in(email, password).map_err(ClientError::from)?;
    storefront.session().login(&credentials).await?;

    let name = storefront
        .session()
        .identity()
        .map(|identity| identity.name)
        .unwrap_or_default();
    #[allow(clippy::print_stdout)]
    {
        println!("Signed in as {name}");
        println!(
            "Cart: {} item(s), wishlist: {} item(s)",
            storefront.cart().count(),
            storefront.wishlist().count()
        );
    }
    Ok(())
}

pub fn logout(storefront: &Storefront) {
    storefront.session().logout();
    #[allow(clippy::print_stdout)]
    {
        println!("Signed out");
    }
}

pub async fn register(storefront: &Storefront, form: &RegistrationForm) -> Result<(), CliError> {
    storefront.session().register(form).await?;
    #[allow(clippy::print_stdout)]
    {
        println!("Account created for {}. Sign in to continue.", form.email);
    }
    Ok(())
}

pub async fn whoami(storefront: &Storefront) -> Result<(), CliError> {
    let profile = storefront.session().current_user().await?;
    #[allow(clippy::print_stdout)]
    {
        println!("{} <{}>", profile.name, profile.email);
        if let Some(phone) = &profile.phone {
            println!("Phone: {phone}");
        }
        println!("Role:  {}", profile.role);
        println!("Id:    {}", profile.id);
    }
    Ok(())
}

pub async fn update_profile(
    storefront: &Storefront,
    name: &str,
    email: &str,
    phone: &str,
) -> Result<(), CliError> {
    storefront
        .session()
        .update_profile(name, email, phone)
        .await?;
    #[allow(clippy::print_stdout)]
    {
        println!("Profile updated");
    }
    Ok(())
}

pub async fn forgot_password(storefront: &Storefront, email: &str) -> Result<(), CliError> {
    let message = storefront.recovery().forgot_password(email).await?;
    #[allow(clippy::print_stdout)]
    {
        println!("{message}");
    }
    Ok(())
}

pub async fn verify_reset_code(
    storefront: &Storefront,
    email: &str,
    code: &str,
) -> Result<(), CliError> {
    let status = storefront.recovery().verify_reset_code(email, code).await?;
    #[allow(clippy::print_stdout)]
    {
        println!("Code accepted ({status})");
    }
    Ok(())
}

pub async fn reset_password(
    storefront: &Storefront,
    email: &str,
    code: &str,
    new_password: &str,
) -> Result<(), CliError> {
    storefront
        .recovery()
        .reset_password(email, code, new_password)
        .await?;
    #[allow(clippy::print_stdout)]
    {
        println!("Password reset. Sign in with your new password.");
    }
    Ok(())
}
