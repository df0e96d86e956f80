//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! freshcart cart add 6428ebc6dc1175abc65ca0b9 --quantity 2
//! freshcart cart update 6428ebc6dc1175abc65ca0b9 3
//! freshcart cart show
//! freshcart cart clear
//! ```

use freshcart_core::ProductId;
use freshcart_storefront::Storefront;
use freshcart_storefront::error::ClientError;

use super::CliError;

pub fn show(storefront: &Storefront) {
    let cart = storefront.cart().items();
    #[allow(clippy::print_stdout)]
    {
        if cart.is_empty() {
            println!("Your cart is empty");
            return;
        }
        for line in &cart.lines {
            let title = if line.product.title.is_empty() {
                line.product.id.as_str()
            } else {
                line.product.title.as_str()
            };
            println!(
                "{:<26} {:<40} {:>3} x {:>12} = {:>12}",
                line.product.id,
                title,
                line.quantity,
                line.unit_price.to_string(),
                line.line_total().to_string()
            );
        }
        println!("Total: {} ({} units)", cart.total(), cart.units());
    }
}

pub async fn add(storefront: &Storefront, id: &str, quantity: u32) -> Result<(), CliError> {
    require_session(storefront)?;
    storefront
        .cart()
        .add_item(&ProductId::new(id), quantity)
        .await?;
    show(storefront);
    Ok(())
}

pub async fn update(storefront: &Storefront, id: &str, quantity: i64) -> Result<(), CliError> {
    require_session(storefront)?;
    storefront
        .cart()
        .update_quantity(&ProductId::new(id), quantity)
        .await?;
    show(storefront);
    Ok(())
}

pub async fn remove(storefront: &Storefront, id: &str) -> Result<(), CliError> {
    require_session(storefront)?;
    storefront.cart().remove_item(&ProductId::new(id)).await?;
    show(storefront);
    Ok(())
}

pub async fn clear(storefront: &Storefront) -> Result<(), CliError> {
    require_session(storefront)?;
    storefront.cart().clear().await?;
    show(storefront);
    Ok(())
}

/// Fail early so a signed-out user sees the sign-in hint rather than an
/// empty cart.
pub(super) fn require_session(storefront: &Storefront) -> Result<(), CliError> {
    if storefront.session().is_authenticated() {
        Ok(())
    } else {
        Err(ClientError::NotAuthenticated.into())
    }
}
