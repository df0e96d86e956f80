//! Wishlist commands.

use freshcart_core::ProductId;
use freshcart_storefront::Storefront;
use freshcart_storefront::stores::Toggled;

use super::CliError;
use super::cart::require_session;

pub fn show(storefront: &Storefront) {
    let items = storefront.wishlist().items();
    #[allow(clippy::print_stdout)]
    {
        if items.is_empty() {
            println!("Your wishlist is empty");
            return;
        }
        for product in &items {
            println!(
                "{:<26} {:<40} {:>12}",
                product.id,
                product.title,
                product.effective_price().to_string()
            );
        }
    }
}

pub async fn add(storefront: &Storefront, id: &str) -> Result<(), CliError> {
    require_session(storefront)?;
    let product = storefront.catalog().product(&ProductId::new(id)).await?;
    storefront.wishlist().add(&product).await?;
    show(storefront);
    Ok(())
}

pub async fn remove(storefront: &Storefront, id: &str) -> Result<(), CliError> {
    require_session(storefront)?;
    storefront.wishlist().remove(&ProductId::new(id)).await?;
    show(storefront);
    Ok(())
}

pub async fn toggle(storefront: &Storefront, id: &str) -> Result<(), CliError> {
    require_session(storefront)?;
    let product = storefront.catalog().product(&ProductId::new(id)).await?;
    let toggled = storefront.wishlist().toggle(&product).await?;
    #[allow(clippy::print_stdout)]
    {
        match toggled {
            Toggled::Added => println!("Added {} to your wishlist", product.title),
            Toggled::Removed => println!("Removed {} from your wishlist", product.title),
        }
    }
    Ok(())
}

pub async fn clear(storefront: &Storefront) -> Result<(), CliError> {
    require_session(storefront)?;
    storefront.wishlist().clear().await?;
    show(storefront);
    Ok(())
}
