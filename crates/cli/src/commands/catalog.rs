//! Catalog browsing commands. None of them need a session.

use freshcart_core::{CategoryId, ProductId};
use freshcart_storefront::Storefront;
use freshcart_storefront::api::types::{Page, Product};

use super::CliError;

#[allow(clippy::print_stdout)]
fn print_products(page: &Page<Product>) {
    if page.data.is_empty() {
        println!("No products found");
        return;
    }
    for product in &page.data {
        println!(
            "{:<26} {:<40} {:>12}  ★ {:.1}",
            product.id,
            product.title,
            product.effective_price().to_string(),
            product.ratings_average
        );
    }
    println!(
        "Page {} of {}",
        page.metadata.current_page.max(1),
        page.metadata.number_of_pages.max(1)
    );
}

pub async fn products(storefront: &Storefront, page: u32) -> Result<(), CliError> {
    let products = storefront.catalog().products(page).await?;
    print_products(&products);
    Ok(())
}

pub async fn product(storefront: &Storefront, id: &str) -> Result<(), CliError> {
    let product = storefront.catalog().product(&ProductId::new(id)).await?;
    #[allow(clippy::print_stdout)]
    {
        println!("{}", product.title);
        match product.price_after_discount {
            Some(discounted) => println!("Price:    {discounted} (was {})", product.price),
            None => println!("Price:    {}", product.price),
        }
        if let Some(category) = &product.category {
            println!("Category: {}", category.name);
        }
        if let Some(brand) = &product.brand {
            println!("Brand:    {}", brand.name);
        }
        println!(
            "Rating:   {:.1} ({} reviews)",
            product.ratings_average, product.ratings_quantity
        );
        println!("In stock: {}", product.quantity);
        if !product.description.is_empty() {
            println!();
            println!("{}", product.description);
        }
    }
    Ok(())
}

pub async fn search(storefront: &Storefront, query: &str) -> Result<(), CliError> {
    let products = storefront.catalog().search(query).await?;
    print_products(&products);
    Ok(())
}

pub async fn categories(storefront: &Storefront, page: u32) -> Result<(), CliError> {
    let categories = storefront.catalog().categories(page).await?;
    #[allow(clippy::print_stdout)]
    {
        for category in &categories.data {
            println!("{:<26} {}", category.id, category.name);
        }
    }
    Ok(())
}

pub async fn subcategories(storefront: &Storefront, category_id: &str) -> Result<(), CliError> {
    let subcategories = storefront
        .catalog()
        .subcategories(&CategoryId::new(category_id))
        .await?;
    #[allow(clippy::print_stdout)]
    {
        for subcategory in &subcategories {
            println!("{:<26} {}", subcategory.id, subcategory.name);
        }
    }
    Ok(())
}

pub async fn brands(storefront: &Storefront, page: u32) -> Result<(), CliError> {
    let brands = storefront.catalog().brands(page).await?;
    #[allow(clippy::print_stdout)]
    {
        for brand in &brands.data {
            println!("{:<26} {}", brand.id, brand.name);
        }
    }
    Ok(())
}
