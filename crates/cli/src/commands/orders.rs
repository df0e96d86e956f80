//! Checkout and order history commands.

use freshcart_core::{OrderId, PaymentMethod};
use freshcart_storefront::Storefront;
use freshcart_storefront::api::types::Order;
use freshcart_storefront::forms::AddressForm;
use freshcart_storefront::services::CheckoutOutcome;

use super::CliError;

pub async fn checkout(
    storefront: &Storefront,
    form: &AddressForm,
    method: PaymentMethod,
) -> Result<(), CliError> {
    let checkout = storefront.checkout();
    let outcome = match checkout.submit(form, method).await {
        Ok(outcome) => outcome,
        Err(e) => {
            return Err(checkout
                .take_failure()
                .map_or_else(|| e.into(), CliError::Checkout));
        }
    };
    #[allow(clippy::print_stdout)]
    {
        match outcome {
            CheckoutOutcome::Redirect { url } => {
                println!("Complete your payment at:");
                println!("{url}");
            }
            CheckoutOutcome::OrderPlaced { order } => {
                println!("Order placed. Pay cash on delivery.");
                if let Some(order) = order {
                    print_order(&order);
                }
            }
        }
    }
    Ok(())
}

pub async fn list(storefront: &Storefront) -> Result<(), CliError> {
    let orders = storefront.orders().orders().await?;
    #[allow(clippy::print_stdout)]
    {
        if orders.is_empty() {
            println!("No orders yet");
        }
        for order in &orders {
            let placed = order
                .created_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            println!(
                "{:<26} {:<10} {:>12}  {:<5} {:?}",
                order.id,
                placed,
                order.total_order_price.to_string(),
                order.payment_method_type,
                order.status()
            );
        }
    }
    Ok(())
}

pub async fn show(storefront: &Storefront, id: &str) -> Result<(), CliError> {
    let order = storefront.orders().order(&OrderId::new(id)).await?;
    print_order(&order);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_order(order: &Order) {
    println!("Order {} ({:?})", order.id, order.status());
    for line in &order.cart_items {
        println!(
            "  {:<26} {:>3} x {}",
            line.product.id(),
            line.count,
            line.price
        );
    }
    if let Some(address) = &order.shipping_address {
        println!("Ship to: {}, {} ({})", address.details, address.city, address.phone);
    }
    println!("Payment: {}", order.payment_method_type);
    println!("Total:   {}", order.total_order_price);
}
