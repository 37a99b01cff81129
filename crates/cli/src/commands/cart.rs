//! Cart commands.
//!
//! Guests and signed-in customers use the same commands; the cart store picks
//! the scope from the current session.
//!
//! # Usage
//!
//! ```bash
//! eden cart show
//! eden cart add p-123 --quantity 2 --catalog products.json
//! eden cart update <item-id> 3
//! eden cart remove <item-id>
//! eden cart clear
//! ```

use std::path::Path;

use edenshop_core::CartItemId;
use edenshop_storefront::api::Cart;

use super::{App, CliError, catalog};

/// Fetch and print the cart.
///
/// # Errors
///
/// Returns the backend's rejection or a transport error.
pub async fn show(app: &App) -> Result<(), CliError> {
    let cart = app.cart.fetch_cart().await?;
    print_cart(&cart);
    Ok(())
}

/// Add a product looked up in the product file.
///
/// The product's stock in the file bounds the quantity before anything is sent.
///
/// # Errors
///
/// Returns an error if the product cannot be found, the quantity is invalid,
/// or the backend rejects the request.
pub async fn add(
    app: &App,
    catalog_path: &Path,
    product_id: &str,
    quantity: u32,
) -> Result<(), CliError> {
    let product = catalog::find_product(catalog::load_products(catalog_path)?, product_id)?;
    let cart = app.cart.add_item(&product, quantity).await?;
    print_cart(&cart);
    Ok(())
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns an error if the quantity is invalid or the backend rejects the request.
pub async fn update(app: &App, item_id: &str, quantity: u32) -> Result<(), CliError> {
    // Populate the local cart so the stock check has something to go on.
    if app.cart.snapshot().await.cart.is_none()
        && let Err(e) = app.cart.fetch_cart().await
    {
        tracing::debug!(error = %e, "Could not pre-load cart");
    }

    let cart = app
        .cart
        .update_quantity(&CartItemId::new(item_id), quantity)
        .await?;
    print_cart(&cart);
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns the backend's rejection or a transport error.
pub async fn remove(app: &App, item_id: &str) -> Result<(), CliError> {
    let cart = app.cart.remove_item(&CartItemId::new(item_id)).await?;
    print_cart(&cart);
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns the backend's rejection or a transport error.
#[allow(clippy::print_stdout)]
pub async fn clear(app: &App) -> Result<(), CliError> {
    app.cart.clear_cart().await?;
    println!("Cart cleared");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart) {
    if cart.items.is_empty() {
        println!("Cart is empty");
        return;
    }

    for item in &cart.items {
        println!(
            "  {:<38} {:<32} {:>3} x {:>10} = {:>10}",
            item.id,
            item.product.title,
            item.quantity,
            item.product.price,
            item.line_total()
        );
    }
    println!("{} items, total {}", cart.total_items(), cart.total_price());
}
