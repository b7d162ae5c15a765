//! Cart commands.
//!
//! Every command that changes the cart loads it from the backend first, so
//! adding a product already in the cart merges into its line. The merged
//! quantity is held to the same 1-10 bound as a fresh line.

use tracing::info;

use shopfront_core::{CartItem, CartItemId, Product, Quantity, format_price};
use shopfront_storefront::state::AppState;

use super::{CommandError, applied, checked_quantity, require_session};

/// Load and print the cart.
pub async fn show(state: &AppState) -> Result<(), CommandError> {
    require_session(state)?;
    applied(state.cart().fetch_cart().await)?;
    print_cart(state);
    Ok(())
}

/// Add `quantity` units of the product with `slug`.
pub async fn add(state: &AppState, slug: &str, quantity: u32) -> Result<(), CommandError> {
    let quantity = checked_quantity(quantity)?;
    require_session(state)?;

    let product = state.api().get_product_by_slug(slug).await?;
    let cart = state.cart();
    applied(cart.fetch_cart().await)?;
    merged_quantity(&cart.items(), &product, quantity)?;
    applied(cart.add_to_cart(&product, quantity.get()).await)?;

    info!(product = %product.name, quantity = quantity.get(), "Added to cart");
    print_cart(state);
    Ok(())
}

/// Set the quantity of a cart line.
pub async fn update(state: &AppState, item: CartItemId, quantity: u32) -> Result<(), CommandError> {
    let quantity = checked_quantity(quantity)?;
    require_session(state)?;

    let cart = state.cart();
    applied(cart.fetch_cart().await)?;
    if !cart.items().iter().any(|line| line.id == item) {
        return Err(CommandError::UnknownLine(item));
    }
    applied(cart.update_cart_item_quantity(item, quantity.get()).await)?;

    print_cart(state);
    Ok(())
}

/// Remove a cart line.
pub async fn remove(state: &AppState, item: CartItemId) -> Result<(), CommandError> {
    require_session(state)?;

    let cart = state.cart();
    applied(cart.fetch_cart().await)?;
    if !cart.items().iter().any(|line| line.id == item) {
        return Err(CommandError::UnknownLine(item));
    }
    applied(cart.remove_from_cart(item).await)?;

    print_cart(state);
    Ok(())
}

/// Empty the cart.
pub async fn clear(state: &AppState) -> Result<(), CommandError> {
    require_session(state)?;
    applied(state.cart().clear_cart().await)?;
    info!("Cart cleared");
    Ok(())
}

/// Quantity the product's line will hold once `quantity` more are added.
fn merged_quantity(
    items: &[CartItem],
    product: &Product,
    quantity: Quantity,
) -> Result<Quantity, CommandError> {
    let in_cart = items
        .iter()
        .find(|line| line.product_id == product.id)
        .map_or(0, |line| line.quantity);

    Quantity::new(in_cart.saturating_add(quantity.get())).map_err(|_| CommandError::CartLimit {
        product: product.name.clone(),
        in_cart,
    })
}

#[allow(clippy::print_stdout)]
pub(super) fn print_cart(state: &AppState) {
    let snapshot = state.cart().snapshot();
    if snapshot.items.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for line in &snapshot.items {
        let variant = line
            .variant_label()
            .map(|label| format!(" ({label})"))
            .unwrap_or_default();
        println!(
            "#{:<6} {}{} x{} @ {} = {}",
            line.id,
            line.name,
            variant,
            line.quantity,
            format_price(line.unit_price()),
            format_price(line.line_total()),
        );
    }
    println!(
        "{} item(s), total {}",
        snapshot.item_count(),
        format_price(snapshot.total())
    );
}
