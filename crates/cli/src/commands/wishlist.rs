//! Wishlist commands.

use tracing::info;

use shopfront_core::{ProductId, format_price};
use shopfront_storefront::state::AppState;

use super::{CommandError, applied, require_session};

/// Load and print the wishlist.
pub async fn show(state: &AppState) -> Result<(), CommandError> {
    require_session(state)?;
    applied(state.wishlist().fetch_wishlist().await)?;
    print_wishlist(state);
    Ok(())
}

/// Save the product with `slug`.
pub async fn add(state: &AppState, slug: &str) -> Result<(), CommandError> {
    require_session(state)?;

    let product = state.api().get_product_by_slug(slug).await?;
    let wishlist = state.wishlist();
    applied(wishlist.fetch_wishlist().await)?;

    if applied(wishlist.add_to_wishlist(&product).await)? {
        info!(product = %product.name, "Saved to wishlist");
    } else {
        info!(product = %product.name, "Already in wishlist");
    }
    print_wishlist(state);
    Ok(())
}

/// Remove a saved product.
pub async fn remove(state: &AppState, product: ProductId) -> Result<(), CommandError> {
    require_session(state)?;

    let wishlist = state.wishlist();
    applied(wishlist.fetch_wishlist().await)?;

    if !applied(wishlist.remove_from_wishlist(product).await)? {
        info!(product_id = %product, "Product was not in wishlist");
    }
    print_wishlist(state);
    Ok(())
}

/// Remove every saved product.
pub async fn clear(state: &AppState) -> Result<(), CommandError> {
    require_session(state)?;
    applied(state.wishlist().clear_wishlist().await)?;
    info!("Wishlist cleared");
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_wishlist(state: &AppState) {
    let items = state.wishlist().items();
    if items.is_empty() {
        println!("Your wishlist is empty");
        return;
    }

    for item in &items {
        let product = &item.product;
        let stock = if product.is_in_stock { "" } else { " [out of stock]" };
        println!(
            "{:<6} {} {}{}",
            product.id,
            product.name,
            format_price(product.effective_price()),
            stock
        );
    }
}
