//! Product lookup.

use shopfront_core::format_price;
use shopfront_storefront::state::AppState;

use super::CommandError;

/// Print a product's details.
#[allow(clippy::print_stdout)]
pub async fn show(state: &AppState, slug: &str) -> Result<(), CommandError> {
    let product = state.api().get_product_by_slug(slug).await?;

    println!("{} (id {})", product.name, product.id);
    if product.effective_price() < product.price {
        println!(
            "Price: {} (was {})",
            format_price(product.effective_price()),
            format_price(product.price)
        );
    } else {
        println!("Price: {}", format_price(product.price));
    }
    if let Some(category) = &product.category {
        println!("Category: {}", category.name);
    }
    println!(
        "Stock: {}",
        if product.is_in_stock {
            product.stock.to_string()
        } else {
            "out of stock".to_string()
        }
    );
    if state.wishlist().is_in_wishlist(product.id) {
        println!("In your wishlist");
    }
    if !product.description.is_empty() {
        println!("\n{}", product.description);
    }
    Ok(())
}
