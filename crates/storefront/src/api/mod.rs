//! Backend REST API client.
//!
//! # Architecture
//!
//! - JSON over HTTP via `reqwest`; the backend is the source of truth
//! - Bearer token from the [`Session`](crate::session::Session) on every request
//! - A 401 triggers one token refresh and one retry; a failed refresh ends
//!   the session ([`ApiError::SessionExpired`])
//! - Product lookups are cached in memory via `moka` (5 minute TTL)
//! - No retries beyond the refresh; timeouts come from the HTTP client
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | fetch cart | `GET cart/cart/my-cart/` |
//! | add to cart | `POST cart/cart/add-item/` |
//! | update quantity | `PATCH cart/cart-items/{id}/update-quantity/` |
//! | remove line | `DELETE cart/cart-items/{id}/remove/` |
//! | clear cart | `DELETE cart/cart/clear/` |
//! | fetch wishlist | `GET wishlist/wishlist/my-wishlist/` |
//! | add to wishlist | `POST wishlist/wishlist/add-item/` |
//! | remove from wishlist | `DELETE wishlist/wishlist-items/{id}/remove/` |
//! | clear wishlist | `DELETE wishlist/wishlist/clear/` |
//! | product by slug | `GET products/products/{slug}/` |
//! | list orders | `GET orders/orders/my-orders/?page=&limit=` |
//! | order details | `GET orders/orders/{id}/` |
//! | place order | `POST orders/orders/` |
//! | cancel order | `POST orders/orders/{id}/cancel/` |
//! | login | `POST accounts/token/` |
//! | refresh | `POST accounts/token/refresh/` |
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_storefront::api::{ApiClient, CartApi};
//!
//! let client = ApiClient::new(&config.api, session)?;
//! let product = client.get_product_by_slug("linen-shirt").await?;
//! let items = client.add_item(product.id, 1).await?;
//! ```

mod auth;
mod cart;
mod client;
mod orders;
mod products;
mod wishlist;

pub use cart::{CartApi, CartItemQuantity};
pub use client::ApiClient;
pub use orders::OrderApi;
pub use wishlist::WishlistApi;

use thiserror::Error;

/// Errors that can occur when calling the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Refresh failed or no refresh token; the shopper must log in again.
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// Endpoint path or header could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
