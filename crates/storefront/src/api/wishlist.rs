//! Wishlist endpoints.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::instrument;

use shopfront_core::{ProductId, WishlistItem, WishlistItemId};

use super::ApiError;
use super::client::ApiClient;

/// Remote wishlist resource.
#[async_trait]
pub trait WishlistApi: Send + Sync {
    /// Load the shopper's wishlist.
    async fn fetch_wishlist(&self) -> Result<Vec<WishlistItem>, ApiError>;

    /// Save a product; returns the full wishlist.
    async fn add_item(&self, product_id: ProductId) -> Result<Vec<WishlistItem>, ApiError>;

    /// Delete an entry by its wishlist-item id (not the product id).
    async fn remove_item(&self, item_id: WishlistItemId) -> Result<(), ApiError>;

    /// Delete every entry.
    async fn clear_wishlist(&self) -> Result<(), ApiError>;
}

#[derive(Deserialize)]
struct WishlistResponse {
    #[serde(default)]
    items: Vec<WishlistItem>,
}

#[async_trait]
impl WishlistApi for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_wishlist(&self) -> Result<Vec<WishlistItem>, ApiError> {
        let wishlist: WishlistResponse = self
            .send_json(Method::GET, "wishlist/wishlist/my-wishlist/", None)
            .await?;
        Ok(wishlist.items)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_item(&self, product_id: ProductId) -> Result<Vec<WishlistItem>, ApiError> {
        let body = serde_json::json!({ "product_id": product_id });
        let wishlist: WishlistResponse = self
            .send_json(Method::POST, "wishlist/wishlist/add-item/", Some(body))
            .await?;
        Ok(wishlist.items)
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn remove_item(&self, item_id: WishlistItemId) -> Result<(), ApiError> {
        let path = format!("wishlist/wishlist-items/{item_id}/remove/");
        self.send_empty(Method::DELETE, &path).await
    }

    #[instrument(skip(self))]
    async fn clear_wishlist(&self) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, "wishlist/wishlist/clear/").await
    }
}
