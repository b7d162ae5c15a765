//! Cart endpoints.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use shopfront_core::{CartItem, CartItemId, ProductId};

use super::ApiError;
use super::client::ApiClient;

/// Remote cart resource.
///
/// The cart store talks to the backend only through this trait, so tests
/// and alternative transports can stand in for [`ApiClient`].
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Load the shopper's cart.
    async fn fetch_cart(&self) -> Result<Vec<CartItem>, ApiError>;

    /// Create a line for a product; returns the full cart.
    async fn add_item(&self, product_id: ProductId, quantity: u32)
    -> Result<Vec<CartItem>, ApiError>;

    /// Set a line's quantity; returns the updated line.
    async fn update_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<CartItemQuantity, ApiError>;

    /// Delete a line.
    async fn remove_item(&self, item_id: CartItemId) -> Result<(), ApiError>;

    /// Delete every line.
    async fn clear_cart(&self) -> Result<(), ApiError>;
}

/// The part of the update-quantity response the store applies.
///
/// The backend returns the whole serialized line; only its quantity is
/// taken, other fields in the local line are left as they were.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItemQuantity {
    pub id: CartItemId,
    pub quantity: u32,
}

#[derive(Deserialize)]
struct CartResponse {
    #[serde(default)]
    items: Vec<CartItem>,
}

#[async_trait]
impl CartApi for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_cart(&self) -> Result<Vec<CartItem>, ApiError> {
        let cart: CartResponse = self
            .send_json(Method::GET, "cart/cart/my-cart/", None)
            .await?;
        Ok(cart.items)
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartItem>, ApiError> {
        let body = serde_json::json!({
            "product_id": product_id,
            "quantity": quantity,
        });
        let cart: CartResponse = self
            .send_json(Method::POST, "cart/cart/add-item/", Some(body))
            .await?;
        Ok(cart.items)
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn update_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<CartItemQuantity, ApiError> {
        let path = format!("cart/cart-items/{item_id}/update-quantity/");
        let body = serde_json::json!({ "quantity": quantity });
        self.send_json(Method::PATCH, &path, Some(body)).await
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn remove_item(&self, item_id: CartItemId) -> Result<(), ApiError> {
        let path = format!("cart/cart-items/{item_id}/remove/");
        self.send_empty(Method::DELETE, &path).await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, "cart/cart/clear/").await
    }
}
