//! Wishlist entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ProductId, WishlistItemId};
use super::product::Product;

/// A saved product. Wishlist entries carry no quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub product: Product,
    pub created_at: DateTime<Utc>,
}

impl WishlistItem {
    /// ID of the wrapped product.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }
}
