//! Cart line items and the cart total rule.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartItemId, ProductId};
use super::price::effective_unit_price;

/// A single cart line.
///
/// The backend keeps at most one line per product; the line's `id` is the
/// cart-item primary key used by the quantity and removal endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<Decimal>,
    pub quantity: u32,
    #[serde(
        default,
        alias = "selectedSize",
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_size: Option<String>,
    #[serde(
        default,
        alias = "selectedColor",
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartItem {
    /// Unit price after any applicable discount.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        effective_unit_price(self.price, self.discount_price)
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }

    /// Human-readable variant label, e.g. `Size: M, Color: Blue`.
    #[must_use]
    pub fn variant_label(&self) -> Option<String> {
        let parts: Vec<String> = [
            self.selected_size.as_ref().map(|s| format!("Size: {s}")),
            self.selected_color.as_ref().map(|c| format!("Color: {c}")),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Sum of line totals over `items`.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}

/// Total number of units across all lines.
#[must_use]
pub fn item_count(items: &[CartItem]) -> u32 {
    items.iter().map(|item| item.quantity).sum()
}
