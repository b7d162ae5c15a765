//! Placed orders.
//!
//! Orders are created by the backend from the shopper's cart; the client
//! only reads them, places new ones and asks for cancellation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{AddressId, OrderId, OrderItemId};
use super::product::Product;

/// Fulfilment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether the shopper may still cancel.
    ///
    /// Once an order ships, cancellation becomes a return.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Failed,
}

/// Order header as listed in the shopper's order history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: String,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One product line of a placed order, priced at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product: Product,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// A single order with its lines and addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_name: String,
    #[serde(default)]
    pub shipping_address_line: String,
    #[serde(default)]
    pub shipping_city: String,
    #[serde(default)]
    pub shipping_postal_code: String,
    #[serde(default)]
    pub shipping_country: String,
}

impl OrderDetails {
    /// Units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Body for placing an order from the current cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    pub use_shipping_for_billing: bool,
    pub shipping_cost: Decimal,
}

impl NewOrder {
    /// Order shipped to `shipping`, billed to `billing` or, when absent, to
    /// the shipping address.
    #[must_use]
    pub fn new(shipping: AddressId, billing: Option<AddressId>, shipping_cost: Decimal) -> Self {
        Self {
            shipping_address_id: shipping,
            billing_address_id: billing.unwrap_or(shipping),
            use_shipping_for_billing: billing.is_none(),
            shipping_cost,
        }
    }
}

/// One page of the shopper's order history.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Orders across all pages.
    pub total: u64,
    pub pages: u64,
}

/// Number of pages needed for `count` orders at `limit` per page.
#[must_use]
pub fn page_count(count: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    count.div_ceil(u64::from(limit))
}
