//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod quantity;
pub mod wishlist;

pub use cart::{CartItem, cart_total, item_count};
pub use id::*;
pub use order::{
    NewOrder, Order, OrderDetails, OrderItem, OrderPage, OrderStatus, PaymentStatus, page_count,
};
pub use price::{effective_unit_price, format_price, round_money};
pub use product::{Category, Product, ProductImage};
pub use quantity::{MAX_QUANTITY, MIN_QUANTITY, Quantity, QuantityError};
pub use wishlist::WishlistItem;
