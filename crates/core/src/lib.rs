//! Shopfront Core - Shared types library.
//!
//! This crate provides the types used across all Shopfront components:
//! - `storefront` - Cart and wishlist stores synced against the backend API
//! - `cli` - Command-line front end that drives the stores
//!
//! # Architecture
//!
//! The core crate contains only types and pure pricing rules - no I/O, no
//! HTTP clients, no persistence. This keeps it lightweight and allows it to
//! be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, products, cart lines, wishlist entries, quantities
//! - [`checkout`] - Order summary math (promo, tax, shipping threshold)
//! - [`types::order`] - Placed orders, their lines and status

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod types;

pub use checkout::{
    CheckoutError, CheckoutSummary, PromoCode, PromoError, ensure_can_checkout, shipping_for,
};
pub use types::*;
