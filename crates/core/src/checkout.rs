//! Checkout pricing: subtotal, promo discount, tax and shipping.
//!
//! # Rules
//!
//! - Subtotal is the cart total (discount prices already applied per line).
//! - `WELCOME10` takes 10% off the subtotal.
//! - Shipping is free when the subtotal is at least $100, otherwise $10.
//!   The threshold is checked against the subtotal before the promo discount.
//! - Tax is 8% of the discounted subtotal. Shipping is not taxed.
//!
//! All outputs are rounded to cents.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::types::cart::{CartItem, cart_total, item_count};
use crate::types::price::round_money;

/// Subtotal at or above which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Flat shipping charge below the threshold.
pub const FLAT_SHIPPING: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Sales tax rate (8%).
pub const TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

/// Errors from promo code entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromoError {
    #[error("Please enter a promo code")]
    Empty,
    #[error("Invalid promo code: {0}")]
    Invalid(String),
}

/// Errors that block proceeding to checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Please log in to continue with checkout")]
    NotAuthenticated,
    #[error("Your cart is empty")]
    EmptyCart,
}

/// A recognised promo code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PromoCode {
    /// 10% off the subtotal.
    Welcome10,
}

impl PromoCode {
    /// Parse user input (trimmed, case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `PromoError::Empty` for blank input and `PromoError::Invalid`
    /// for unknown codes.
    pub fn parse(input: &str) -> Result<Self, PromoError> {
        let code = input.trim();
        if code.is_empty() {
            return Err(PromoError::Empty);
        }

        match code.to_uppercase().as_str() {
            "WELCOME10" => Ok(Self::Welcome10),
            _ => Err(PromoError::Invalid(code.to_string())),
        }
    }

    /// Canonical code string.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Welcome10 => "WELCOME10",
        }
    }

    /// Fraction of the subtotal taken off.
    #[must_use]
    pub const fn rate(self) -> Decimal {
        match self {
            Self::Welcome10 => Decimal::from_parts(10, 0, 0, false, 2),
        }
    }
}

/// Order summary shown before checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSummary {
    pub line_count: usize,
    pub item_count: u32,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub promo: Option<PromoCode>,
}

impl CheckoutSummary {
    /// Price a set of cart lines.
    #[must_use]
    pub fn compute(items: &[CartItem], promo: Option<PromoCode>) -> Self {
        let subtotal = cart_total(items);
        let discount = promo.map_or(Decimal::ZERO, |p| subtotal * p.rate());
        let shipping = shipping_for(subtotal);
        let tax = (subtotal - discount) * TAX_RATE;
        let total = subtotal - discount + shipping + tax;

        Self {
            line_count: items.len(),
            item_count: item_count(items),
            subtotal: round_money(subtotal),
            discount: round_money(discount),
            shipping,
            tax: round_money(tax),
            total: round_money(total),
            promo,
        }
    }

    /// Whether shipping is free for this order.
    #[must_use]
    pub fn is_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }
}

/// Shipping charge for a subtotal.
#[must_use]
pub fn shipping_for(subtotal: Decimal) -> Decimal {
    if subtotal >= FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING
    }
}

/// Gate for proceeding to checkout.
///
/// # Errors
///
/// Returns `CheckoutError::NotAuthenticated` before `CheckoutError::EmptyCart`.
pub const fn ensure_can_checkout(
    authenticated: bool,
    items: &[CartItem],
) -> Result<(), CheckoutError> {
    if !authenticated {
        return Err(CheckoutError::NotAuthenticated);
    }
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    Ok(())
}
