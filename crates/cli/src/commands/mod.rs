//! Command implementations.

pub mod cart;
pub mod checkout;
pub mod orders;
pub mod product;
pub mod session;
pub mod wishlist;

use thiserror::Error;

use shopfront_core::{CartItemId, CheckoutError, OrderStatus, PromoError, Quantity, QuantityError};
use shopfront_storefront::api::ApiError;
use shopfront_storefront::error::{Outcome, StoreError};
use shopfront_storefront::state::AppState;

/// Errors surfaced to the shopper by a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Not logged in. Run `sf-cli login` first.")]
    NotLoggedIn,

    #[error("No password given. Set STOREFRONT_PASSWORD or pass --password-stdin.")]
    MissingPassword,

    #[error("Could not read password: {0}")]
    PasswordInput(#[from] std::io::Error),

    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error(transparent)]
    Promo(#[from] PromoError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("No cart line with id {0}")]
    UnknownLine(CartItemId),

    #[error("{product} already has {in_cart} in the cart; maximum quantity allowed is 10")]
    CartLimit { product: String, in_cart: u32 },

    #[error("Order {order_number} is {status} and can no longer be cancelled")]
    NotCancellable {
        order_number: String,
        status: OrderStatus,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Fail unless a session is active.
fn require_session(state: &AppState) -> Result<(), CommandError> {
    if state.session().is_authenticated() {
        Ok(())
    } else {
        Err(CommandError::NotLoggedIn)
    }
}

/// Validate a requested quantity before any request is sent.
fn checked_quantity(quantity: u32) -> Result<Quantity, CommandError> {
    Ok(Quantity::new(quantity)?)
}

/// Convert a store outcome into a command result.
///
/// Returns whether anything changed.
fn applied(outcome: Outcome) -> Result<bool, CommandError> {
    match outcome {
        Outcome::Applied => Ok(true),
        Outcome::Skipped => Ok(false),
        Outcome::Failed(err) => Err(err.into()),
    }
}
