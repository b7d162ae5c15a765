//! Validated cart line quantity.
//!
//! Quantity bounds are enforced where the shopper changes a quantity, not in
//! the cart store; a request carrying `0` never leaves the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest quantity a cart line may hold.
pub const MIN_QUANTITY: u32 = 1;

/// Largest quantity a shopper may select for a single line.
pub const MAX_QUANTITY: u32 = 10;

/// Errors for out-of-range quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("Quantity must be at least 1 (got {0})")]
    BelowMinimum(u32),
    #[error("Maximum quantity allowed is 10 (got {0})")]
    AboveMaximum(u32),
}

/// A quantity in `MIN_QUANTITY..=MAX_QUANTITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Validate a raw quantity.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError` when `value` is outside `1..=10`.
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value < MIN_QUANTITY {
            Err(QuantityError::BelowMinimum(value))
        } else if value > MAX_QUANTITY {
            Err(QuantityError::AboveMaximum(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self(MIN_QUANTITY)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(Quantity::new(0), Err(QuantityError::BelowMinimum(0)));
        assert_eq!(Quantity::new(1).unwrap().get(), 1);
        assert_eq!(Quantity::new(10).unwrap().get(), 10);
        assert_eq!(Quantity::new(11), Err(QuantityError::AboveMaximum(11)));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            QuantityError::AboveMaximum(12).to_string(),
            "Maximum quantity allowed is 10 (got 12)"
        );
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("3").unwrap().get(), 3);
    }
}
