//! Price helpers using decimal arithmetic.
//!
//! The backend serializes money as decimal strings (`"19.99"`) in a single
//! store currency, so amounts are plain [`Decimal`]s and never floats.

use rust_decimal::{Decimal, RoundingStrategy};

/// Resolve the unit price a shopper actually pays.
///
/// The discount price wins only when it is present, positive and strictly
/// lower than the list price. A zero discount is treated as "no discount".
#[must_use]
pub fn effective_unit_price(price: Decimal, discount_price: Option<Decimal>) -> Decimal {
    match discount_price {
        Some(discount) if discount > Decimal::ZERO && discount < price => discount,
        _ => price,
    }
}

/// Round a monetary amount to cents, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount for display (e.g., `$19.99`).
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    format!("${:.2}", round_money(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_price_without_discount() {
        assert_eq!(
            effective_unit_price(Decimal::new(20, 0), None),
            Decimal::new(20, 0)
        );
    }

    #[test]
    fn test_effective_price_with_lower_discount() {
        assert_eq!(
            effective_unit_price(Decimal::new(50, 0), Some(Decimal::new(40, 0))),
            Decimal::new(40, 0)
        );
    }

    #[test]
    fn test_effective_price_ignores_higher_or_zero_discount() {
        let price = Decimal::new(50, 0);
        assert_eq!(effective_unit_price(price, Some(Decimal::new(60, 0))), price);
        assert_eq!(effective_unit_price(price, Some(Decimal::ZERO)), price);
    }

    #[test]
    fn test_round_money_midpoint() {
        assert_eq!(round_money(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(round_money(Decimal::new(1004, 3)), Decimal::new(100, 2));
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Decimal::new(1999, 2)), "$19.99");
        assert_eq!(format_price(Decimal::new(10, 0)), "$10.00");
    }
}
