//! Checkout: price the cart, then place the order.

use tracing::{info, warn};

use shopfront_core::{
    AddressId, CheckoutSummary, NewOrder, PromoCode, ensure_can_checkout, format_price,
};
use shopfront_storefront::api::OrderApi;
use shopfront_storefront::state::AppState;

use super::orders::print_order;
use super::{CommandError, applied, require_session};

/// Price the current cart, optionally with a promo code.
///
/// The promo code is checked before anything is fetched.
pub async fn summary(state: &AppState, promo: Option<&str>) -> Result<(), CommandError> {
    let promo = promo.map(PromoCode::parse).transpose()?;
    let authenticated = state.session().is_authenticated();

    let cart = state.cart();
    if authenticated {
        applied(cart.fetch_cart().await)?;
    }
    let items = cart.items();
    ensure_can_checkout(authenticated, &items)?;

    print_summary(&CheckoutSummary::compute(&items, promo));
    Ok(())
}

/// Place an order for the current cart, then empty the cart.
///
/// Billing goes to the shipping address unless `billing` is given. The order
/// stands even if clearing the cart afterwards fails.
pub async fn place(
    state: &AppState,
    shipping: AddressId,
    billing: Option<AddressId>,
) -> Result<(), CommandError> {
    require_session(state)?;

    let cart = state.cart();
    applied(cart.fetch_cart().await)?;
    let items = cart.items();
    ensure_can_checkout(true, &items)?;

    let summary = CheckoutSummary::compute(&items, None);
    print_summary(&summary);

    let order = state
        .api()
        .create_order(&NewOrder::new(shipping, billing, summary.shipping))
        .await?;
    info!(
        order_number = %order.order.order_number,
        total = %order.order.total,
        "Order placed"
    );

    if let Some(err) = cart.clear_cart().await.error() {
        warn!(error = %err, "Order placed but the cart could not be cleared");
    }

    print_order(&order);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_summary(summary: &CheckoutSummary) {
    println!(
        "Subtotal ({} item(s)): {}",
        summary.item_count,
        format_price(summary.subtotal)
    );
    if let Some(promo) = summary.promo {
        println!(
            "Discount ({}):        -{}",
            promo.code(),
            format_price(summary.discount)
        );
    }
    if summary.is_free_shipping() {
        println!("Shipping:             FREE");
    } else {
        println!("Shipping:             {}", format_price(summary.shipping));
    }
    println!("Tax:                  {}", format_price(summary.tax));
    println!("Total:                {}", format_price(summary.total));
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use shopfront_core::checkout::FLAT_SHIPPING;
    use shopfront_core::{CheckoutError, OrderStatus, PromoError};
    use shopfront_integration_tests::{FakeBackend, TestClient, product};

    async fn backend() -> FakeBackend {
        let backend = FakeBackend::start().await;
        backend.add_product(product(1, "classic-tee", "20.00", None));
        backend
    }

    async fn fill_cart(client: &TestClient) {
        let tee = client
            .state
            .api()
            .get_product_by_slug("classic-tee")
            .await
            .unwrap();
        assert!(client.state.cart().add_to_cart(&tee, 2).await.is_applied());
    }

    #[tokio::test]
    async fn test_summary_requires_login() {
        let backend = backend().await;
        let client = TestClient::new(&backend);

        let err = summary(&client.state, None).await.unwrap_err();

        assert!(matches!(
            err,
            CommandError::Checkout(CheckoutError::NotAuthenticated)
        ));
        assert_eq!(backend.count("GET my-cart"), 0);
    }

    #[tokio::test]
    async fn test_summary_rejects_empty_cart() {
        let backend = backend().await;
        let client = TestClient::logged_in(&backend).await;

        let err = summary(&client.state, None).await.unwrap_err();

        assert!(matches!(err, CommandError::Checkout(CheckoutError::EmptyCart)));
        assert_eq!(backend.count("GET my-cart"), 1);
    }

    #[tokio::test]
    async fn test_invalid_promo_fails_before_fetch() {
        let backend = backend().await;
        let client = TestClient::logged_in(&backend).await;
        fill_cart(&client).await;

        let err = summary(&client.state, Some("FREESTUFF")).await.unwrap_err();

        assert!(matches!(err, CommandError::Promo(PromoError::Invalid(_))));
        assert_eq!(backend.count("GET my-cart"), 0);
    }

    #[tokio::test]
    async fn test_summary_prices_fetched_cart() {
        let backend = backend().await;
        let client = TestClient::logged_in(&backend).await;
        fill_cart(&client).await;

        summary(&client.state, Some("welcome10")).await.unwrap();

        assert_eq!(backend.count("GET my-cart"), 1);
    }

    #[tokio::test]
    async fn test_place_creates_order_and_clears_cart() {
        let backend = backend().await;
        let client = TestClient::logged_in(&backend).await;
        fill_cart(&client).await;

        place(&client.state, AddressId::new(3), None).await.unwrap();

        let orders = backend.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order.status, OrderStatus::Pending);
        assert_eq!(orders[0].order.shipping_cost, FLAT_SHIPPING);
        assert_eq!(orders[0].item_count(), 2);
        assert!(backend.cart().is_empty());
        assert!(client.state.cart().items().is_empty());
    }

    #[tokio::test]
    async fn test_place_with_empty_cart_sends_no_order() {
        let backend = backend().await;
        let client = TestClient::logged_in(&backend).await;

        let err = place(&client.state, AddressId::new(3), None)
            .await
            .unwrap_err();

        assert!(matches!(err, CommandError::Checkout(CheckoutError::EmptyCart)));
        assert_eq!(backend.count("POST orders"), 0);
    }

    #[tokio::test]
    async fn test_place_requires_login() {
        let backend = backend().await;
        let client = TestClient::new(&backend);

        let err = place(&client.state, AddressId::new(3), None)
            .await
            .unwrap_err();

        assert!(matches!(err, CommandError::NotLoggedIn));
        assert!(backend.hits().is_empty());
    }
}
