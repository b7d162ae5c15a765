//! Order history commands.

use tracing::info;

use shopfront_core::{Order, OrderDetails, OrderId, format_price};
use shopfront_storefront::api::OrderApi;
use shopfront_storefront::state::AppState;

use super::{CommandError, require_session};

/// List one page of past orders.
#[allow(clippy::print_stdout)]
pub async fn list(state: &AppState, page: u32, limit: u32) -> Result<(), CommandError> {
    require_session(state)?;

    let history = state.api().list_orders(page, limit).await?;
    if history.orders.is_empty() {
        println!("No orders yet");
        return Ok(());
    }

    for order in &history.orders {
        print_header(order);
    }
    println!(
        "Page {page} of {} ({} order(s))",
        history.pages, history.total
    );
    Ok(())
}

/// Show one order with its lines.
pub async fn show(state: &AppState, order_id: OrderId) -> Result<(), CommandError> {
    require_session(state)?;
    let order = state.api().get_order(order_id).await?;
    print_order(&order);
    Ok(())
}

/// Cancel an order that has not shipped yet.
pub async fn cancel(state: &AppState, order_id: OrderId) -> Result<(), CommandError> {
    require_session(state)?;

    let api = state.api();
    let current = api.get_order(order_id).await?.order;
    if !current.status.is_cancellable() {
        return Err(CommandError::NotCancellable {
            order_number: current.order_number,
            status: current.status,
        });
    }

    let cancelled = api.cancel_order(order_id).await?;
    info!(order_number = %cancelled.order_number, status = %cancelled.status, "Order cancelled");
    print_header(&cancelled);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_header(order: &Order) {
    println!(
        "#{:<6} {} {:<10} {} ({})",
        order.id,
        order.order_number,
        order.status,
        format_price(order.total),
        order.created_at.format("%Y-%m-%d"),
    );
}

#[allow(clippy::print_stdout)]
pub(super) fn print_order(details: &OrderDetails) {
    let order = &details.order;
    print_header(order);

    for item in &details.items {
        println!(
            "  {} x{} @ {} = {}",
            item.product.name,
            item.quantity,
            format_price(item.unit_price),
            format_price(item.total_price),
        );
    }
    println!("  Subtotal: {}", format_price(order.subtotal));
    println!("  Shipping: {}", format_price(order.shipping_cost));
    println!("  Tax:      {}", format_price(order.tax));
    println!("  Total:    {}", format_price(order.total));
    if !details.shipping_name.is_empty() {
        println!(
            "  Ship to:  {}, {}, {}",
            details.shipping_name, details.shipping_address_line, details.shipping_city
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::commands::{cart, checkout};
    use shopfront_core::{AddressId, OrderStatus};
    use shopfront_integration_tests::{FakeBackend, TestClient, product};

    async fn client_with_order(backend: &FakeBackend) -> (TestClient, OrderId) {
        backend.add_product(product(1, "classic-tee", "20.00", None));
        let client = TestClient::logged_in(backend).await;
        cart::add(&client.state, "classic-tee", 1).await.unwrap();
        checkout::place(&client.state, AddressId::new(3), None)
            .await
            .unwrap();
        let order_id = backend.orders()[0].order.id;
        (client, order_id)
    }

    #[tokio::test]
    async fn test_cancel_pending_order() {
        let backend = FakeBackend::start().await;
        let (client, order_id) = client_with_order(&backend).await;

        cancel(&client.state, order_id).await.unwrap();

        assert_eq!(backend.orders()[0].order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_shipped_order_is_refused_locally() {
        let backend = FakeBackend::start().await;
        let (client, order_id) = client_with_order(&backend).await;
        backend.set_order_status(order_id, OrderStatus::Shipped);

        let err = cancel(&client.state, order_id).await.unwrap_err();

        assert!(matches!(
            err,
            CommandError::NotCancellable {
                status: OrderStatus::Shipped,
                ..
            }
        ));
        assert_eq!(backend.count("POST order cancel"), 0);
    }

    #[tokio::test]
    async fn test_list_and_show() {
        let backend = FakeBackend::start().await;
        let (client, order_id) = client_with_order(&backend).await;

        list(&client.state, 1, 10).await.unwrap();
        show(&client.state, order_id).await.unwrap();

        assert_eq!(backend.count("GET my-orders"), 1);
        assert_eq!(backend.count("GET order"), 1);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let backend = FakeBackend::start().await;
        let client = TestClient::logged_in(&backend).await;

        let err = show(&client.state, OrderId::new(404)).await.unwrap_err();

        assert!(matches!(
            err,
            CommandError::Api(shopfront_storefront::api::ApiError::NotFound(_))
        ));
    }
}
