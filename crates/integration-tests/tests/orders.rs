//! Order endpoints against the fake backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use rust_decimal::Decimal;

use shopfront_core::{AddressId, CheckoutSummary, NewOrder, OrderDetails, OrderId, OrderStatus};
use shopfront_integration_tests::{FakeBackend, TestClient, product};
use shopfront_storefront::api::{ApiError, OrderApi};

async fn backend_with_catalog() -> FakeBackend {
    let backend = FakeBackend::start().await;
    backend.add_product(product(1, "classic-tee", "20.00", None));
    backend.add_product(product(2, "denim-jacket", "50.00", Some("40.00")));
    backend
}

/// Fill the cart and place an order for it, the way checkout does.
async fn place_order(client: &TestClient, slug: &str, quantity: u32) -> OrderDetails {
    let api = client.state.api();
    let cart = client.state.cart();
    let item = api.get_product_by_slug(slug).await.unwrap();
    assert!(cart.add_to_cart(&item, quantity).await.is_applied());

    let summary = CheckoutSummary::compute(&cart.items(), None);
    let order = api
        .create_order(&NewOrder::new(AddressId::new(7), None, summary.shipping))
        .await
        .unwrap();
    assert!(cart.clear_cart().await.is_applied());
    order
}

#[tokio::test]
async fn test_placed_order_matches_checkout_summary() {
    let backend = backend_with_catalog().await;
    let client = TestClient::logged_in(&backend).await;
    let api = client.state.api();
    let cart = client.state.cart();

    cart.add_to_cart(&api.get_product_by_slug("classic-tee").await.unwrap(), 2)
        .await;
    cart.add_to_cart(&api.get_product_by_slug("denim-jacket").await.unwrap(), 1)
        .await;
    let summary = CheckoutSummary::compute(&cart.items(), None);

    let order = api
        .create_order(&NewOrder::new(AddressId::new(7), None, summary.shipping))
        .await
        .unwrap();

    assert_eq!(order.order.status, OrderStatus::Pending);
    assert_eq!(order.order.subtotal, summary.subtotal);
    assert_eq!(order.order.shipping_cost, summary.shipping);
    assert_eq!(order.order.tax, summary.tax);
    assert_eq!(order.order.total, summary.total);
    assert_eq!(order.item_count(), 3);
    assert_eq!(backend.orders().len(), 1);
}

#[tokio::test]
async fn test_empty_cart_order_is_rejected() {
    let backend = backend_with_catalog().await;
    let client = TestClient::logged_in(&backend).await;

    let err = client
        .state
        .api()
        .create_order(&NewOrder::new(AddressId::new(7), None, Decimal::from(10)))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Api { status: 400, ref message } if message == "Cart is empty"));
    assert!(backend.orders().is_empty());
}

#[tokio::test]
async fn test_order_history_is_paginated() {
    let backend = backend_with_catalog().await;
    let client = TestClient::logged_in(&backend).await;
    for _ in 0..3 {
        place_order(&client, "classic-tee", 1).await;
    }

    let api = client.state.api();
    let first = api.list_orders(1, 2).await.unwrap();
    assert_eq!(first.total, 3);
    assert_eq!(first.pages, 2);
    assert_eq!(first.orders.len(), 2);

    let second = api.list_orders(2, 2).await.unwrap();
    assert_eq!(second.orders.len(), 1);

    // Newest first.
    assert!(first.orders[0].id > first.orders[1].id);
    assert!(first.orders[1].id > second.orders[0].id);
}

#[tokio::test]
async fn test_zero_page_is_rejected_locally() {
    let backend = backend_with_catalog().await;
    let client = TestClient::logged_in(&backend).await;

    let err = client.state.api().list_orders(0, 10).await.unwrap_err();

    assert!(matches!(err, ApiError::InvalidRequest(_)));
    assert_eq!(backend.count("GET my-orders"), 0);
}

#[tokio::test]
async fn test_order_details_round_trip() {
    let backend = backend_with_catalog().await;
    let client = TestClient::logged_in(&backend).await;
    let placed = place_order(&client, "denim-jacket", 2).await;

    let fetched = client.state.api().get_order(placed.order.id).await.unwrap();

    assert_eq!(fetched, placed);
    assert_eq!(fetched.items[0].unit_price, Decimal::from(40));
    assert_eq!(fetched.items[0].total_price, Decimal::from(80));
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let backend = backend_with_catalog().await;
    let client = TestClient::logged_in(&backend).await;

    let err = client
        .state
        .api()
        .get_order(OrderId::new(999))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_cancel_pending_order() {
    let backend = backend_with_catalog().await;
    let client = TestClient::logged_in(&backend).await;
    let placed = place_order(&client, "classic-tee", 1).await;

    let cancelled = client
        .state
        .api()
        .cancel_order(placed.order.id)
        .await
        .unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(backend.orders()[0].order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_shipped_order_cannot_be_cancelled() {
    let backend = backend_with_catalog().await;
    let client = TestClient::logged_in(&backend).await;
    let placed = place_order(&client, "classic-tee", 1).await;
    backend.set_order_status(placed.order.id, OrderStatus::Shipped);

    let err = client
        .state
        .api()
        .cancel_order(placed.order.id)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Api { status: 400, .. }));
    assert_eq!(backend.orders()[0].order.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn test_order_calls_refresh_expired_token() {
    let backend = backend_with_catalog().await;
    let client = TestClient::logged_in(&backend).await;
    place_order(&client, "classic-tee", 1).await;
    backend.expire_access_token();

    let page = client.state.api().list_orders(1, 10).await.unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(backend.count("POST refresh"), 1);
}

#[tokio::test]
async fn test_order_failure_surfaces_status() {
    let backend = backend_with_catalog().await;
    let client = TestClient::logged_in(&backend).await;
    backend.fail_next(StatusCode::INTERNAL_SERVER_ERROR);

    let err = client.state.api().list_orders(1, 10).await.unwrap_err();

    assert!(matches!(err, ApiError::Api { status: 500, .. }));
}
