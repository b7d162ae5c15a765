//! Order endpoints.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::instrument;

use shopfront_core::{NewOrder, Order, OrderDetails, OrderId, OrderPage, page_count};

use super::ApiError;
use super::client::ApiClient;

/// Remote order resource.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// One page of the shopper's orders, newest first. Pages start at 1.
    async fn list_orders(&self, page: u32, limit: u32) -> Result<OrderPage, ApiError>;

    /// A single order with its lines.
    async fn get_order(&self, order_id: OrderId) -> Result<OrderDetails, ApiError>;

    /// Place an order for the current server-side cart.
    async fn create_order(&self, order: &NewOrder) -> Result<OrderDetails, ApiError>;

    /// Ask the backend to cancel an order; returns the updated header.
    async fn cancel_order(&self, order_id: OrderId) -> Result<Order, ApiError>;
}

/// Order list body: paginated when the backend has pagination enabled,
/// a bare array otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum OrderListResponse {
    Paginated { count: u64, results: Vec<Order> },
    Plain(Vec<Order>),
}

impl OrderListResponse {
    fn into_page(self, limit: u32) -> OrderPage {
        match self {
            Self::Paginated { count, results } => OrderPage {
                orders: results,
                total: count,
                pages: page_count(count, limit),
            },
            Self::Plain(orders) => OrderPage {
                total: orders.len() as u64,
                pages: 1,
                orders,
            },
        }
    }
}

#[async_trait]
impl OrderApi for ApiClient {
    #[instrument(skip(self))]
    async fn list_orders(&self, page: u32, limit: u32) -> Result<OrderPage, ApiError> {
        if page == 0 || limit == 0 {
            return Err(ApiError::InvalidRequest(format!(
                "page and limit must be positive (page {page}, limit {limit})"
            )));
        }

        let path = format!("orders/orders/my-orders/?page={page}&limit={limit}");
        let response: OrderListResponse = self.send_json(Method::GET, &path, None).await?;
        Ok(response.into_page(limit))
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn get_order(&self, order_id: OrderId) -> Result<OrderDetails, ApiError> {
        let path = format!("orders/orders/{order_id}/");
        self.send_json(Method::GET, &path, None).await
    }

    #[instrument(skip(self, order), fields(shipping_address_id = %order.shipping_address_id))]
    async fn create_order(&self, order: &NewOrder) -> Result<OrderDetails, ApiError> {
        let body = serde_json::to_value(order)?;
        self.send_json(Method::POST, "orders/orders/", Some(body))
            .await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn cancel_order(&self, order_id: OrderId) -> Result<Order, ApiError> {
        let path = format!("orders/orders/{order_id}/cancel/");
        self.send_json(Method::POST, &path, None).await
    }
}
