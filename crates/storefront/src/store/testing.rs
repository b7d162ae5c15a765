//! In-memory backends for store unit tests.

#![allow(clippy::unwrap_used)]

use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use shopfront_core::{CartItem, CartItemId, Product, ProductId, WishlistItem, WishlistItemId};

use crate::api::{ApiError, CartApi, CartItemQuantity, WishlistApi};
use crate::notify::{Notice, Notifier};

pub fn product(id: i64, price: &str) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        slug: format!("product-{id}"),
        description: String::new(),
        category: None,
        price: Decimal::from_str(price).unwrap(),
        discount_price: None,
        stock: 10,
        is_active: true,
        is_in_stock: true,
        images: Vec::new(),
        average_rating: 0.0,
        created_at: None,
    }
}

fn boom() -> ApiError {
    ApiError::Api {
        status: 500,
        message: "internal error".to_string(),
    }
}

struct FakeState<T> {
    items: Vec<T>,
    next_id: i64,
    fail_next: bool,
    calls: Vec<&'static str>,
}

impl<T> Default for FakeState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 0,
            fail_next: false,
            calls: Vec::new(),
        }
    }
}

impl<T> FakeState<T> {
    fn call(&mut self, name: &'static str) -> Result<(), ApiError> {
        self.calls.push(name);
        if std::mem::take(&mut self.fail_next) {
            return Err(boom());
        }
        Ok(())
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct FakeCart {
    state: Mutex<FakeState<CartItem>>,
}

impl FakeCart {
    pub fn seed(&self, items: Vec<CartItem>) {
        let mut state = self.state.lock().unwrap();
        state.next_id = items.iter().map(|i| i.id.as_i64()).max().unwrap_or(0);
        state.items = items;
    }

    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl CartApi for FakeCart {
    async fn fetch_cart(&self) -> Result<Vec<CartItem>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call("fetch")?;
        Ok(state.items.clone())
    }

    async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartItem>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call("add")?;
        let id = state.next_id();
        let p = product(product_id.as_i64(), "19.99");
        state.items.push(CartItem {
            id: CartItemId::new(id),
            product_id,
            name: p.name,
            slug: p.slug,
            price: p.price,
            discount_price: None,
            quantity,
            selected_size: None,
            selected_color: None,
            image: None,
        });
        Ok(state.items.clone())
    }

    async fn update_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<CartItemQuantity, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call("update")?;
        let item = state
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| ApiError::NotFound(item_id.to_string()))?;
        item.quantity = quantity;
        Ok(CartItemQuantity {
            id: item_id,
            quantity,
        })
    }

    async fn remove_item(&self, item_id: CartItemId) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call("remove")?;
        state.items.retain(|i| i.id != item_id);
        Ok(())
    }

    async fn clear_cart(&self) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call("clear")?;
        state.items.clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeWishlist {
    state: Mutex<FakeState<WishlistItem>>,
}

impl FakeWishlist {
    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl WishlistApi for FakeWishlist {
    async fn fetch_wishlist(&self) -> Result<Vec<WishlistItem>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call("fetch")?;
        Ok(state.items.clone())
    }

    async fn add_item(&self, product_id: ProductId) -> Result<Vec<WishlistItem>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call("add")?;
        let id = state.next_id();
        state.items.push(WishlistItem {
            id: WishlistItemId::new(id),
            product: product(product_id.as_i64(), "25.00"),
            created_at: Utc::now(),
        });
        Ok(state.items.clone())
    }

    async fn remove_item(&self, item_id: WishlistItemId) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call("remove")?;
        state.items.retain(|i| i.id != item_id);
        Ok(())
    }

    async fn clear_wishlist(&self) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.call("clear")?;
        state.items.clear();
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
