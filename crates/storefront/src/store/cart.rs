//! Cart store.
//!
//! [`CartState`] is a plain value with pure transitions: `plan_*` decides
//! which request to send, the other methods return the next state given a
//! completed response. [`CartStore`] owns one `CartState`, runs the planned
//! request against a [`CartApi`], applies the result and persists the item
//! list.
//!
//! Items change only after the backend confirms, so a failed call never
//! needs a rollback.

use std::sync::{Arc, PoisonError, RwLock};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use shopfront_core::{CartItem, CartItemId, Product, ProductId, cart_total, item_count};

use crate::api::{ApiError, CartApi};
use crate::error::{Outcome, StoreError, add_breadcrumb, report};
use crate::notify::{Notice, Notifier};
use crate::storage::{CART_STORAGE_KEY, LocalStorage, load_snapshot, save_snapshot};

const FETCH_FAILED: &str = "Failed to fetch cart";
const ADD_FAILED: &str = "Failed to add item to cart";
const UPDATE_FAILED: &str = "Failed to update item quantity";
const REMOVE_FAILED: &str = "Failed to remove item from cart";
const CLEAR_FAILED: &str = "Failed to clear cart";

// =============================================================================
// State
// =============================================================================

/// Local view of the shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub items: Vec<CartItem>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// The persisted projection of [`CartState`]: items only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCart {
    pub cart_items: Vec<CartItem>,
}

/// A request the cart store has to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartRequest {
    Fetch,
    Add {
        product_id: ProductId,
        quantity: u32,
    },
    UpdateQuantity {
        item_id: CartItemId,
        quantity: u32,
    },
    Remove {
        item_id: CartItemId,
    },
    Clear,
}

impl CartRequest {
    /// Message recorded in state when this request fails.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Fetch => FETCH_FAILED,
            Self::Add { .. } => ADD_FAILED,
            Self::UpdateQuantity { .. } => UPDATE_FAILED,
            Self::Remove { .. } => REMOVE_FAILED,
            Self::Clear => CLEAR_FAILED,
        }
    }

    /// Whether a failure raises a shopper-visible notice.
    ///
    /// Background fetches fail quietly; mutations the shopper asked for do not.
    #[must_use]
    pub const fn notifies_on_failure(self) -> bool {
        !matches!(self, Self::Fetch)
    }

    const fn operation(self) -> &'static str {
        match self {
            Self::Fetch => "fetch_cart",
            Self::Add { .. } => "add_to_cart",
            Self::UpdateQuantity { .. } => "update_cart_item_quantity",
            Self::Remove { .. } => "remove_from_cart",
            Self::Clear => "clear_cart",
        }
    }
}

/// A completed backend response for a [`CartRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartResponse {
    /// The full cart (fetch, add).
    Items(Vec<CartItem>),
    /// A single line's new quantity.
    Quantity { item_id: CartItemId, quantity: u32 },
    /// A line was deleted.
    Removed(CartItemId),
    /// The cart was emptied.
    Cleared,
}

impl CartState {
    /// State restored from a persisted projection.
    #[must_use]
    pub fn hydrate(persisted: PersistedCart) -> Self {
        Self {
            items: persisted.cart_items,
            ..Self::default()
        }
    }

    /// The persisted projection of this state.
    #[must_use]
    pub fn persisted(&self) -> PersistedCart {
        PersistedCart {
            cart_items: self.items.clone(),
        }
    }

    /// The line holding `product_id`, if any.
    #[must_use]
    pub fn item_for_product(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        cart_total(&self.items)
    }

    /// Total units across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        item_count(&self.items)
    }

    /// Decide how to add `quantity` of a product.
    ///
    /// A product already in the cart becomes a quantity update of its line
    /// with the summed quantity, so the cart never holds two lines for one
    /// product.
    #[must_use]
    pub fn plan_add(&self, product_id: ProductId, quantity: u32) -> CartRequest {
        match self.item_for_product(product_id) {
            Some(existing) => CartRequest::UpdateQuantity {
                item_id: existing.id,
                quantity: existing.quantity.saturating_add(quantity),
            },
            None => CartRequest::Add {
                product_id,
                quantity,
            },
        }
    }

    /// Mark a request in flight.
    #[must_use]
    pub fn begin(self) -> Self {
        Self {
            is_loading: true,
            ..self
        }
    }

    /// Apply a successful response.
    #[must_use]
    pub fn apply(self, response: CartResponse) -> Self {
        let items = match response {
            CartResponse::Items(items) => items,
            CartResponse::Quantity { item_id, quantity } => self
                .items
                .into_iter()
                .map(|item| {
                    if item.id == item_id {
                        CartItem { quantity, ..item }
                    } else {
                        item
                    }
                })
                .collect(),
            CartResponse::Removed(item_id) => self
                .items
                .into_iter()
                .filter(|item| item.id != item_id)
                .collect(),
            CartResponse::Cleared => Vec::new(),
        };

        Self {
            items,
            is_loading: false,
            error: None,
        }
    }

    /// Record a failure; items are left untouched.
    #[must_use]
    pub fn fail(self, message: &str) -> Self {
        Self {
            is_loading: false,
            error: Some(message.to_string()),
            ..self
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Cart state container synced against the backend.
pub struct CartStore {
    state: RwLock<CartState>,
    api: Arc<dyn CartApi>,
    storage: Arc<dyn LocalStorage>,
    notifier: Arc<dyn Notifier>,
}

impl CartStore {
    /// Create a store, restoring the last persisted cart.
    ///
    /// An unreadable snapshot is logged and the store starts empty; the next
    /// fetch reconciles with the backend either way.
    #[must_use]
    pub fn new(
        api: Arc<dyn CartApi>,
        storage: Arc<dyn LocalStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let state = match load_snapshot::<PersistedCart>(storage.as_ref(), CART_STORAGE_KEY) {
            Ok(Some(persisted)) => CartState::hydrate(persisted),
            Ok(None) => CartState::default(),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cart snapshot");
                CartState::default()
            }
        };

        Self {
            state: RwLock::new(state),
            api,
            storage,
            notifier,
        }
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.read(Clone::clone)
    }

    /// Current lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.read(|s| s.items.clone())
    }

    /// Cart total, recomputed from the current lines.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.read(CartState::total)
    }

    /// Total units across lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.read(CartState::item_count)
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read(|s| s.is_loading)
    }

    /// Message from the last failed operation.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read(|s| s.error.clone())
    }

    /// Replace local lines with the backend's cart.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Outcome {
        self.execute(CartRequest::Fetch).await
    }

    /// Add a product, merging into its existing line if present.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(&self, product: &Product, quantity: u32) -> Outcome {
        let request = self.read(|s| s.plan_add(product.id, quantity));
        if matches!(request, CartRequest::UpdateQuantity { .. }) {
            debug!("Product already in cart, updating line quantity");
        }
        self.execute(request).await
    }

    /// Set a line's quantity. Bounds are the caller's responsibility.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_cart_item_quantity(&self, item_id: CartItemId, quantity: u32) -> Outcome {
        self.execute(CartRequest::UpdateQuantity { item_id, quantity })
            .await
    }

    /// Remove a line.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_from_cart(&self, item_id: CartItemId) -> Outcome {
        self.execute(CartRequest::Remove { item_id }).await
    }

    /// Remove every line.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Outcome {
        self.execute(CartRequest::Clear).await
    }

    async fn execute(&self, request: CartRequest) -> Outcome {
        self.update(CartState::begin);
        let detail = format!("{request:?}");
        add_breadcrumb("cart", request.operation(), Some(&[("request", detail.as_str())]));

        match self.send(request).await {
            Ok(response) => {
                self.update(|s| s.apply(response));
                self.persist();
                Outcome::Applied
            }
            Err(e) => {
                let message = request.failure_message();
                self.update(|s| s.fail(message));
                if request.notifies_on_failure() {
                    self.notifier.notify(Notice::error(message));
                }
                let err = StoreError::from(e);
                report(request.operation(), &err);
                Outcome::Failed(err)
            }
        }
    }

    async fn send(&self, request: CartRequest) -> Result<CartResponse, ApiError> {
        match request {
            CartRequest::Fetch => self.api.fetch_cart().await.map(CartResponse::Items),
            CartRequest::Add {
                product_id,
                quantity,
            } => self
                .api
                .add_item(product_id, quantity)
                .await
                .map(CartResponse::Items),
            CartRequest::UpdateQuantity { item_id, quantity } => {
                let updated = self.api.update_quantity(item_id, quantity).await?;
                Ok(CartResponse::Quantity {
                    item_id,
                    quantity: updated.quantity,
                })
            }
            CartRequest::Remove { item_id } => self
                .api
                .remove_item(item_id)
                .await
                .map(|()| CartResponse::Removed(item_id)),
            CartRequest::Clear => self.api.clear_cart().await.map(|()| CartResponse::Cleared),
        }
    }

    fn persist(&self) {
        let persisted = self.read(CartState::persisted);
        if let Err(e) = save_snapshot(self.storage.as_ref(), CART_STORAGE_KEY, &persisted) {
            report("persist_cart", &StoreError::from(e));
        }
    }

    fn read<T>(&self, f: impl FnOnce(&CartState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn update(&self, f: impl FnOnce(CartState) -> CartState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let current = std::mem::take(&mut *state);
        *state = f(current);
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::store::testing::{FakeCart, RecordingNotifier, product};

    fn line(id: i64, product_id: i64, price: i64, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product_id: ProductId::new(product_id),
            name: format!("Product {product_id}"),
            slug: format!("product-{product_id}"),
            price: Decimal::from(price),
            discount_price: None,
            quantity,
            selected_size: None,
            selected_color: None,
            image: None,
        }
    }

    fn store_with(api: Arc<FakeCart>) -> (CartStore, Arc<MemoryStorage>, Arc<RecordingNotifier>) {
        let storage = Arc::new(MemoryStorage::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = CartStore::new(api, storage.clone(), notifier.clone());
        (store, storage, notifier)
    }

    // -------------------------------------------------------------------------
    // Pure transitions
    // -------------------------------------------------------------------------

    #[test]
    fn test_plan_add_new_product() {
        let state = CartState::default();
        assert_eq!(
            state.plan_add(ProductId::new(7), 2),
            CartRequest::Add {
                product_id: ProductId::new(7),
                quantity: 2
            }
        );
    }

    #[test]
    fn test_plan_add_existing_product_sums_quantity() {
        let state = CartState {
            items: vec![line(3, 7, 10, 2)],
            ..CartState::default()
        };
        assert_eq!(
            state.plan_add(ProductId::new(7), 3),
            CartRequest::UpdateQuantity {
                item_id: CartItemId::new(3),
                quantity: 5
            }
        );
    }

    #[test]
    fn test_apply_quantity_patches_only_target_line() {
        let state = CartState {
            items: vec![line(1, 10, 5, 1), line(2, 20, 5, 1)],
            ..CartState::default()
        }
        .begin();
        let next = state.apply(CartResponse::Quantity {
            item_id: CartItemId::new(2),
            quantity: 4,
        });
        assert_eq!(next.items[0].quantity, 1);
        assert_eq!(next.items[1].quantity, 4);
        assert!(!next.is_loading);
    }

    #[test]
    fn test_fail_keeps_items() {
        let state = CartState {
            items: vec![line(1, 10, 5, 1)],
            ..CartState::default()
        }
        .begin()
        .fail(CLEAR_FAILED);
        assert_eq!(state.items.len(), 1);
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some(CLEAR_FAILED));
    }

    #[test]
    fn test_apply_clears_previous_error() {
        let state = CartState::default().fail(FETCH_FAILED).begin();
        let next = state.apply(CartResponse::Items(vec![]));
        assert!(next.error.is_none());
    }

    #[test]
    fn test_persisted_projection_format() {
        let state = CartState {
            items: vec![line(1, 10, 5, 1)],
            is_loading: true,
            error: Some("boom".to_string()),
        };
        let json = serde_json::to_value(state.persisted()).unwrap();
        assert!(json.get("cartItems").is_some());
        assert!(json.get("isLoading").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_total_matches_pricing_rule() {
        let mut discounted = line(2, 20, 50, 1);
        discounted.discount_price = Some(Decimal::from(40));
        let state = CartState {
            items: vec![line(1, 10, 20, 2), discounted],
            ..CartState::default()
        };
        assert_eq!(state.total(), Decimal::from(80));
        assert_eq!(state.item_count(), 3);
    }

    // -------------------------------------------------------------------------
    // Store behaviour
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_add_twice_keeps_single_line() {
        let api = Arc::new(FakeCart::default());
        let (store, _, _) = store_with(api.clone());
        let shirt = product(7, "19.99");

        assert!(store.add_to_cart(&shirt, 1).await.is_applied());
        assert!(store.add_to_cart(&shirt, 2).await.is_applied());

        let items = store.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(api.calls(), vec!["add", "update"]);
    }

    #[tokio::test]
    async fn test_fetch_replaces_and_persists() {
        let api = Arc::new(FakeCart::default());
        api.seed(vec![line(1, 10, 20, 2)]);
        let (store, storage, notifier) = store_with(api);

        assert!(store.fetch_cart().await.is_applied());
        assert_eq!(store.items().len(), 1);

        let persisted: PersistedCart = load_snapshot(storage.as_ref(), CART_STORAGE_KEY)
            .unwrap()
            .unwrap();
        assert_eq!(persisted.cart_items.len(), 1);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_quiet() {
        let api = Arc::new(FakeCart::default());
        api.fail_next();
        let (store, _, notifier) = store_with(api);

        assert!(store.fetch_cart().await.is_failed());
        assert_eq!(store.error().as_deref(), Some(FETCH_FAILED));
        assert!(!store.is_loading());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn test_mutation_failure_notifies_and_keeps_items() {
        let api = Arc::new(FakeCart::default());
        api.seed(vec![line(1, 10, 20, 2)]);
        let (store, _, notifier) = store_with(api.clone());
        store.fetch_cart().await;

        api.fail_next();
        let outcome = store.remove_from_cart(CartItemId::new(1)).await;

        assert!(outcome.is_failed());
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.error().as_deref(), Some(REMOVE_FAILED));
        assert_eq!(notifier.messages(), vec![REMOVE_FAILED.to_string()]);
    }

    #[tokio::test]
    async fn test_clear_persists_empty_cart() {
        let api = Arc::new(FakeCart::default());
        api.seed(vec![line(1, 10, 20, 2), line(2, 11, 5, 1)]);
        let (store, storage, _) = store_with(api);
        store.fetch_cart().await;

        assert!(store.clear_cart().await.is_applied());
        assert!(store.items().is_empty());

        let persisted: PersistedCart = load_snapshot(storage.as_ref(), CART_STORAGE_KEY)
            .unwrap()
            .unwrap();
        assert!(persisted.cart_items.is_empty());
    }

    #[tokio::test]
    async fn test_hydrates_from_storage() {
        let storage = Arc::new(MemoryStorage::new());
        save_snapshot(
            storage.as_ref(),
            CART_STORAGE_KEY,
            &PersistedCart {
                cart_items: vec![line(4, 40, 12, 1)],
            },
        )
        .unwrap();

        let store = CartStore::new(
            Arc::new(FakeCart::default()),
            storage,
            Arc::new(RecordingNotifier::default()),
        );
        assert_eq!(store.items()[0].id, CartItemId::new(4));
        assert_eq!(store.cart_total(), Decimal::from(12));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_starts_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(CART_STORAGE_KEY, "][").unwrap();
        let store = CartStore::new(
            Arc::new(FakeCart::default()),
            storage,
            Arc::new(RecordingNotifier::default()),
        );
        assert!(store.items().is_empty());
    }
}
