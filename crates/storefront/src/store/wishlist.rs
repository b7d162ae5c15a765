//! Wishlist store.
//!
//! Same shape as the cart store: [`WishlistState`] holds pure transitions,
//! [`WishlistStore`] drives them against a [`WishlistApi`]. Entries carry no
//! quantity, so adding a product that is already saved sends nothing.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use shopfront_core::{Product, ProductId, WishlistItem, WishlistItemId};

use crate::api::{ApiError, WishlistApi};
use crate::error::{Outcome, StoreError, add_breadcrumb, report};
use crate::notify::{Notice, Notifier};
use crate::storage::{LocalStorage, WISHLIST_STORAGE_KEY, load_snapshot, save_snapshot};

const FETCH_FAILED: &str = "Failed to fetch wishlist";
const ADD_FAILED: &str = "Failed to add to wishlist";
const REMOVE_FAILED: &str = "Failed to remove from wishlist";
const CLEAR_FAILED: &str = "Failed to clear wishlist";

/// Local view of the shopper's wishlist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WishlistState {
    pub items: Vec<WishlistItem>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Persisted projection of [`WishlistState`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedWishlist {
    pub wishlist_items: Vec<WishlistItem>,
}

/// A request the wishlist store has to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistRequest {
    Fetch,
    Add { product_id: ProductId },
    Remove { item_id: WishlistItemId },
    Clear,
}

impl WishlistRequest {
    /// Message recorded in state when this request fails.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Fetch => FETCH_FAILED,
            Self::Add { .. } => ADD_FAILED,
            Self::Remove { .. } => REMOVE_FAILED,
            Self::Clear => CLEAR_FAILED,
        }
    }

    /// Whether a failure raises a shopper-visible notice.
    #[must_use]
    pub const fn notifies_on_failure(self) -> bool {
        !matches!(self, Self::Fetch)
    }

    const fn operation(self) -> &'static str {
        match self {
            Self::Fetch => "fetch_wishlist",
            Self::Add { .. } => "add_to_wishlist",
            Self::Remove { .. } => "remove_from_wishlist",
            Self::Clear => "clear_wishlist",
        }
    }
}

/// A completed backend response for a [`WishlistRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum WishlistResponse {
    Items(Vec<WishlistItem>),
    Removed(WishlistItemId),
    Cleared,
}

impl WishlistState {
    #[must_use]
    pub fn hydrate(persisted: PersistedWishlist) -> Self {
        Self {
            items: persisted.wishlist_items,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn persisted(&self) -> PersistedWishlist {
        PersistedWishlist {
            wishlist_items: self.items.clone(),
        }
    }

    /// Whether `product_id` is saved.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.items.iter().any(|item| item.product_id() == product_id)
    }

    /// Request to save a product, or `None` when it is already saved.
    #[must_use]
    pub fn plan_add(&self, product_id: ProductId) -> Option<WishlistRequest> {
        (!self.contains(product_id)).then_some(WishlistRequest::Add { product_id })
    }

    /// Request to drop a product's entry, or `None` when it is not saved.
    ///
    /// Callers address entries by product; the backend wants the entry id.
    #[must_use]
    pub fn plan_remove(&self, product_id: ProductId) -> Option<WishlistRequest> {
        self.items
            .iter()
            .find(|item| item.product_id() == product_id)
            .map(|item| WishlistRequest::Remove { item_id: item.id })
    }

    #[must_use]
    pub fn begin(self) -> Self {
        Self {
            is_loading: true,
            ..self
        }
    }

    /// Apply a successful response.
    #[must_use]
    pub fn apply(self, response: WishlistResponse) -> Self {
        let items = match response {
            WishlistResponse::Items(items) => items,
            WishlistResponse::Removed(item_id) => self
                .items
                .into_iter()
                .filter(|item| item.id != item_id)
                .collect(),
            WishlistResponse::Cleared => Vec::new(),
        };

        Self {
            items,
            is_loading: false,
            error: None,
        }
    }

    #[must_use]
    pub fn fail(self, message: &str) -> Self {
        Self {
            is_loading: false,
            error: Some(message.to_string()),
            ..self
        }
    }
}

/// Wishlist state container synced against the backend.
pub struct WishlistStore {
    state: RwLock<WishlistState>,
    api: Arc<dyn WishlistApi>,
    storage: Arc<dyn LocalStorage>,
    notifier: Arc<dyn Notifier>,
}

impl WishlistStore {
    /// Create a store, restoring the last persisted wishlist.
    #[must_use]
    pub fn new(
        api: Arc<dyn WishlistApi>,
        storage: Arc<dyn LocalStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let state =
            match load_snapshot::<PersistedWishlist>(storage.as_ref(), WISHLIST_STORAGE_KEY) {
                Ok(Some(persisted)) => WishlistState::hydrate(persisted),
                Ok(None) => WishlistState::default(),
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable wishlist snapshot");
                    WishlistState::default()
                }
            };

        Self {
            state: RwLock::new(state),
            api,
            storage,
            notifier,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> WishlistState {
        self.read(Clone::clone)
    }

    #[must_use]
    pub fn items(&self) -> Vec<WishlistItem> {
        self.read(|s| s.items.clone())
    }

    /// Whether a product is saved. Answers from local state only.
    #[must_use]
    pub fn is_in_wishlist(&self, product_id: ProductId) -> bool {
        self.read(|s| s.contains(product_id))
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.read(|s| s.is_loading)
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read(|s| s.error.clone())
    }

    /// Replace local entries with the backend's wishlist.
    #[instrument(skip(self))]
    pub async fn fetch_wishlist(&self) -> Outcome {
        self.execute(WishlistRequest::Fetch).await
    }

    /// Save a product. Already-saved products are skipped without a request.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_wishlist(&self, product: &Product) -> Outcome {
        match self.read(|s| s.plan_add(product.id)) {
            Some(request) => self.execute(request).await,
            None => {
                debug!("Product already in wishlist");
                Outcome::Skipped
            }
        }
    }

    /// Drop a product's entry. Unsaved products are skipped without a request.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(&self, product_id: ProductId) -> Outcome {
        match self.read(|s| s.plan_remove(product_id)) {
            Some(request) => self.execute(request).await,
            None => {
                debug!("Product not in wishlist");
                Outcome::Skipped
            }
        }
    }

    /// Remove every entry.
    #[instrument(skip(self))]
    pub async fn clear_wishlist(&self) -> Outcome {
        self.execute(WishlistRequest::Clear).await
    }

    async fn execute(&self, request: WishlistRequest) -> Outcome {
        self.update(WishlistState::begin);
        let detail = format!("{request:?}");
        add_breadcrumb("wishlist", request.operation(), Some(&[("request", detail.as_str())]));

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

    async fn send(&self, request: WishlistRequest) -> Result<WishlistResponse, ApiError> {
        match request {
            WishlistRequest::Fetch => self
                .api
                .fetch_wishlist()
                .await
                .map(WishlistResponse::Items),
            WishlistRequest::Add { product_id } => self
                .api
                .add_item(product_id)
                .await
                .map(WishlistResponse::Items),
            WishlistRequest::Remove { item_id } => self
                .api
                .remove_item(item_id)
                .await
                .map(|()| WishlistResponse::Removed(item_id)),
            WishlistRequest::Clear => self
                .api
                .clear_wishlist()
                .await
                .map(|()| WishlistResponse::Cleared),
        }
    }

    fn persist(&self) {
        let persisted = self.read(WishlistState::persisted);
        if let Err(e) = save_snapshot(self.storage.as_ref(), WISHLIST_STORAGE_KEY, &persisted) {
            report("persist_wishlist", &StoreError::from(e));
        }
    }

    fn read<T>(&self, f: impl FnOnce(&WishlistState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn update(&self, f: impl FnOnce(WishlistState) -> WishlistState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let current = std::mem::take(&mut *state);
        *state = f(current);
    }
}

impl std::fmt::Debug for WishlistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WishlistStore")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}
