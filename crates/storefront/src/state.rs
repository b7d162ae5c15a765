//! Client state shared across commands and background tasks.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::notify::{Notifier, TracingNotifier};
use crate::session::Session;
use crate::storage::{FileStorage, LocalStorage, StorageError};
use crate::store::{CartStore, WishlistStore};
use crate::sync::spawn_sync;

/// Error assembling the client state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("api client error: {0}")]
    Api(#[from] ApiError),
}

/// Everything a storefront client needs, wired together.
///
/// Cheaply cloneable via `Arc`. The stores and the session share one
/// [`LocalStorage`], and both stores talk to the same [`ApiClient`].
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    session: Session,
    api: ApiClient,
    cart: Arc<CartStore>,
    wishlist: Arc<WishlistStore>,
}

impl AppState {
    /// Open file-backed state under `config.data_dir`, logging notices.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the HTTP
    /// client cannot be built.
    pub fn open(config: StorefrontConfig) -> Result<Self, StateError> {
        let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::open(config.data_dir.clone())?);
        Self::new(config, storage, Arc::new(TracingNotifier))
    }

    /// Assemble state over the given storage and notice sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: StorefrontConfig,
        storage: Arc<dyn LocalStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, StateError> {
        let session = Session::restore(Arc::clone(&storage));
        let api = ApiClient::new(&config.api, session.clone())?;
        let backend = Arc::new(api.clone());

        let cart = Arc::new(CartStore::new(
            backend.clone(),
            Arc::clone(&storage),
            Arc::clone(&notifier),
        ));
        let wishlist = Arc::new(WishlistStore::new(backend, storage, notifier));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                session,
                api,
                cart,
                wishlist,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// The backend client, for login and product lookups.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn cart(&self) -> &Arc<CartStore> {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &Arc<WishlistStore> {
        &self.inner.wishlist
    }

    /// Start login-triggered refresh for both stores.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn start_sync(&self) -> [JoinHandle<()>; 2] {
        [
            spawn_sync(Arc::clone(&self.inner.cart), self.inner.session.subscribe()),
            spawn_sync(
                Arc::clone(&self.inner.wishlist),
                self.inner.session.subscribe(),
            ),
        ]
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api_url", &self.inner.config.api.base_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}
