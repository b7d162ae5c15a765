//! Refresh stores when the shopper logs in.
//!
//! A sync task watches the session's authenticated flag and fetches its store
//! each time the flag goes from false to true. Logging out does not touch
//! the stores; their persisted contents stay until the next fetch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::Outcome;
use crate::store::{CartStore, WishlistStore};

/// Detects unauthenticated-to-authenticated edges.
///
/// Starts out unauthenticated, so an initial `true` observation counts as a
/// login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthTransition {
    authenticated: bool,
}

impl AuthTransition {
    /// Record the current flag; returns `true` on a login edge.
    pub const fn observe(&mut self, authenticated: bool) -> bool {
        let login = authenticated && !self.authenticated;
        self.authenticated = authenticated;
        login
    }
}

/// A store that can reload itself from the backend.
#[async_trait]
pub trait Refresh: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &'static str;

    /// Reload from the backend.
    async fn refresh(&self) -> Outcome;
}

#[async_trait]
impl Refresh for CartStore {
    fn name(&self) -> &'static str {
        "cart"
    }

    async fn refresh(&self) -> Outcome {
        self.fetch_cart().await
    }
}

#[async_trait]
impl Refresh for WishlistStore {
    fn name(&self) -> &'static str {
        "wishlist"
    }

    async fn refresh(&self) -> Outcome {
        self.fetch_wishlist().await
    }
}

/// Spawn a task that refreshes `store` on every login.
///
/// The task ends when the session's sender is dropped. Flips that happen
/// faster than the task observes them collapse to the latest value.
pub fn spawn_sync<S>(store: Arc<S>, mut auth: watch::Receiver<bool>) -> JoinHandle<()>
where
    S: Refresh + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut edge = AuthTransition::default();
        loop {
            let authenticated = *auth.borrow_and_update();
            if edge.observe(authenticated) {
                info!(store = store.name(), "Session started, refreshing");
                // Failures are already reported by the store.
                let _ = store.refresh().await;
            }
            if auth.changed().await.is_err() {
                debug!(store = store.name(), "Session closed, stopping sync");
                break;
            }
        }
    })
}
