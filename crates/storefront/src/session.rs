//! Authenticated session: the bearer token pair and the authenticated flag.
//!
//! Tokens are persisted under [`AUTH_STORAGE_KEY`] so a restart keeps the
//! shopper logged in. Every change to the authenticated flag is published on
//! a `tokio::sync::watch` channel, which the store sync hooks observe.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::storage::{AUTH_STORAGE_KEY, LocalStorage, load_snapshot, save_snapshot};

/// Access and refresh tokens.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct TokenPair {
    /// Short-lived bearer token sent on every request
    pub access: SecretString,
    /// Long-lived token exchanged for a new access token on 401
    pub refresh: Option<SecretString>,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"[REDACTED]")
            .field("refresh", &self.refresh.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// On-disk form of the token pair.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTokens {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

/// Shared, cheaply cloneable session handle.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    tokens: RwLock<Option<TokenPair>>,
    storage: Arc<dyn LocalStorage>,
    authenticated: watch::Sender<bool>,
}

impl Session {
    /// Restore a session from storage.
    ///
    /// A missing or unreadable token snapshot yields a logged-out session.
    #[must_use]
    pub fn restore(storage: Arc<dyn LocalStorage>) -> Self {
        let tokens = match load_snapshot::<PersistedTokens>(storage.as_ref(), AUTH_STORAGE_KEY) {
            Ok(Some(saved)) => Some(TokenPair {
                access: SecretString::from(saved.access_token),
                refresh: saved.refresh_token.map(SecretString::from),
            }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable session snapshot");
                None
            }
        };

        let (authenticated, _) = watch::channel(tokens.is_some());

        Self {
            inner: Arc::new(SessionInner {
                tokens: RwLock::new(tokens),
                storage,
                authenticated,
            }),
        }
    }

    /// Whether an access token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        *self.inner.authenticated.borrow()
    }

    /// Subscribe to authenticated-flag changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.authenticated.subscribe()
    }

    /// Current access token, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.read_tokens(|t| t.access.clone())
    }

    /// Current refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.read_tokens(|t| t.refresh.clone()).flatten()
    }

    /// Store a fresh token pair (after login) and mark the session authenticated.
    pub fn set_tokens(&self, tokens: TokenPair) {
        self.write_tokens(Some(tokens));
        self.publish(true);
    }

    /// Replace only the access token (after a refresh).
    pub fn set_access_token(&self, access: SecretString) {
        let refresh = self.refresh_token();
        self.write_tokens(Some(TokenPair { access, refresh }));
        self.publish(true);
    }

    /// Drop all tokens and mark the session unauthenticated.
    pub fn clear(&self) {
        self.write_tokens(None);
        self.publish(false);
    }

    fn read_tokens<T>(&self, f: impl FnOnce(&TokenPair) -> T) -> Option<T> {
        let tokens = self
            .inner
            .tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        tokens.as_ref().map(f)
    }

    fn write_tokens(&self, tokens: Option<TokenPair>) {
        let persisted = tokens.as_ref().map(|t| PersistedTokens {
            access_token: t.access.expose_secret().to_string(),
            refresh_token: t.refresh.as_ref().map(|r| r.expose_secret().to_string()),
        });

        *self
            .inner
            .tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner) = tokens;

        let storage = self.inner.storage.as_ref();
        let result = match persisted {
            Some(p) => save_snapshot(storage, AUTH_STORAGE_KEY, &p),
            None => storage.remove_item(AUTH_STORAGE_KEY),
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "Failed to persist session tokens");
        }
    }

    fn publish(&self, authenticated: bool) {
        self.inner.authenticated.send_if_modified(|current| {
            if *current == authenticated {
                false
            } else {
                *current = authenticated;
                true
            }
        });
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn pair(access: &str, refresh: Option<&str>) -> TokenPair {
        TokenPair {
            access: SecretString::from(access.to_string()),
            refresh: refresh.map(|r| SecretString::from(r.to_string())),
        }
    }

    #[test]
    fn test_new_session_is_logged_out() {
        let session = Session::restore(Arc::new(MemoryStorage::new()));
        assert!(!session.is_authenticated());
        assert!(session.access_token().is_none());
    }

    #[test]
    fn test_tokens_survive_restore() {
        let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::new());
        Session::restore(Arc::clone(&storage)).set_tokens(pair("acc-1", Some("ref-1")));

        let restored = Session::restore(storage);
        assert!(restored.is_authenticated());
        assert_eq!(restored.access_token().unwrap().expose_secret(), "acc-1");
        assert_eq!(restored.refresh_token().unwrap().expose_secret(), "ref-1");
    }

    #[test]
    fn test_set_access_token_keeps_refresh() {
        let session = Session::restore(Arc::new(MemoryStorage::new()));
        session.set_tokens(pair("old", Some("ref")));
        session.set_access_token(SecretString::from("new".to_string()));
        assert_eq!(session.access_token().unwrap().expose_secret(), "new");
        assert_eq!(session.refresh_token().unwrap().expose_secret(), "ref");
    }

    #[test]
    fn test_clear_removes_persisted_tokens() {
        let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::new());
        let session = Session::restore(Arc::clone(&storage));
        session.set_tokens(pair("acc", None));
        session.clear();
        assert!(!session.is_authenticated());
        assert!(storage.get_item(AUTH_STORAGE_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let session = Session::restore(Arc::new(MemoryStorage::new()));
        let mut rx = session.subscribe();
        assert!(!*rx.borrow_and_update());

        session.set_tokens(pair("acc", None));
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());

        // Re-publishing the same value is not a change.
        session.set_access_token(SecretString::from("acc-2".to_string()));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug_output = format!("{:?}", pair("super_secret_access", Some("super_secret_refresh")));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_access"));
        assert!(!debug_output.contains("super_secret_refresh"));
    }
}
