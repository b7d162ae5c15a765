//! Store error type with Sentry integration.
//!
//! Store operations never propagate remote failures to their callers as
//! `Err`. They record a message in state and hand the underlying
//! [`StoreError`] back inside [`Outcome::Failed`]. [`report`] is the single
//! place such failures are logged and captured.

use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Failure of a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Local persistence failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl StoreError {
    /// Whether the failure means the shopper has to log in again.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::Api(ApiError::SessionExpired))
    }
}

/// Result of a store operation.
#[derive(Debug)]
pub enum Outcome {
    /// The remote call succeeded and local state was updated.
    Applied,
    /// Nothing to do (e.g. product already wishlisted); no request was sent.
    Skipped,
    /// The remote call failed; local items are unchanged.
    Failed(StoreError),
}

impl Outcome {
    /// Whether local state reflects the requested change.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Whether the operation failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The failure, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&StoreError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Log a failed store operation and capture it to Sentry.
///
/// Session expiry is expected user flow, so it is logged as a warning and not
/// captured.
pub fn report(operation: &str, err: &StoreError) {
    if err.is_session_expired() {
        tracing::warn!(operation, "Session expired during store operation");
        return;
    }

    let event_id = sentry::capture_error(err);
    tracing::error!(
        operation,
        error = %err,
        sentry_event_id = %event_id,
        "Store operation failed"
    );
}

/// Add a breadcrumb for a store action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of shopper
/// actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
