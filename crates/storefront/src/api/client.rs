//! HTTP plumbing shared by every endpoint group.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use shopfront_core::Product;

use super::ApiError;
use crate::config::ApiConfig;
use crate::session::Session;

/// Longest slice of a response body copied into logs and error messages.
const BODY_EXCERPT_LEN: usize = 200;

/// Client for the backend REST API.
///
/// Cheap to clone; clones share the HTTP connection pool, the session and
/// the product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: Session,
    products: Cache<String, Product>,
}

impl ApiClient {
    /// Create a new API client bound to a session.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig, session: Session) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let products = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                session,
                products,
            }),
        })
    }

    /// The session whose tokens this client sends.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub(super) fn product_cache(&self) -> &Cache<String, Product> {
        &self.inner.products
    }

    /// Resolve an endpoint path against the base URL.
    pub(super) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidRequest(format!("{path}: {e}")))
    }

    /// Send one request, optionally with the bearer token.
    pub(super) async fn dispatch(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&Value>,
        authorize: bool,
    ) -> Result<Response, ApiError> {
        let mut request = self.inner.client.request(method.clone(), url.clone());

        if authorize && let Some(token) = self.inner.session.access_token() {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Send an authorized request, refreshing the token once on 401.
    pub(super) async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Response, ApiError> {
        let url = self.endpoint(path)?;
        let response = self.dispatch(&method, &url, body.as_ref(), true).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(path, response).await;
        }

        debug!(%method, path, "Unauthorized, attempting token refresh");
        self.refresh_access_token().await?;

        let retry = self.dispatch(&method, &url, body.as_ref(), true).await?;
        check_status(path, retry).await
    }

    /// Send an authorized request and decode the JSON response.
    pub(super) async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let response = self.send(method, path, body).await?;
        decode_json(path, response).await
    }

    /// Send an authorized request whose response body is ignored.
    pub(super) async fn send_empty(&self, method: Method, path: &str) -> Result<(), ApiError> {
        self.send(method, path, None).await.map(|_| ())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Turn a non-success status into an `ApiError`.
pub(super) async fn check_status(path: &str, response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        status = %status,
        path,
        body = %excerpt(&body),
        "Backend returned non-success status"
    );

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(path.to_string()));
    }

    Err(ApiError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Decode a JSON body, logging an excerpt on failure.
pub(super) async fn decode_json<T: DeserializeOwned>(
    path: &str,
    response: Response,
) -> Result<T, ApiError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            path,
            body = %excerpt(&text),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })
}

/// Pull a readable message out of an error body.
///
/// The backend reports errors as `{"detail": "..."}` or `{"error": "..."}`;
/// field validation errors come back as `{"field": ["msg", ...]}`.
pub(super) fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return excerpt(body);
    };

    for key in ["detail", "error", "message"] {
        if let Some(Value::String(message)) = value.get(key) {
            return message.clone();
        }
    }

    if let Value::Object(fields) = &value {
        let messages: Vec<String> = fields
            .iter()
            .filter_map(|(field, v)| match v {
                Value::Array(list) => list
                    .first()
                    .and_then(Value::as_str)
                    .map(|m| format!("{field}: {m}")),
                _ => None,
            })
            .collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }

    excerpt(body)
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LEN).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn client(base: &str) -> ApiClient {
        let config = ApiConfig::new(base).unwrap();
        ApiClient::new(&config, Session::restore(Arc::new(MemoryStorage::new()))).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("http://localhost:8000/api/v1");
        assert_eq!(
            client.endpoint("cart/cart/my-cart/").unwrap().as_str(),
            "http://localhost:8000/api/v1/cart/cart/my-cart/"
        );
        assert_eq!(
            client.endpoint("/cart/cart/clear/").unwrap().as_str(),
            "http://localhost:8000/api/v1/cart/cart/clear/"
        );
    }

    #[test]
    fn test_error_message_detail() {
        assert_eq!(
            error_message(r#"{"detail": "Authentication credentials were not provided."}"#),
            "Authentication credentials were not provided."
        );
    }

    #[test]
    fn test_error_message_field_errors() {
        assert_eq!(
            error_message(r#"{"quantity": ["Ensure this value is greater than or equal to 1."]}"#),
            "quantity: Ensure this value is greater than or equal to 1."
        );
    }

    #[test]
    fn test_error_message_plain_text_is_truncated() {
        let body = "x".repeat(500);
        assert_eq!(error_message(&body).len(), BODY_EXCERPT_LEN);
    }
}
