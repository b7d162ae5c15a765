//! Login and token refresh.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::ApiError;
use super::client::{ApiClient, check_status, decode_json};
use crate::session::TokenPair;

const LOGIN_PATH: &str = "accounts/token/";
const REFRESH_PATH: &str = "accounts/token/refresh/";

#[derive(Deserialize)]
struct LoginResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access: Option<String>,
}

impl ApiClient {
    /// Exchange credentials for a token pair and start a session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Api` with the backend's message on bad credentials,
    /// or a transport/parse error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), ApiError> {
        let url = self.endpoint(LOGIN_PATH)?;
        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
        });

        let response = self.dispatch(&Method::POST, &url, Some(&body), false).await?;
        let response = check_status(LOGIN_PATH, response).await?;
        let tokens: LoginResponse = decode_json(LOGIN_PATH, response).await?;

        self.session().set_tokens(TokenPair {
            access: SecretString::from(tokens.access),
            refresh: tokens.refresh.map(SecretString::from),
        });
        info!("Logged in");
        Ok(())
    }

    /// End the session locally. The backend keeps no server-side session.
    pub fn logout(&self) {
        self.session().clear();
        info!("Logged out");
    }

    /// Trade the refresh token for a new access token.
    ///
    /// Any failure ends the session: tokens are cleared, subscribers see the
    /// session go unauthenticated, and the caller gets `SessionExpired`.
    pub(super) async fn refresh_access_token(&self) -> Result<(), ApiError> {
        let Some(refresh) = self.session().refresh_token() else {
            warn!("No refresh token available, ending session");
            self.session().clear();
            return Err(ApiError::SessionExpired);
        };

        match self.request_refresh(&refresh).await {
            Ok(access) => {
                self.session().set_access_token(access);
                info!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.session().clear();
                Err(ApiError::SessionExpired)
            }
        }
    }

    async fn request_refresh(&self, refresh: &SecretString) -> Result<SecretString, ApiError> {
        let url = self.endpoint(REFRESH_PATH)?;
        let body = serde_json::json!({ "refresh": refresh.expose_secret() });

        let response = self.dispatch(&Method::POST, &url, Some(&body), false).await?;
        let response = check_status(REFRESH_PATH, response).await?;
        let data: RefreshResponse = decode_json(REFRESH_PATH, response).await?;

        data.access
            .filter(|a| !a.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| ApiError::InvalidRequest("refresh response has no access token".into()))
    }
}
