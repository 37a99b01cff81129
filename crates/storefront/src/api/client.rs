//! Shared HTTP pipeline for the Eden Shop REST API.
//!
//! Attaches the current access credential to every request and implements
//! the one-shot refresh protocol on `401 Unauthorized`:
//!
//! 1. No refresh credential stored: redirect to login, propagate the rejection.
//! 2. Refresh credential stored: call `POST /auth/refresh` once.
//!    - success: store the new access credential, replay the original request once
//!    - failure: clear all credentials, redirect to login, propagate the rejection
//!
//! Concurrent requests that fail with 401 at the same time each run their own
//! refresh; there is no single-flight coalescing.

use std::sync::Arc;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::credentials::CredentialVault;
use super::request::ApiRequest;
use super::types::{ApiErrorBody, RefreshRequest, RefreshResponse};
use crate::config::StorefrontConfig;
use crate::error::StorefrontError;

/// Hook invoked when the session cannot be recovered and the user must log in again.
pub trait LoginRedirect: Send + Sync {
    /// Send the client to `login_path`.
    fn redirect_to_login(&self, login_path: &str);
}

/// Default redirect hook: records the forced logout in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        warn!(login_path, "Session expired; login required");
    }
}

/// Client for the Eden Shop REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and the credential vault.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    api_root: String,
    login_path: String,
    credentials: Arc<CredentialVault>,
    redirect: Arc<dyn LoginRedirect>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Http` if the HTTP client cannot be built.
    pub fn new(
        config: &StorefrontConfig,
        credentials: Arc<CredentialVault>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Result<Self, StorefrontError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                api_root: config.api_root(),
                login_path: config.login_path.clone(),
                credentials,
                redirect,
            }),
        })
    }

    /// The credential vault this client reads from.
    #[must_use]
    pub fn credentials(&self) -> &Arc<CredentialVault> {
        &self.inner.credentials
    }

    /// Root of the REST API (`<base>/api`).
    #[must_use]
    pub fn api_root(&self) -> &str {
        &self.inner.api_root
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Send a request and decode its JSON response.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Http` on transport failure,
    /// `StorefrontError::Unauthorized` when the refresh protocol cannot recover,
    /// `StorefrontError::Api` for any other non-success status, and
    /// `StorefrontError::Parse` if the body does not match `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, StorefrontError> {
        let response = self.send(&request).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %request.path,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            StorefrontError::Parse(e)
        })
    }

    /// Send a request whose response body is irrelevant.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::send_json`], minus decoding.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), StorefrontError> {
        self.send(&request).await.map(drop)
    }

    /// Run the attach / dispatch / refresh-once state machine.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: &ApiRequest) -> Result<reqwest::Response, StorefrontError> {
        let access = self.inner.credentials.access_token().await;
        let response = self.dispatch(request, access.as_ref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || !request.refresh_on_unauthorized {
            return check_status(response).await;
        }

        let rejection = error_body(response).await;

        let Some(refresh_token) = self.inner.credentials.refresh_token().await else {
            debug!("401 with no refresh token");
            self.redirect_to_login();
            return Err(StorefrontError::Unauthorized(rejection));
        };

        match self.refresh_access_token(&refresh_token).await {
            Ok(new_access) => {
                self.inner
                    .credentials
                    .replace_access(new_access.clone())
                    .await;
                debug!("Access token refreshed; replaying request");
                let replay = self.dispatch(request, Some(&new_access)).await?;
                check_status(replay).await
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.inner.credentials.clear().await;
                self.redirect_to_login();
                Err(StorefrontError::Unauthorized(rejection))
            }
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access: Option<&SecretString>,
    ) -> Result<reqwest::Response, StorefrontError> {
        let mut builder = self
            .inner
            .client
            .request(request.method.clone(), request.url(&self.inner.api_root));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = access {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    /// Exchange the refresh credential for a new access credential.
    async fn refresh_access_token(
        &self,
        refresh_token: &SecretString,
    ) -> Result<SecretString, StorefrontError> {
        let request = ApiRequest::post("/auth/refresh")
            .without_refresh()
            .json(&RefreshRequest {
                refresh_token: refresh_token.expose_secret(),
            })?;

        let response = self.dispatch(&request, None).await?;
        let response = check_status(response).await?;
        let refreshed: RefreshResponse = response.json().await?;

        Ok(SecretString::from(refreshed.token))
    }

    fn redirect_to_login(&self) {
        self.inner
            .redirect
            .redirect_to_login(&self.inner.login_path);
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_root", &self.inner.api_root)
            .field("login_path", &self.inner.login_path)
            .finish_non_exhaustive()
    }
}

/// Pass successes through; map failures to typed errors with the body verbatim.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StorefrontError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = error_body(response).await;
    if status == StatusCode::UNAUTHORIZED {
        Err(StorefrontError::Unauthorized(body))
    } else {
        debug!(status = %status, message = %body.message, "API returned non-success status");
        Err(StorefrontError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

async fn error_body(response: reqwest::Response) -> ApiErrorBody {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    ApiErrorBody::from_response_text(status, &text)
}
