//! Authentication session store.
//!
//! Holds the current identity and drives the credential-issuing endpoints.
//! Successful operations overwrite the persisted `auth-storage` entry;
//! `logout` removes it.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, ApiRequest, AuthResponse, LoginRequest, RegisterRequest, User};
use crate::error::StorefrontError;
use crate::storage::{PersistedSession, Storage};

/// Read-only view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Signed-in identity, present only while authenticated.
    pub user: Option<User>,
    /// Whether an authenticated session with a usable credential exists.
    pub is_authenticated: bool,
    /// A login/registration request is in flight.
    pub is_loading: bool,
}

#[derive(Default)]
struct SessionState {
    user: Option<User>,
    is_authenticated: bool,
    is_loading: bool,
}

/// Session state container.
///
/// Owned by the composition root and handed to whoever needs it; clones
/// share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    /// Create an empty, unauthenticated store.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                api,
                storage,
                state: RwLock::new(SessionState::default()),
            }),
        }
    }

    /// Create a store seeded from the persisted `auth-storage` entry.
    ///
    /// An unreadable entry is logged and ignored; the store then starts
    /// unauthenticated.
    pub async fn restore(api: ApiClient, storage: Arc<dyn Storage>) -> Self {
        let store = Self::new(api, storage);

        let persisted = match PersistedSession::load(store.inner.storage.as_ref()) {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable persisted session");
                None
            }
        };

        if let Some(persisted) = persisted {
            if let Some(token) = persisted.access_token() {
                store.inner.api.credentials().restore_access(token).await;
            }
            let mut state = store.inner.state.write().await;
            state.user = persisted.user;
            state.is_authenticated = persisted.is_authenticated;
            debug!(
                is_authenticated = state.is_authenticated,
                "Restored persisted session"
            );
        }

        store
    }

    /// Current session view.
    ///
    /// A session whose credentials were cleared by a failed refresh reports
    /// as unauthenticated.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let has_access = self.inner.api.credentials().has_access().await;
        let state = self.inner.state.read().await;
        let is_authenticated = state.is_authenticated && has_access;

        SessionSnapshot {
            user: if is_authenticated {
                state.user.clone()
            } else {
                None
            },
            is_authenticated,
            is_loading: state.is_loading,
        }
    }

    /// Whether the session is authenticated.
    pub async fn is_authenticated(&self) -> bool {
        self.snapshot().await.is_authenticated
    }

    /// Log in with an email address or phone number.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection (typically `StorefrontError::Unauthorized`
    /// carrying its error payload) or a transport error. State is left as it was.
    #[instrument(skip(self, password), fields(identifier = %identifier))]
    pub async fn login(&self, identifier: &str, password: &str) -> Result<User, StorefrontError> {
        let request = ApiRequest::post("/auth/login")
            .without_refresh()
            .json(&LoginRequest::from_identifier(identifier, password))?;

        let user = self.authenticate(request).await?;
        info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Create an account and log in as it.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Validation` if neither email nor phone is
    /// given or the password is empty; otherwise the same errors as
    /// [`SessionStore::login`].
    #[instrument(skip(self, details), fields(email = ?details.email, phone = ?details.phone))]
    pub async fn register(&self, details: RegisterRequest) -> Result<User, StorefrontError> {
        let has_contact = [&details.email, &details.phone]
            .into_iter()
            .any(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()));
        if !has_contact {
            return Err(StorefrontError::Validation(
                "an email address or phone number is required".to_string(),
            ));
        }
        if details.password.is_empty() {
            return Err(StorefrontError::Validation(
                "password cannot be empty".to_string(),
            ));
        }

        let request = ApiRequest::post("/auth/register")
            .without_refresh()
            .json(&details)?;

        let user = self.authenticate(request).await?;
        info!(user_id = %user.id, "Registered");
        Ok(user)
    }

    /// Clear credentials, identity, and the persisted entry. Idempotent.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.inner.api.credentials().clear().await;

        let mut state = self.inner.state.write().await;
        state.user = None;
        state.is_authenticated = false;
        info!("Logged out");
    }

    /// Re-fetch the current identity.
    ///
    /// Failures are logged and swallowed; authentication state is untouched.
    #[instrument(skip(self))]
    pub async fn refresh_user(&self) {
        match self
            .inner
            .api
            .send_json::<User>(ApiRequest::get("/users/me"))
            .await
        {
            Ok(user) => {
                self.inner.state.write().await.user = Some(user);
                self.persist().await;
            }
            Err(e) => warn!(error = %e, "Failed to refresh user"),
        }
    }

    /// Shared tail of login and registration.
    async fn authenticate(&self, request: ApiRequest) -> Result<User, StorefrontError> {
        self.inner.state.write().await.is_loading = true;

        let response = match self.inner.api.send_json::<AuthResponse>(request).await {
            Ok(response) => response,
            Err(e) => {
                self.inner.state.write().await.is_loading = false;
                return Err(e);
            }
        };

        self.inner
            .api
            .credentials()
            .store(
                SecretString::from(response.token),
                Some(SecretString::from(response.refresh_token)),
            )
            .await;

        {
            let mut state = self.inner.state.write().await;
            state.user = Some(response.user.clone());
            state.is_authenticated = true;
            state.is_loading = false;
        }
        self.persist().await;

        Ok(response.user)
    }

    /// Mirror the persisted subset of the current state.
    async fn persist(&self) {
        let access = self.inner.api.credentials().access_token().await;
        let snapshot = {
            let state = self.inner.state.read().await;
            PersistedSession::capture(state.user.as_ref(), access.as_ref(), state.is_authenticated)
        };

        if let Err(e) = snapshot.save(self.inner.storage.as_ref()) {
            warn!(error = %e, "Failed to persist session");
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
