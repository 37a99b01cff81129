//! In-memory credential vault shared by the HTTP client and the session store.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::storage::{PersistedSession, Storage};

#[derive(Default)]
struct Tokens {
    access: Option<SecretString>,
    refresh: Option<SecretString>,
}

/// Holds the access and refresh credentials for the current session.
///
/// The vault owns the credential half of the persisted `auth-storage` entry:
/// a refreshed access credential is patched into it, and clearing the vault
/// removes it. The refresh credential lives in memory only.
pub struct CredentialVault {
    tokens: RwLock<Tokens>,
    storage: Arc<dyn Storage>,
}

impl CredentialVault {
    /// Create an empty vault backed by `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            tokens: RwLock::new(Tokens::default()),
            storage,
        }
    }

    /// Current access credential.
    pub async fn access_token(&self) -> Option<SecretString> {
        self.tokens.read().await.access.clone()
    }

    /// Current refresh credential.
    pub async fn refresh_token(&self) -> Option<SecretString> {
        self.tokens.read().await.refresh.clone()
    }

    /// Whether an access credential is present.
    pub async fn has_access(&self) -> bool {
        self.tokens.read().await.access.is_some()
    }

    /// Install a freshly issued credential pair.
    pub async fn store(&self, access: SecretString, refresh: Option<SecretString>) {
        let mut tokens = self.tokens.write().await;
        tokens.access = Some(access);
        tokens.refresh = refresh;
    }

    /// Seed the access credential restored from persisted storage.
    pub async fn restore_access(&self, access: SecretString) {
        self.tokens.write().await.access = Some(access);
    }

    /// Swap in a refreshed access credential and mirror it to persisted storage.
    pub async fn replace_access(&self, access: SecretString) {
        if let Err(e) = PersistedSession::patch_token(self.storage.as_ref(), &access) {
            warn!(error = %e, "Failed to persist refreshed access token");
        }
        self.tokens.write().await.access = Some(access);
        debug!("Access token replaced");
    }

    /// Drop both credentials and the persisted session entry.
    pub async fn clear(&self) {
        {
            let mut tokens = self.tokens.write().await;
            tokens.access = None;
            tokens.refresh = None;
        }
        if let Err(e) = PersistedSession::clear(self.storage.as_ref()) {
            warn!(error = %e, "Failed to clear persisted session");
        }
        debug!("Credentials cleared");
    }
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault").finish_non_exhaustive()
    }
}
