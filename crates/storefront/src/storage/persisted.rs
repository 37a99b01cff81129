//! Serialization boundary between in-memory store state and persisted entries.
//!
//! Two independent entries exist:
//! - `auth-storage` - identity, access credential, authenticated flag
//! - `cart-storage` - the anonymous cart session id
//!
//! The refresh credential and the cart contents are never written.

use edenshop_core::GuestSessionId;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{Storage, StorageError, load_json, save_json};
use crate::api::types::User;

/// Key of the persisted session entry.
pub const SESSION_STORAGE_KEY: &str = "auth-storage";

/// Key of the persisted cart entry.
pub const CART_STORAGE_KEY: &str = "cart-storage";

/// Persisted subset of the session.
///
/// Implements `Debug` manually to redact the access credential.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    /// Last known identity.
    pub user: Option<User>,
    /// Access credential.
    pub token: Option<String>,
    /// Whether the session was authenticated when written.
    pub is_authenticated: bool,
}

impl std::fmt::Debug for PersistedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSession")
            .field("user", &self.user.as_ref().map(|u| &u.id))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("is_authenticated", &self.is_authenticated)
            .finish()
    }
}

impl PersistedSession {
    /// Map live session state to its persisted subset.
    #[must_use]
    pub fn capture(
        user: Option<&User>,
        access_token: Option<&SecretString>,
        is_authenticated: bool,
    ) -> Self {
        Self {
            user: user.cloned(),
            token: access_token.map(|t| t.expose_secret().to_string()),
            is_authenticated,
        }
    }

    /// The stored access credential.
    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.token.clone().map(SecretString::from)
    }

    /// Read the persisted session entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be read or decoded.
    pub fn load(storage: &dyn Storage) -> Result<Option<Self>, StorageError> {
        load_json(storage, SESSION_STORAGE_KEY)
    }

    /// Overwrite the persisted session entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be written.
    pub fn save(&self, storage: &dyn Storage) -> Result<(), StorageError> {
        save_json(storage, SESSION_STORAGE_KEY, self)
    }

    /// Delete the persisted session entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be removed.
    pub fn clear(storage: &dyn Storage) -> Result<(), StorageError> {
        storage.remove(SESSION_STORAGE_KEY)
    }

    /// Replace only the access credential of an existing entry.
    ///
    /// Does nothing when no session has been persisted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be read or rewritten.
    pub fn patch_token(storage: &dyn Storage, token: &SecretString) -> Result<(), StorageError> {
        if let Some(mut session) = Self::load(storage)? {
            session.token = Some(token.expose_secret().to_string());
            session.save(storage)?;
        }
        Ok(())
    }
}

/// Persisted subset of the cart: only the guest session id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCart {
    /// Anonymous session id, once generated.
    pub session_id: Option<GuestSessionId>,
}

impl PersistedCart {
    /// Read the persisted cart entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be read or decoded.
    pub fn load(storage: &dyn Storage) -> Result<Option<Self>, StorageError> {
        load_json(storage, CART_STORAGE_KEY)
    }

    /// Overwrite the persisted cart entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be written.
    pub fn save(&self, storage: &dyn Storage) -> Result<(), StorageError> {
        save_json(storage, CART_STORAGE_KEY, self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::types::test_fixtures::user;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_session_capture_and_restore() {
        let storage = MemoryStorage::new();
        let u = user("u-1", "ana@example.com");
        let token = SecretString::from("access-1");

        PersistedSession::capture(Some(&u), Some(&token), true)
            .save(&storage)
            .unwrap();

        let loaded = PersistedSession::load(&storage).unwrap().unwrap();
        assert!(loaded.is_authenticated);
        assert_eq!(loaded.user.as_ref().unwrap().id, u.id);
        assert_eq!(loaded.access_token().unwrap().expose_secret(), "access-1");
    }

    #[test]
    fn test_session_wire_format_uses_camel_case() {
        let storage = MemoryStorage::new();
        PersistedSession::capture(None, None, false)
            .save(&storage)
            .unwrap();
        let raw = storage.get(SESSION_STORAGE_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"{"user":null,"token":null,"isAuthenticated":false}"#);
    }

    #[test]
    fn test_patch_token_only_touches_existing_entry() {
        let storage = MemoryStorage::new();
        PersistedSession::patch_token(&storage, &SecretString::from("new")).unwrap();
        assert!(PersistedSession::load(&storage).unwrap().is_none());

        PersistedSession::capture(None, Some(&SecretString::from("old")), true)
            .save(&storage)
            .unwrap();
        PersistedSession::patch_token(&storage, &SecretString::from("new")).unwrap();

        let loaded = PersistedSession::load(&storage).unwrap().unwrap();
        assert_eq!(loaded.token.as_deref(), Some("new"));
        assert!(loaded.is_authenticated);
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = PersistedSession::capture(None, Some(&SecretString::from("hunter2")), true);
        let debug = format!("{session:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_cart_entry_holds_only_session_id() {
        let storage = MemoryStorage::new();
        let id = GuestSessionId::parse("guest_1700000000000_abc123xyz").unwrap();
        PersistedCart {
            session_id: Some(id.clone()),
        }
        .save(&storage)
        .unwrap();

        let raw = storage.get(CART_STORAGE_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"{"sessionId":"guest_1700000000000_abc123xyz"}"#);
        assert_eq!(
            PersistedCart::load(&storage).unwrap().unwrap().session_id,
            Some(id)
        );
    }
}
