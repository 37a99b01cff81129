//! Persisted client state.
//!
//! A small key-value abstraction standing in for browser local storage. Each
//! store owns exactly one key and writes only that key.
//!
//! # Implementations
//!
//! - [`FileStorage`] - one JSON document per key under a state directory
//! - [`MemoryStorage`] - process-local map, used by tests and ephemeral sessions

mod file;
mod memory;
pub mod persisted;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use persisted::{CART_STORAGE_KEY, PersistedCart, PersistedSession, SESSION_STORAGE_KEY};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Errors that can occur when reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value could not be encoded or decoded.
    #[error("Storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key contains characters that cannot be mapped to a storage slot.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// A synchronous string key-value store.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value.
///
/// # Errors
///
/// Returns `StorageError` if the entry cannot be read or is not valid JSON for `T`.
pub fn load_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    storage
        .get(key)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(StorageError::from)
}

/// Encode and write a JSON value.
///
/// # Errors
///
/// Returns `StorageError` if encoding or writing fails.
pub fn save_json<T: Serialize>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}

/// Keys double as file names, so keep them to a portable alphabet.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
