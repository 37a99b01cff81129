//! Command implementations and the shared composition root.

pub mod auth;
pub mod cart;
pub mod catalog;

use std::path::PathBuf;
use std::sync::Arc;

use edenshop_storefront::StorefrontError;
use edenshop_storefront::api::{ApiClient, CredentialVault, LoginRedirect};
use edenshop_storefront::config::{ConfigError, StorefrontConfig};
use edenshop_storefront::storage::{FileStorage, Storage};
use edenshop_storefront::stores::{CartStore, SessionStore};
use thiserror::Error;

/// Errors surfaced to the user by a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid product list in {path}: {source}")]
    InvalidCatalog {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Product not found in catalog: {0}")]
    ProductNotFound(String),
}

/// Forced-logout hook for a terminal session: there is no page to navigate
/// to, so tell the user how to sign back in.
struct CliRedirect;

impl LoginRedirect for CliRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        tracing::warn!(login_path, "Session expired; run `eden login` to sign in again");
    }
}

/// Everything a command needs, wired once per invocation.
pub struct App {
    pub session: SessionStore,
    pub cart: CartStore,
}

impl App {
    /// Build the stores from environment configuration and restore persisted state.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if configuration is invalid or the HTTP client
    /// cannot be created.
    pub async fn init() -> Result<Self, CliError> {
        let config = StorefrontConfig::from_env()?;
        Self::with_config(&config).await
    }

    /// Build the stores for an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if the HTTP client cannot be created.
    pub async fn with_config(config: &StorefrontConfig) -> Result<Self, CliError> {
        tracing::debug!(state_dir = %config.state_dir.display(), api = %config.api_url, "Initializing");

        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.state_dir));
        let vault = Arc::new(CredentialVault::new(storage.clone()));
        let api = ApiClient::new(config, vault, Arc::new(CliRedirect))?;

        let session = SessionStore::restore(api.clone(), storage.clone()).await;
        let cart = CartStore::restore(api, storage).await;

        Ok(Self { session, cart })
    }
}
