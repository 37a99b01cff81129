//! Eden Shop storefront client.
//!
//! Session and cart state for the Eden Shop marketplace, backed by its REST
//! API. The pieces are:
//!
//! - [`api`]: HTTP client with bearer credentials and one-shot token refresh
//! - [`stores`]: the session and cart state containers
//! - [`storage`]: the key/value persistence boundary
//! - [`catalog`]: client-side product filtering and pagination
//!
//! A composition root wires them together:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use edenshop_storefront::api::{ApiClient, CredentialVault, LogRedirect};
//! use edenshop_storefront::config::StorefrontConfig;
//! use edenshop_storefront::storage::{FileStorage, Storage};
//! use edenshop_storefront::stores::{CartStore, SessionStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorefrontConfig::from_env()?;
//! let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.state_dir));
//! let vault = Arc::new(CredentialVault::new(storage.clone()));
//! let api = ApiClient::new(&config, vault, Arc::new(LogRedirect))?;
//!
//! let session = SessionStore::restore(api.clone(), storage.clone()).await;
//! let cart = CartStore::restore(api, storage).await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod storage;
pub mod stores;

pub use error::{Result, StorefrontError};
