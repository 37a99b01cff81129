//! Unified error handling for the storefront client.
//!
//! Every store operation returns `Result<T, StorefrontError>`. Failures are
//! scoped to the triggering action; nothing here is fatal to the process.

use thiserror::Error;

use crate::api::types::ApiErrorBody;
use crate::storage::StorageError;

/// Error type for storefront operations.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Network or transport failure. Surfaced to the caller, never retried.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the credentials and the refresh protocol could not recover.
    #[error("Unauthorized: {0}")]
    Unauthorized(ApiErrorBody),

    /// Any other 4xx/5xx response, with the backend's payload verbatim.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Decoded error payload.
        body: ApiErrorBody,
    },

    /// Response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Persisted state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input rejected locally before any request was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested quantity exceeds the product's stock.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Quantity asked for.
        requested: u32,
        /// Units in stock.
        available: u32,
    },
}

impl StorefrontError {
    /// HTTP status of a backend rejection, if this error is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(body) => Some(if body.status == 0 { 401 } else { body.status }),
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The backend's error payload, if this error carries one.
    #[must_use]
    pub const fn api_body(&self) -> Option<&ApiErrorBody> {
        match self {
            Self::Unauthorized(body) | Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;
