//! Eden Shop REST API access.
//!
//! # Architecture
//!
//! - One shared [`ApiClient`] per process, built by the composition root
//! - The backend is the source of truth: responses replace local state, never merge into it
//! - Credentials live in a [`CredentialVault`] shared with the session store
//!
//! # Endpoints
//!
//! | Method | Path | Used by |
//! |--------|------|---------|
//! | `POST` | `/auth/login` | session store |
//! | `POST` | `/auth/register` | session store |
//! | `POST` | `/auth/refresh` | client refresh protocol |
//! | `GET` | `/users/me` | session store |
//! | `GET` | `/cart` | cart store |
//! | `POST` | `/cart/items` | cart store |
//! | `PUT` | `/cart/items/{id}` | cart store |
//! | `DELETE` | `/cart/items/{id}` | cart store |
//! | `DELETE` | `/cart` | cart store |

mod client;
mod credentials;
mod request;
pub mod types;

pub use client::{ApiClient, LogRedirect, LoginRedirect};
pub use credentials::CredentialVault;
pub use request::ApiRequest;
pub use types::*;
