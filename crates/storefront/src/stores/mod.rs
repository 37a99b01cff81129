//! Application state containers.
//!
//! Both stores wrap the shared [`ApiClient`](crate::api::ApiClient) and a
//! [`Storage`](crate::storage::Storage) backend. They are created once by the
//! composition root and cloned into whoever needs them.

mod cart;
mod session;

pub use cart::{CartScope, CartSnapshot, CartStore};
pub use session::{SessionSnapshot, SessionStore};
