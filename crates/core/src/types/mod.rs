//! Core types for Eden Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod guest;
pub mod id;
pub mod price;
pub mod status;
pub mod timestamp;

pub use guest::{GuestSessionId, GuestSessionIdError};
pub use id::*;
pub use price::Price;
pub use status::*;
pub use timestamp::{Timestamp, TimestampError};
