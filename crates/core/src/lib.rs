//! Eden Shop Core - Shared types library.
//!
//! This crate provides common types used across all Eden Shop components:
//! - `storefront` - Session, cart, and catalog client for the commerce backend
//! - `cli` - Command-line front end wiring the storefront stores together
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients,
//! no persisted state. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, timestamps, statuses, and guest sessions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
