//! Anonymous cart session identifier.

use core::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

const PREFIX: &str = "guest_";
const SUFFIX_LEN: usize = 9;

/// Errors that can occur when parsing a [`GuestSessionId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GuestSessionIdError {
    /// The value does not start with `guest_`.
    #[error("guest session id must start with `guest_`")]
    MissingPrefix,
    /// Nothing follows the prefix.
    #[error("guest session id has no body after the prefix")]
    Empty,
}

/// Client-generated identifier scoping a cart for an unauthenticated visitor.
///
/// Generated once, lazily, on the first cart operation and then persisted;
/// the backend treats it as an opaque key.
///
/// Format: `guest_<unix-millis>_<9 lowercase base36 chars>`.
///
/// ```
/// use edenshop_core::GuestSessionId;
///
/// let id = GuestSessionId::generate();
/// assert!(id.as_str().starts_with("guest_"));
/// assert_eq!(GuestSessionId::parse(id.as_str()).unwrap(), id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GuestSessionId(String);

impl GuestSessionId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let mut rng = rand::rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| char::from_digit(rng.random_range(0..36), 36).unwrap_or('0'))
            .collect();
        Self(format!("{PREFIX}{millis}_{suffix}"))
    }

    /// Parse a previously generated identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the value lacks the `guest_` prefix or has nothing after it.
    pub fn parse(s: &str) -> Result<Self, GuestSessionIdError> {
        let body = s
            .strip_prefix(PREFIX)
            .ok_or(GuestSessionIdError::MissingPrefix)?;
        if body.is_empty() {
            return Err(GuestSessionIdError::Empty);
        }
        Ok(Self(s.to_string()))
    }

    /// The identifier as sent to the backend.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GuestSessionId {
    type Error = GuestSessionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GuestSessionId> for String {
    fn from(id: GuestSessionId) -> Self {
        id.0
    }
}

impl fmt::Display for GuestSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
