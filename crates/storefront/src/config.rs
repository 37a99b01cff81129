//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional:
//! - `EDENSHOP_API_URL` - Backend origin (default: `http://localhost:8080`)
//! - `EDENSHOP_STATE_DIR` - Directory for persisted session/cart state (default: `.edenshop`)
//! - `EDENSHOP_LOGIN_PATH` - Login entry point used on forced logout (default: `/login`)
//! - `EDENSHOP_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_STATE_DIR: &str = ".edenshop";
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend origin; REST routes live under `<api_url>/api`
    pub api_url: Url,
    /// Directory holding the persisted key-value entries
    pub state_dir: PathBuf,
    /// Where the client is sent when the session cannot be recovered
    pub login_path: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = get_or_default(&lookup, "EDENSHOP_API_URL", DEFAULT_API_URL);
        let api_url = parse_api_url(&raw_url)?;

        let state_dir = PathBuf::from(get_or_default(
            &lookup,
            "EDENSHOP_STATE_DIR",
            DEFAULT_STATE_DIR,
        ));
        let login_path = get_or_default(&lookup, "EDENSHOP_LOGIN_PATH", DEFAULT_LOGIN_PATH);

        let timeout_secs = match lookup("EDENSHOP_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("EDENSHOP_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            state_dir,
            login_path,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Configuration pointing at `api_url` with every other value defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_url` is not an absolute http(s) URL.
    pub fn for_api_url(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Root of the REST API (`<api_url>/api`), without a trailing slash.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}/api", self.api_url.as_str().trim_end_matches('/'))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value; blank values count as unset.
fn get_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("EDENSHOP_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "EDENSHOP_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}
