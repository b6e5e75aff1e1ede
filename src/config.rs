//! Cart store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_BASE_URL` - Base URL of the stock/product service
//!
//! ## Optional
//! - `CART_API_TOKEN` - Bearer token for the stock/product service
//! - `CART_STORAGE_PATH` - Blob store file path (default: cart-store.json)
//! - `CART_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 10)

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_PATH: &str = "cart-store.json";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Stock/product service configuration
    pub api: StockApiConfig,
    /// Path of the JSON file backing the blob store
    pub storage_path: PathBuf,
}

/// Stock/product service configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct StockApiConfig {
    /// Base URL of the stock/product service
    pub base_url: Url,
    /// Bearer token, if the service requires one
    pub api_token: Option<SecretString>,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl StockApiConfig {
    /// Configuration for an unauthenticated service with default timeouts.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("CART_API_BASE_URL")?;
        let base_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CART_API_BASE_URL".to_string(), e.to_string())
        })?;
        let api_token = get_optional_env("CART_API_TOKEN").map(SecretString::from);
        let timeout_secs = get_env_or_default(
            "CART_REQUEST_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("CART_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            base_url,
            api_token,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl std::fmt::Debug for StockApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = StockApiConfig::from_env()?;
        let storage_path = get_env_or_default("CART_STORAGE_PATH", DEFAULT_STORAGE_PATH).into();

        Ok(Self { api, storage_path })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
