//! Error taxonomy for cart operations.
//!
//! Every failure a cart operation can hit ends up as a [`CartError`]. The
//! store collapses these at the operation boundary into a user-facing
//! [`Notice`](crate::notify::Notice); callers of the fallible client APIs get
//! the full variant.

use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::StorageError;

/// Errors that can occur while operating on the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// A cart line or remote stock record is missing where one is required.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested quantity exceeds the available stock.
    #[error(
        "Out of stock for product {product_id}: requested {requested}, available {available}"
    )]
    OutOfStock {
        product_id: u64,
        requested: u32,
        available: u32,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The stock service returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Blob store read or write failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration was invalid when building a client.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for [`CartError`].
pub type Result<T> = std::result::Result<T, CartError>;
