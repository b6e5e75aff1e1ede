//! Cart state management for a storefront UI.
//!
//! The [`CartStore`] holds the authoritative in-memory cart, mirrors it to a
//! persistent [`BlobStore`] on every successful mutation, and validates every
//! quantity change against a remote stock service before applying it.
//!
//! # Architecture
//!
//! - `reqwest`-based [`StockClient`] for the stock/product REST API, with a
//!   `moka` cache on catalog lookups only
//! - [`BlobStore`] trait seam over the persisted medium (JSON file by
//!   default, in-memory for tests)
//! - [`Notify`] trait seam for user-facing failure notices; operations
//!   themselves never return errors
//! - `tokio` watch channel for cart observation, so the UI re-renders on
//!   every change without polling
//!
//! # Example
//!
//! ```rust,ignore
//! use cart_store::{CartConfig, CartStore};
//!
//! let config = CartConfig::from_env()?;
//! let store = CartStore::from_config(&config)?;
//!
//! store.add_product(42).await;
//! for item in store.cart().iter() {
//!     println!("{} x{}", item.title, item.amount);
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod notify;
pub mod stock;
pub mod storage;
pub mod store;
pub mod types;

pub use config::{CartConfig, ConfigError, StockApiConfig};
pub use error::{CartError, Result};
pub use notify::{Notice, Notify, TracingNotifier};
pub use stock::StockClient;
pub use storage::{BlobStore, CART_STORAGE_KEY, JsonFileStore, MemoryStore, StorageError};
pub use store::CartStore;
pub use types::{Cart, CartItem, Product, Stock};
