//! REST client for the stock and product lookup service.
//!
//! Product lookups are cached with `moka` (5-minute TTL). Stock reads and
//! reservation updates are never cached: stock is remote-authoritative and a
//! stale read would defeat the over-reservation check.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::config::{ConfigError, StockApiConfig};
use crate::error::{CartError, Result};
use crate::types::{Product, Stock};

const PRODUCT_CACHE_CAPACITY: u64 = 1000;
const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// Reservation payload for the stock endpoints.
///
/// The id is always included, for the update path as well as create.
#[derive(Debug, Serialize)]
struct ReservationBody {
    id: u64,
    amount: u32,
}

/// Client for the remote stock and product lookup service.
///
/// Cheaply cloneable; clones share the HTTP connection pool and the product
/// cache.
#[derive(Clone)]
pub struct StockClient {
    inner: Arc<StockClientInner>,
}

struct StockClientInner {
    client: reqwest::Client,
    base_url: Url,
    products: Cache<u64, Product>,
}

impl StockClient {
    /// Create a new stock service client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured token is not a valid header value
    /// or the HTTP client fails to build.
    pub fn new(config: &StockApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("CART_API_TOKEN".to_string(), e.to_string())
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        let products = Cache::builder()
            .max_capacity(PRODUCT_CACHE_CAPACITY)
            .time_to_live(PRODUCT_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(StockClientInner {
                client,
                base_url: config.base_url.clone(),
                products,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{path}",
            self.inner.base_url.as_str().trim_end_matches('/')
        )
    }

    /// Query the current stock level for a product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the service has no stock record for the id, or
    /// an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_stock(&self, product_id: u64) -> Result<Stock> {
        let response = self
            .inner
            .client
            .get(self.endpoint(&format!("stock/{product_id}")))
            .send()
            .await?;
        Self::parse_json(response, || format!("stock record for product {product_id}")).await
    }

    /// Fetch the catalog data for a product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist, or an error if the
    /// request fails.
    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: u64) -> Result<Product> {
        if let Some(product) = self.inner.products.get(&product_id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let response = self
            .inner
            .client
            .get(self.endpoint(&format!("products/{product_id}")))
            .send()
            .await?;
        let product: Product =
            Self::parse_json(response, || format!("product {product_id}")).await?;

        self.inner.products.insert(product_id, product.clone()).await;

        Ok(product)
    }

    /// Register a new reservation for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the reservation or the request
    /// fails.
    #[instrument(skip(self))]
    pub async fn reserve(&self, product_id: u64, amount: u32) -> Result<()> {
        let response = self
            .inner
            .client
            .post(self.endpoint(&format!("stock/{product_id}")))
            .json(&ReservationBody {
                id: product_id,
                amount,
            })
            .send()
            .await?;
        Self::check_status(response, || format!("stock record for product {product_id}")).await
    }

    /// Replace the reserved amount for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the update or the request
    /// fails.
    #[instrument(skip(self))]
    pub async fn set_reservation(&self, product_id: u64, amount: u32) -> Result<()> {
        let response = self
            .inner
            .client
            .put(self.endpoint(&format!("stock/{product_id}")))
            .json(&ReservationBody {
                id: product_id,
                amount,
            })
            .send()
            .await?;
        Self::check_status(response, || format!("stock record for product {product_id}")).await
    }

    /// Release the reservation for a product entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the release or the request
    /// fails.
    #[instrument(skip(self))]
    pub async fn release(&self, product_id: u64) -> Result<()> {
        let response = self
            .inner
            .client
            .delete(self.endpoint(&format!("stock/{product_id}")))
            .send()
            .await?;
        Self::check_status(response, || format!("stock record for product {product_id}")).await
    }

    /// Drop all cached product data.
    pub fn invalidate_products(&self) {
        self.inner.products.invalidate_all();
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        missing: impl FnOnce() -> String,
    ) -> Result<T> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CartError::NotFound(missing()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CartError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn check_status(
        response: reqwest::Response,
        missing: impl FnOnce() -> String,
    ) -> Result<()> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CartError::NotFound(missing()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CartError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
