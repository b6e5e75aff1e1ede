//! The cart store: authoritative in-memory cart plus its persisted mirror.
//!
//! All three mutation operations follow the same shape: take the writer lock,
//! check stock, compute the full new cart, persist it, commit it in memory,
//! then inform the stock service of the new reservation. Failures never reach
//! the caller; they collapse into a [`Notice`] handed to the wired-in
//! notifier.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{instrument, warn};

use crate::config::CartConfig;
use crate::error::{CartError, Result};
use crate::notify::{Notice, Notify, TracingNotifier};
use crate::stock::StockClient;
use crate::storage::{BlobStore, CART_STORAGE_KEY, JsonFileStore, StorageError};
use crate::types::{Cart, CartItem};

/// Holds the authoritative cart and mediates with the stock service to
/// prevent over-reservation.
///
/// Cheaply cloneable; clones share the same cart. Reads ([`cart`](Self::cart),
/// [`subscribe`](Self::subscribe)) go through a watch channel and never block
/// on a mutation in flight.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    stock: StockClient,
    storage: Box<dyn BlobStore>,
    notifier: Arc<dyn Notify>,
    // Writer lock, held across the network calls of a mutation so overlapping
    // UI triggers serialize instead of racing on a shared snapshot.
    cart: Mutex<Cart>,
    watch_tx: watch::Sender<Cart>,
}

impl CartStore {
    /// Create a cart store from its collaborators, loading any persisted cart
    /// from the blob store.
    ///
    /// An unreadable persisted cart is logged and discarded; the store starts
    /// empty rather than failing construction.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob store medium itself cannot be read.
    pub fn new(
        stock: StockClient,
        storage: Box<dyn BlobStore>,
        notifier: Arc<dyn Notify>,
    ) -> Result<Self> {
        let cart = load_cart(storage.as_ref())?;
        let (watch_tx, _) = watch::channel(cart.clone());

        Ok(Self {
            inner: Arc::new(CartStoreInner {
                stock,
                storage,
                notifier,
                cart: Mutex::new(cart),
                watch_tx,
            }),
        })
    }

    /// Create a cart store from configuration, wiring in a [`JsonFileStore`]
    /// and the default [`TracingNotifier`].
    ///
    /// # Errors
    ///
    /// Returns an error if the stock client cannot be built or the storage
    /// file cannot be read.
    pub fn from_config(config: &CartConfig) -> Result<Self> {
        let stock = StockClient::new(&config.api)?;
        Self::new(
            stock,
            Box::new(JsonFileStore::new(&config.storage_path)),
            Arc::new(TracingNotifier),
        )
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.watch_tx.borrow().clone()
    }

    /// Subscribe to cart changes. The receiver yields the full cart value
    /// after every successful mutation; UI layers use this to re-render.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.inner.watch_tx.subscribe()
    }

    /// Add one unit of `product_id` to the cart.
    ///
    /// A product not yet in the cart is fetched from the catalog and added
    /// with quantity 1; an existing line is incremented. Either way the new
    /// quantity is validated against current stock first. Failures surface as
    /// a notice, not a return value.
    #[instrument(skip(self))]
    pub async fn add_product(&self, product_id: u64) {
        if let Err(error) = self.try_add_product(product_id).await {
            self.report(&error, Notice::AddFailed);
        }
    }

    /// Remove the line for `product_id` from the cart and release its
    /// reservation. Failures surface as a notice.
    #[instrument(skip(self))]
    pub async fn remove_product(&self, product_id: u64) {
        if let Err(error) = self.try_remove_product(product_id).await {
            self.report(&error, Notice::RemoveFailed);
        }
    }

    /// Set the quantity for `product_id` to exactly `amount`.
    ///
    /// A zero or negative amount is a silent no-op; quantity changes never
    /// delete a line. Failures surface as a notice.
    #[instrument(skip(self))]
    pub async fn update_product_amount(&self, product_id: u64, amount: i64) {
        if amount <= 0 {
            return;
        }
        // Anything past u32::MAX cannot be in stock and fails the same way.
        let amount = u32::try_from(amount).unwrap_or(u32::MAX);

        if let Err(error) = self.try_update_amount(product_id, amount).await {
            self.report(&error, Notice::UpdateFailed);
        }
    }

    async fn try_add_product(&self, product_id: u64) -> Result<()> {
        let mut cart = self.inner.cart.lock().await;
        let stock = self.inner.stock.get_stock(product_id).await?;

        if let Some(existing) = cart.get(product_id) {
            // A persisted cart can legitimately carry u32::MAX; never wrap.
            let requested = existing.amount.checked_add(1).ok_or(CartError::OutOfStock {
                product_id,
                requested: u32::MAX,
                available: stock.amount,
            })?;
            if stock.amount < requested {
                return Err(CartError::OutOfStock {
                    product_id,
                    requested,
                    available: stock.amount,
                });
            }

            let mut next = cart.clone();
            next.set_amount(product_id, requested);
            self.commit(&mut cart, next)?;
            self.inner.stock.set_reservation(product_id, requested).await?;
        } else {
            if stock.amount < 1 {
                return Err(CartError::OutOfStock {
                    product_id,
                    requested: 1,
                    available: stock.amount,
                });
            }

            let product = self.inner.stock.get_product(product_id).await?;

            let mut next = cart.clone();
            next.push(CartItem::new(product, 1));
            self.commit(&mut cart, next)?;
            self.inner.stock.reserve(product_id, 1).await?;
        }

        Ok(())
    }

    async fn try_remove_product(&self, product_id: u64) -> Result<()> {
        let mut cart = self.inner.cart.lock().await;

        if cart.get(product_id).is_none() {
            return Err(CartError::NotFound(format!(
                "product {product_id} is not in the cart"
            )));
        }

        let mut next = cart.clone();
        next.remove(product_id);
        self.commit(&mut cart, next)?;
        self.inner.stock.release(product_id).await?;

        Ok(())
    }

    async fn try_update_amount(&self, product_id: u64, amount: u32) -> Result<()> {
        let mut cart = self.inner.cart.lock().await;
        let stock = self.inner.stock.get_stock(product_id).await?;

        if stock.amount < amount {
            return Err(CartError::OutOfStock {
                product_id,
                requested: amount,
                available: stock.amount,
            });
        }

        let mut next = cart.clone();
        next.set_amount(product_id, amount);
        self.commit(&mut cart, next)?;
        self.inner.stock.set_reservation(product_id, amount).await?;

        Ok(())
    }

    /// Persist the fully-computed new cart, then swap it in as the in-memory
    /// value and publish it to subscribers. A persistence failure leaves the
    /// in-memory cart untouched, so there is never a partially-applied state.
    fn commit(&self, guard: &mut MutexGuard<'_, Cart>, next: Cart) -> Result<()> {
        let serialized = serde_json::to_string(&next)?;
        self.inner.storage.set(CART_STORAGE_KEY, &serialized)?;

        **guard = next.clone();
        self.inner.watch_tx.send_replace(next);
        Ok(())
    }

    fn report(&self, error: &CartError, fallback: Notice) {
        let notice = match error {
            CartError::OutOfStock { .. } => Notice::OutOfStock,
            _ => fallback,
        };
        warn!(error = %error, "Cart operation failed");
        self.inner.notifier.notify(notice);
    }
}

/// Read the persisted cart, treating unreadable content as absent.
fn load_cart(storage: &dyn BlobStore) -> Result<Cart> {
    let raw = match storage.get(CART_STORAGE_KEY) {
        Ok(raw) => raw,
        Err(StorageError::Serialize(e)) => {
            warn!(error = %e, "Persisted blob store is unreadable, starting with an empty cart");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let Some(raw) = raw else {
        return Ok(Cart::new());
    };

    match serde_json::from_str(&raw) {
        Ok(cart) => Ok(cart),
        Err(e) => {
            warn!(error = %e, "Persisted cart is unreadable, starting with an empty cart");
            Ok(Cart::new())
        }
    }
}
