//! Test support: an in-process stock service and a recording notifier.
//!
//! The stock service is a real axum server bound to an ephemeral port, so the
//! `StockClient` under test exercises its actual HTTP path. It records every
//! reservation call it receives, including the decoded request bodies.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use url::Url;

use cart_store::{BlobStore, MemoryStore, Notice, Notify, Product, Stock, StorageError};

/// A reservation call observed by the fake stock service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationCall {
    /// POST /stock/{id}
    Created { id: u64, amount: u32 },
    /// PUT /stock/{id}
    Updated { id: u64, amount: u32 },
    /// DELETE /stock/{id}
    Released { id: u64 },
}

/// Shared state of the fake stock service.
#[derive(Clone, Default)]
pub struct StockService {
    inner: Arc<Mutex<StockServiceInner>>,
}

#[derive(Default)]
struct StockServiceInner {
    products: HashMap<u64, Product>,
    stock: HashMap<u64, u32>,
    calls: Vec<ReservationCall>,
    stock_gets: HashMap<u64, u32>,
    product_gets: HashMap<u64, u32>,
    reject_reservations: bool,
}

impl StockService {
    /// Register a product and its available stock.
    pub fn add_product(&self, product: Product, available: u32) {
        let mut inner = self.inner.lock().expect("lock");
        inner.stock.insert(product.id, available);
        inner.products.insert(product.id, product);
    }

    /// Change the available stock for a product.
    pub fn set_stock(&self, id: u64, available: u32) {
        self.inner.lock().expect("lock").stock.insert(id, available);
    }

    /// Make every reservation call (POST/PUT/DELETE) fail with 503.
    pub fn reject_reservations(&self, reject: bool) {
        self.inner.lock().expect("lock").reject_reservations = reject;
    }

    /// All reservation calls received so far, in order. Rejected calls are
    /// not recorded.
    pub fn reservation_calls(&self) -> Vec<ReservationCall> {
        self.inner.lock().expect("lock").calls.clone()
    }

    /// Number of GET /stock/{id} requests served for `id`.
    pub fn stock_requests(&self, id: u64) -> u32 {
        *self
            .inner
            .lock()
            .expect("lock")
            .stock_gets
            .get(&id)
            .unwrap_or(&0)
    }

    /// Number of GET /products/{id} requests served for `id`.
    pub fn product_requests(&self, id: u64) -> u32 {
        *self
            .inner
            .lock()
            .expect("lock")
            .product_gets
            .get(&id)
            .unwrap_or(&0)
    }
}

#[derive(Debug, Deserialize)]
struct ReservationBody {
    id: u64,
    amount: u32,
}

async fn get_stock(
    State(service): State<StockService>,
    Path(id): Path<u64>,
) -> Result<Json<Stock>, StatusCode> {
    let mut inner = service.inner.lock().expect("lock");
    *inner.stock_gets.entry(id).or_insert(0) += 1;
    inner
        .stock
        .get(&id)
        .map(|&amount| Json(Stock { id, amount }))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_product(
    State(service): State<StockService>,
    Path(id): Path<u64>,
) -> Result<Json<Product>, StatusCode> {
    let mut inner = service.inner.lock().expect("lock");
    *inner.product_gets.entry(id).or_insert(0) += 1;
    inner
        .products
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_reservation(
    State(service): State<StockService>,
    Path(id): Path<u64>,
    Json(body): Json<ReservationBody>,
) -> StatusCode {
    assert_eq!(body.id, id, "reservation body id must match the path id");
    let mut inner = service.inner.lock().expect("lock");
    if inner.reject_reservations {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    inner.calls.push(ReservationCall::Created {
        id,
        amount: body.amount,
    });
    StatusCode::OK
}

async fn update_reservation(
    State(service): State<StockService>,
    Path(id): Path<u64>,
    Json(body): Json<ReservationBody>,
) -> StatusCode {
    assert_eq!(body.id, id, "reservation body id must match the path id");
    let mut inner = service.inner.lock().expect("lock");
    if inner.reject_reservations {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    inner.calls.push(ReservationCall::Updated {
        id,
        amount: body.amount,
    });
    StatusCode::OK
}

async fn delete_reservation(
    State(service): State<StockService>,
    Path(id): Path<u64>,
) -> StatusCode {
    let mut inner = service.inner.lock().expect("lock");
    if inner.reject_reservations {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    inner.calls.push(ReservationCall::Released { id });
    StatusCode::OK
}

/// Spawn the fake stock service on an ephemeral port and return its state
/// handle and base URL.
pub async fn spawn_stock_service() -> (StockService, Url) {
    let service = StockService::default();

    let app = Router::new()
        .route(
            "/stock/{id}",
            get(get_stock)
                .post(create_reservation)
                .put(update_reservation)
                .delete(delete_reservation),
        )
        .route("/products/{id}", get(get_product))
        .with_state(service.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    let base_url = Url::parse(&format!("http://{addr}")).expect("base url");
    (service, base_url)
}

/// Blob store whose writes can be made to fail on demand.
///
/// Reads always pass through to the inner [`MemoryStore`], so a test can
/// inspect what was (or was not) persisted after a rejected write.
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_writes: Arc<AtomicBool>,
}

impl FailingStore {
    /// Make every subsequent `set` fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Handle to the underlying store, for inspecting persisted state.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl BlobStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(io::Error::other("write rejected")));
        }
        self.inner.set(key, value)
    }
}

/// Notifier that records every notice it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("lock").clone()
    }
}

impl Notify for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().expect("lock").push(notice);
    }
}
