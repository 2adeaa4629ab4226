//! HTTP interface for the ankle sensor hub.
//!
//! ## Endpoints
//!
//! - `POST /api/data` - ingest one raw sample, returns the echoed payload and derived metrics
//! - `GET /api/retrieve` - most recent raw sample

pub mod error;
pub mod handlers;
pub mod serialize;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::database::StoreHandle;

pub use error::{ApiError, ApiResult};

/// Shared state for all handlers. Only the store handle is shared between requests.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: StoreHandle,
}

impl AppState {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/data", post(handlers::receive_data))
        .route("/api/retrieve", get(handlers::retrieve_data))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
