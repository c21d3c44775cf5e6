//! # Catalog API
//!
//! HTTP surface of the catalog service.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET    /                       version                                │
//! │  GET    /health                 database + token refresher state       │
//! │  GET    /product/{id}/offers    reconcile with partner, list in stock  │
//! │  POST   /product                register with partner, then store      │
//! │  PATCH  /product/{id}           replace name and description           │
//! │  DELETE /product/{id}           delete product and its offers          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The binary in `main.rs` wires real collaborators; tests build an
//! [`AppState`] around an in-memory database and a fake partner.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use catalog_db::Database;
use catalog_sync::{
    OfferReconciler, PartnerApi, ProductRegistrar, RefresherHandle, TokenReader,
    UpstreamFailurePolicy,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub offers: OfferReconciler,
    pub registrar: ProductRegistrar,
    pub tokens: TokenReader,
    /// Absent when no refresher was started (tests).
    pub refresher: Option<Arc<RefresherHandle>>,
}

impl AppState {
    pub fn new(
        db: Database,
        partner: Arc<dyn PartnerApi>,
        tokens: TokenReader,
        policy: UpstreamFailurePolicy,
    ) -> Self {
        AppState {
            offers: OfferReconciler::new(db.clone(), partner.clone(), tokens.clone(), policy),
            registrar: ProductRegistrar::new(db.clone(), partner, tokens.clone()),
            db,
            tokens,
            refresher: None,
        }
    }

    /// Attaches the spawned refresher so `/health` can report on it.
    pub fn with_refresher(mut self, refresher: RefresherHandle) -> Self {
        self.refresher = Some(Arc::new(refresher));
        self
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::version))
        .route("/health", get(routes::health))
        .route("/product", post(routes::create_product))
        .route(
            "/product/{id}",
            patch(routes::update_product).delete(routes::delete_product),
        )
        .route("/product/{id}/offers", get(routes::product_offers))
        .with_state(state)
}
