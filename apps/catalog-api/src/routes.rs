//! HTTP handlers.
//!
//! `POST /product` and `PATCH /product/{id}` read `id`, `name` and
//! `description` from the query string. A request sent with a JSON content
//! type carries the same fields in its body instead.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use catalog_core::validation::validate_changes;
use catalog_core::{NewProduct, Offer, Product, ProductChanges};
use catalog_db::migrations::migration_status;
use catalog_sync::RegistrationOutcome;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn product_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::bad_request(format!("Invalid product id: {}", e.body_text())))
}

/// Takes the fields from a JSON body when one was sent, else from the query.
fn product_fields<T>(
    query: Result<Query<T>, QueryRejection>,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => query
            .map(|Query(value)| value)
            .map_err(|e| ApiError::bad_request(e.body_text())),
        Err(e) => Err(ApiError::bad_request(e.body_text())),
    }
}

/// `GET /`
pub async fn version() -> Json<Value> {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = state.db.health_check().await;
    let (total, applied) = match migration_status(state.db.pool()).await {
        Ok(status) => status,
        Err(e) => {
            warn!(error = %e, "Failed to read migration status");
            (0, 0)
        }
    };

    let token_refresh = match &state.refresher {
        Some(handle) if handle.is_running() => "running",
        Some(_) => "stopped",
        None => "disabled",
    };

    Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "database": database,
        "migrations": { "total": total, "applied": applied },
        "token_refresh": token_refresh,
        "token_acquired_at": state.tokens.acquired_at(),
    }))
}

/// `GET /product/{id}/offers`
pub async fn product_offers(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Vec<Offer>> {
    let id = product_id(path)?;
    let offers = state.offers.offers_for_product(id).await?;
    Ok(Json(offers))
}

/// `POST /product`
pub async fn create_product(
    State(state): State<AppState>,
    query: Result<Query<NewProduct>, QueryRejection>,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<Product> {
    let new = product_fields(query, body)?;

    match state.registrar.register(new).await? {
        RegistrationOutcome::Registered { product, .. } => Ok(Json(product)),
        RegistrationOutcome::Rejected { status } => Err(ApiError::registration_failed(format!(
            "Partner rejected registration with status {}",
            status
        ))),
        RegistrationOutcome::Unreachable { .. } => Err(ApiError::registration_failed(
            "Partner service unreachable",
        )),
        RegistrationOutcome::Unauthenticated => Err(ApiError::registration_failed(
            "No partner access token available",
        )),
    }
}

/// `PATCH /product/{id}`
pub async fn update_product(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ProductChanges>, QueryRejection>,
    body: Result<Json<ProductChanges>, JsonRejection>,
) -> ApiResult<Product> {
    let id = product_id(path)?;
    let changes = product_fields(query, body)?;
    validate_changes(&changes)?;

    let product = state.db.products().update(id, &changes).await?;
    info!(product_id = %id, "Product updated");
    Ok(Json(product))
}

/// `DELETE /product/{id}`
pub async fn delete_product(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Uuid> {
    let id = product_id(path)?;

    let removed = state.db.products().delete(id).await?;
    if removed == 0 {
        warn!(product_id = %id, "Delete of unknown product");
    } else {
        info!(product_id = %id, "Product deleted");
    }

    Ok(Json(id))
}
