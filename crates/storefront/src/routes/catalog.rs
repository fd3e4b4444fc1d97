//! Catalog browsing endpoints.
//!
//! All lookups are served from the in-memory snapshot; only `retry` touches
//! the database.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use eazyy_core::CategoryId;

use crate::catalog::CatalogStatus;
use crate::error::Result;
use crate::models::{Category, Item, Service};
use crate::state::AppState;

/// `GET /api/services`
pub async fn services(State(state): State<AppState>) -> Json<Vec<Service>> {
    Json(state.catalog().services())
}

/// `GET /api/services/{identifier}/categories`
///
/// Unknown services yield an empty list.
pub async fn service_categories(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Json<Vec<Category>> {
    Json(state.catalog().get_service_categories(&identifier))
}

/// `GET /api/categories/{id}/items`
pub async fn category_items(
    State(state): State<AppState>,
    Path(category_id): Path<CategoryId>,
) -> Json<Vec<Item>> {
    Json(state.catalog().get_category_items(category_id))
}

#[derive(Debug, Serialize)]
pub struct CatalogStatusResponse {
    pub status: CatalogStatus,
    pub loading: bool,
    pub subscribed: bool,
    pub loaded_at: Option<DateTime<Utc>>,
}

fn status_of(state: &AppState) -> CatalogStatusResponse {
    let catalog = state.catalog();
    CatalogStatusResponse {
        status: catalog.status(),
        loading: catalog.is_loading(),
        subscribed: catalog.is_subscribed(),
        loaded_at: catalog.snapshot().loaded_at,
    }
}

/// `GET /api/catalog/status`
pub async fn status(State(state): State<AppState>) -> Json<CatalogStatusResponse> {
    Json(status_of(&state))
}

/// `POST /api/catalog/retry`
///
/// Reloads the whole catalog and reports the resulting state.
#[instrument(skip(state))]
pub async fn retry(State(state): State<AppState>) -> Result<Json<CatalogStatusResponse>> {
    state.catalog().load().await?;
    Ok(Json(status_of(&state)))
}
