//! Catalog route handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use driftwood_core::catalog::CatalogProduct;

use crate::error::Result;
use crate::state::AppState;

/// Catalog listing response.
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub products: Vec<CatalogProduct>,
}

/// The merged catalog.
///
/// GET /api/catalog
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<CatalogResponse>> {
    let products = state.catalog().merged().await?;
    Ok(Json(CatalogResponse {
        products: products.as_ref().clone(),
    }))
}
