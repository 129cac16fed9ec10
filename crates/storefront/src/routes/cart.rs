//! Cart validation route handlers.
//!
//! The cart itself lives in the browser; this endpoint takes the persisted
//! lines, reconciles them against live inventory, and returns the corrected
//! lines with user-facing notices. Calling it twice with the same input is
//! a no-op the second time.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use driftwood_core::cart::{
    AdjustedLine, CartLineItem, CartStore, MemoryCartPersistence, RemovedLine,
};

use crate::error::Result;
use crate::state::AppState;

/// Persisted cart lines submitted for revalidation.
#[derive(Debug, Deserialize)]
pub struct ValidateCartRequest {
    pub lines: Vec<CartLineItem>,
}

/// Corrected cart plus batched notices.
#[derive(Debug, Serialize)]
pub struct ValidateCartResponse {
    pub lines: Vec<CartLineItem>,
    pub removed: Vec<RemovedLine>,
    pub adjusted: Vec<AdjustedLine>,
    /// One message per notice category, ready for display.
    pub messages: Vec<String>,
}

/// Revalidate a persisted cart against live inventory.
///
/// POST /api/cart/validate
#[instrument(skip(state, request), fields(line_count = request.lines.len()))]
pub async fn validate(
    State(state): State<AppState>,
    Json(request): Json<ValidateCartRequest>,
) -> Result<Json<ValidateCartResponse>> {
    let snapshots = state.catalog().snapshots().await?;

    let mut store = CartStore::from_lines(request.lines, MemoryCartPersistence::default());
    let report = store.validate(&snapshots);

    if !report.is_clean() {
        tracing::info!(
            removed = report.removed.len(),
            adjusted = report.adjusted.len(),
            "Cart corrected during validation"
        );
    }

    Ok(Json(ValidateCartResponse {
        lines: store.lines().to_vec(),
        messages: report.messages(),
        removed: report.removed,
        adjusted: report.adjusted,
    }))
}
