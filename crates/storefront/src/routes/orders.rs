//! Order lookup route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use driftwood_core::types::OrderId;

use crate::error::Result;
use crate::state::AppState;
use crate::vendor::{OrderSummary, PaymentVendorPort};

/// Order summary for the post-checkout success page.
///
/// GET /api/orders/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderSummary>> {
    let order = state.vendor().retrieve_order(&OrderId::new(id)).await?;
    Ok(Json(order))
}
