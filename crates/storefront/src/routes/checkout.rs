//! Checkout route handlers.
//!
//! Checkout re-runs allocation clamping server-side before handing off to
//! the vendor, so a stale client cart can't oversell the pool. The session
//! is tagged with per-product base-unit usage; the completion webhook uses
//! those tags to decrement inventory.

use std::collections::HashMap;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use driftwood_core::cart::{CartStore, MemoryCartPersistence, NewCartItem};
use driftwood_core::types::{VariantId, VendorProductId};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::vendor::{CheckoutLine, PaymentVendorPort, ProductUsage};

/// A requested checkout line.
#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
}

/// Checkout session handoff.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    /// Vendor-hosted payment page to redirect the customer to.
    pub checkout_url: String,
}

/// Create a vendor checkout session.
///
/// POST /api/checkout
#[instrument(skip(state, request), fields(item_count = request.items.len()))]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    if request.items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }

    let products = state.vendor().list_products().await?;

    // Rebuild the cart server-side; add_item clamps each line to what the
    // pool can still cover.
    let mut store = CartStore::load(MemoryCartPersistence::default());
    for item in &request.items {
        if item.quantity == 0 {
            continue;
        }
        let located = products.iter().find_map(|product| {
            product
                .variants
                .iter()
                .find(|variant| variant.variant_id == item.variant_id)
                .map(|variant| (product, variant))
        });
        let Some((product, variant)) = located else {
            tracing::warn!(variant_id = %item.variant_id, "Checkout item no longer sold, skipping");
            continue;
        };
        if !product.inventory.available {
            continue;
        }
        store.add_item(
            NewCartItem {
                product_id: product.id.clone(),
                variant_id: variant.variant_id.clone(),
                product_name: product.name.clone(),
                nickname: variant.nickname.clone(),
                unit_price_cents: variant.unit_price_cents,
                quantity: item.quantity,
                base_unit_multiplier: variant.base_unit_multiplier,
            },
            product.inventory,
        );
    }

    if store.is_empty() {
        return Err(AppError::BadRequest(
            "None of the requested items are available".to_string(),
        ));
    }

    let lines: Vec<CheckoutLine> = store
        .lines()
        .iter()
        .map(|line| CheckoutLine {
            variant_id: line.variant_id.clone(),
            quantity: line.quantity,
        })
        .collect();

    let mut usage_by_product: HashMap<VendorProductId, u64> = HashMap::new();
    for line in store.lines() {
        *usage_by_product.entry(line.product_id.clone()).or_default() += line.usage();
    }
    let usage: Vec<ProductUsage> = usage_by_product
        .into_iter()
        .map(|(product_id, base_units)| ProductUsage {
            product_id,
            base_units,
        })
        .collect();

    let session = state.vendor().create_checkout_session(&lines, &usage).await?;
    tracing::info!(session_id = %session.id, "Checkout session created");

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        checkout_url: session.url,
    }))
}
