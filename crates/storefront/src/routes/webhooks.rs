//! Vendor webhook route handlers.
//!
//! The vendor pushes catalog and checkout events here so the CMS mirror and
//! the catalog cache stay current without polling. Every delivery is
//! signature-checked before the body is even parsed. Handler failures after
//! a valid signature are swallowed with a 200 so the vendor doesn't retry
//! forever against an outage we already logged; the swallowed-failure
//! counter keeps those visible.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use driftwood_core::types::VendorProductId;

use crate::state::AppState;
use crate::vendor::{PaymentVendorPort, verify_signature};

/// Header carrying the `t=...,v1=...` signature.
pub const SIGNATURE_HEADER: &str = "vendor-signature";

/// Signed vendor event delivery.
#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: EventData,
}

#[derive(Debug, Default, Deserialize)]
struct EventData {
    #[serde(default)]
    object: EventObject,
}

#[derive(Debug, Default, Deserialize)]
struct EventObject {
    #[serde(default)]
    id: Option<String>,
    /// Product a price belongs to, present on price events.
    #[serde(default)]
    product: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

/// Handle a signed vendor event.
///
/// POST /webhooks/vendor
#[instrument(skip_all)]
pub async fn vendor(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let secret = state.config().webhook_secret.expose_secret().to_string();
    if secret.is_empty() {
        tracing::error!("Webhook signing secret is not configured");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        tracing::warn!("Webhook delivery without signature header");
        return StatusCode::BAD_REQUEST;
    };

    let now = chrono::Utc::now().timestamp();
    if let Err(err) = verify_signature(&secret, signature, &body, now) {
        tracing::warn!(error = %err, "Webhook signature rejected");
        return StatusCode::BAD_REQUEST;
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, "Unparseable webhook payload, acknowledging anyway");
            return StatusCode::OK;
        }
    };

    dispatch(&state, event).await;
    StatusCode::OK
}

async fn dispatch(state: &AppState, event: WebhookEvent) {
    let object = event.data.object;
    match event.event_type.as_str() {
        "product.created" | "product.updated" => {
            if let Some(id) = object.id {
                sync_and_swallow(state, &VendorProductId::new(id)).await;
            }
        }
        "product.deleted" => {
            if let Some(id) = object.id {
                let product_id = VendorProductId::new(id);
                if let Err(err) = state.sync().remove_product(&product_id).await {
                    let swallowed_total = state.sync().metrics().record_swallowed();
                    tracing::error!(
                        product_id = %product_id,
                        error = %err,
                        swallowed_total,
                        "Failed to remove CMS mirror for deleted product"
                    );
                }
                state.catalog().invalidate().await;
            }
        }
        "price.created" | "price.updated" => {
            if let Some(product) = object.product {
                sync_and_swallow(state, &VendorProductId::new(product)).await;
            }
        }
        "checkout.session.completed" => {
            handle_checkout_completed(state, &object.metadata).await;
        }
        other => {
            tracing::debug!(event_type = other, "Ignoring unhandled webhook event");
        }
    }
}

async fn sync_and_swallow(state: &AppState, product_id: &VendorProductId) {
    if let Err(err) = state.sync().sync_product_by_id(product_id).await {
        let swallowed_total = state.sync().metrics().record_swallowed();
        tracing::error!(
            product_id = %product_id,
            error = %err,
            swallowed_total,
            "Webhook-triggered sync failed"
        );
    }
    state.catalog().invalidate().await;
}

/// Decrement each pool named in the session's `usage:<product>` metadata.
async fn handle_checkout_completed(state: &AppState, metadata: &HashMap<String, String>) {
    for (key, value) in metadata {
        let Some(product_id) = key.strip_prefix("usage:") else {
            continue;
        };
        let Ok(base_units) = value.parse::<u64>() else {
            tracing::warn!(key, value, "Malformed usage metadata on completed checkout");
            continue;
        };
        let product_id = VendorProductId::new(product_id);
        if let Err(err) = state
            .vendor()
            .decrement_inventory(&product_id, base_units)
            .await
        {
            let swallowed_total = state.sync().metrics().record_swallowed();
            tracing::error!(
                product_id = %product_id,
                base_units,
                error = %err,
                swallowed_total,
                "Failed to decrement inventory after checkout"
            );
        } else {
            tracing::info!(product_id = %product_id, base_units, "Inventory decremented");
        }
    }
    state.catalog().invalidate().await;
}
