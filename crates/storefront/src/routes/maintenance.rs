//! CMS maintenance route handlers.
//!
//! One-off repair endpoints for damage that accumulates in the dataset:
//! rich-text blocks that lost their `_key`s (the editor refuses to render
//! them) and duplicate mirror documents left behind by older sync bugs.

use std::collections::HashMap;

use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use driftwood_core::types::VendorProductId;

use crate::cms::CmsProductDoc;
use crate::error::Result;
use crate::state::AppState;

/// Outcome of a block-key repair pass.
#[derive(Debug, Serialize)]
pub struct FixBlockKeysResponse {
    /// Documents whose description blocks were rewritten.
    pub repaired: usize,
}

/// Outcome of a dedupe pass.
#[derive(Debug, Serialize)]
pub struct DedupeResponse {
    /// Duplicate documents deleted.
    pub removed: usize,
}

/// Assign missing `_key`s to rich-text description blocks.
///
/// POST /api/maintenance/fix-block-keys
#[instrument(skip(state))]
pub async fn fix_block_keys(State(state): State<AppState>) -> Result<Json<FixBlockKeysResponse>> {
    let docs = state.cms().fetch_products().await?;
    let mut repaired = 0;

    for doc in docs {
        let Some(blocks) = doc.description else {
            continue;
        };
        if blocks
            .iter()
            .all(|block| block.get("_key").and_then(|key| key.as_str()).is_some())
        {
            continue;
        }

        let keyed: Vec<serde_json::Value> = blocks
            .into_iter()
            .map(|mut block| {
                if block.get("_key").and_then(|key| key.as_str()).is_none()
                    && let Some(object) = block.as_object_mut()
                {
                    object.insert(
                        "_key".to_string(),
                        json!(uuid::Uuid::new_v4().simple().to_string()),
                    );
                }
                block
            })
            .collect();

        state
            .cms()
            .mutate(vec![json!({
                "patch": {
                    "id": doc.id,
                    "set": { "description": keyed },
                }
            })])
            .await?;
        repaired += 1;
    }

    tracing::info!(repaired, "Block key repair finished");
    Ok(Json(FixBlockKeysResponse { repaired }))
}

/// Delete duplicate mirror documents sharing a vendor product ID, keeping
/// the most recently updated one.
///
/// POST /api/maintenance/dedupe-products
#[instrument(skip(state))]
pub async fn dedupe_products(State(state): State<AppState>) -> Result<Json<DedupeResponse>> {
    let docs = state.cms().fetch_products().await?;

    let mut by_vendor: HashMap<VendorProductId, Vec<CmsProductDoc>> = HashMap::new();
    for doc in docs {
        let Some(vendor_id) = doc.vendor_product_id.clone() else {
            continue;
        };
        by_vendor.entry(vendor_id).or_default().push(doc);
    }

    let mut removed = 0;
    for (vendor_id, mut group) in by_vendor {
        if group.len() < 2 {
            continue;
        }
        // ISO-8601 timestamps sort lexicographically; newest last.
        group.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        let keep = group.pop();
        for duplicate in group {
            state.cms().delete_document(&duplicate.id).await?;
            removed += 1;
        }
        if let Some(keep) = keep {
            tracing::info!(
                vendor_id = %vendor_id,
                kept = %keep.id,
                "Removed duplicate mirror documents"
            );
        }
    }

    Ok(Json(DedupeResponse { removed }))
}
