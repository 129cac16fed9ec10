//! Vendor to CMS product sync.
//!
//! The CMS mirrors the vendor catalog so editors always have a document to
//! attach content to. Sync is idempotent: each vendor product maps to a
//! deterministic document ID, created with `createIfNotExists` and then
//! patched. Vendor-owned fields (name, variant/price cache, image) are
//! overwritten on every pass; editorial fields are never touched after
//! creation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::instrument;

use driftwood_core::catalog::VendorProduct;
use driftwood_core::types::VendorProductId;

use crate::cms::{CmsError, CmsMirrorPort, ProductUpsert, VariantSnapshot, document_id_for};
use crate::vendor::{PaymentVendorPort, VendorError};

/// Errors from a sync operation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Vendor API failed.
    #[error("vendor error: {0}")]
    Vendor(#[from] VendorError),

    /// CMS API failed.
    #[error("CMS error: {0}")]
    Cms(#[from] CmsError),
}

/// Counters exposed for operator visibility.
///
/// Webhook-triggered sync swallows failures so the vendor doesn't retry
/// endlessly against a broken CMS; this is how those failures stay visible.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    swallowed_failures: AtomicU64,
}

impl SyncMetrics {
    /// Count one swallowed failure, returning the running total so call
    /// sites can put it in the log line.
    pub fn record_swallowed(&self) -> u64 {
        self.swallowed_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[must_use]
    pub fn swallowed(&self) -> u64 {
        self.swallowed_failures.load(Ordering::Relaxed)
    }
}

/// Outcome of a batch sync.
#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct SyncReport {
    pub synced: usize,
    pub failed: usize,
}

/// Mirrors vendor products into the CMS.
#[derive(Clone)]
pub struct SyncHandler {
    vendor: Arc<dyn PaymentVendorPort>,
    cms: Arc<dyn CmsMirrorPort>,
    metrics: Arc<SyncMetrics>,
}

impl SyncHandler {
    #[must_use]
    pub fn new(
        vendor: Arc<dyn PaymentVendorPort>,
        cms: Arc<dyn CmsMirrorPort>,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            vendor,
            cms,
            metrics,
        }
    }

    #[must_use]
    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    /// Sync one product, fetched fresh from the vendor.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor fetch or the CMS mutation fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn sync_product_by_id(
        &self,
        product_id: &VendorProductId,
    ) -> Result<(), SyncError> {
        match self.vendor.get_product(product_id).await {
            Ok(product) => self.sync_product(&product).await,
            // A product the vendor no longer knows gets its mirror removed
            Err(VendorError::NotFound(_)) => Ok(self.remove_product(product_id).await?),
            Err(err) => Err(err.into()),
        }
    }

    /// Sync one already-fetched product.
    ///
    /// Repairs inferred variant multipliers back onto the vendor, then
    /// upserts the CMS mirror document. Deactivated products delete the
    /// mirror instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS mutation fails. Repair and image upload
    /// failures are logged, counted, and swallowed.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn sync_product(&self, product: &VendorProduct) -> Result<(), SyncError> {
        if !product.inventory.available {
            return Ok(self.remove_product(&product.id).await?);
        }

        for variant in &product.variants {
            if !variant.multiplier_inferred {
                continue;
            }
            if let Err(err) = self
                .vendor
                .update_price_metadata(&variant.variant_id, variant.base_unit_multiplier)
                .await
            {
                let swallowed_total = self.metrics.record_swallowed();
                tracing::warn!(
                    variant_id = %variant.variant_id,
                    error = %err,
                    swallowed_total,
                    "Failed to persist repaired multiplier"
                );
            }
        }

        let image_url = match &product.image_url {
            Some(source) => match self.cms.upload_image_from_url(source).await {
                Ok(stored) => Some(stored),
                Err(err) => {
                    let swallowed_total = self.metrics.record_swallowed();
                    tracing::warn!(
                        product_id = %product.id,
                        error = %err,
                        swallowed_total,
                        "Failed to re-store product image"
                    );
                    None
                }
            },
            None => None,
        };

        let doc = ProductUpsert {
            id: document_id_for(&product.id),
            vendor_product_id: product.id.clone(),
            name: product.name.clone(),
            variants: product
                .variants
                .iter()
                .map(|variant| VariantSnapshot {
                    key: variant.variant_id.to_string(),
                    variant_id: variant.variant_id.to_string(),
                    nickname: variant.nickname.clone(),
                    unit_price_cents: variant.unit_price_cents,
                    base_unit_multiplier: variant.base_unit_multiplier,
                })
                .collect(),
            image_url,
        };
        self.cms.upsert_product(&doc).await?;
        Ok(())
    }

    /// Delete the CMS mirror for a vendor product.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_product(&self, product_id: &VendorProductId) -> Result<(), CmsError> {
        self.cms.delete_document(&document_id_for(product_id)).await
    }

    /// Sync every vendor product, continuing past per-item failures.
    ///
    /// # Errors
    ///
    /// Returns an error only if the initial product listing fails.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> Result<SyncReport, SyncError> {
        let products = self.vendor.list_products().await?;
        let mut report = SyncReport::default();

        for product in &products {
            match self.sync_product(product).await {
                Ok(()) => report.synced += 1,
                Err(err) => {
                    let swallowed_total = self.metrics.record_swallowed();
                    tracing::error!(
                        product_id = %product.id,
                        error = %err,
                        swallowed_total,
                        "Product sync failed"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            synced = report.synced,
            failed = report.failed,
            "Batch sync finished"
        );
        Ok(report)
    }
}
