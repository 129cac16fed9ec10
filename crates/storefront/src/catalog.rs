//! Merged catalog assembly and caching.
//!
//! The public catalog is the merge of live vendor data (products, prices,
//! inventory) with CMS editorial content. Both sources are fetched in
//! parallel and the merged result is cached for five minutes; webhook
//! events invalidate the cache so vendor changes show up promptly.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::instrument;

use driftwood_core::cart::ProductSnapshot;
use driftwood_core::catalog::{CatalogProduct, merge_catalog};

use crate::cms::{CmsClient, CmsProductDoc};
use crate::error::AppError;
use crate::vendor::PaymentVendorPort;

/// How long a merged catalog stays fresh.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Assembles and caches the merged catalog.
#[derive(Clone)]
pub struct CatalogService {
    vendor: Arc<dyn PaymentVendorPort>,
    cms: CmsClient,
    cache: Cache<(), Arc<Vec<CatalogProduct>>>,
}

impl CatalogService {
    #[must_use]
    pub fn new(vendor: Arc<dyn PaymentVendorPort>, cms: CmsClient) -> Self {
        Self {
            vendor,
            cms,
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// The merged catalog, from cache when fresh.
    ///
    /// A CMS outage degrades to vendor-only listings rather than taking the
    /// catalog down; a vendor outage is fatal because there is nothing to
    /// sell without it.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor fetch fails.
    #[instrument(skip(self))]
    pub async fn merged(&self) -> Result<Arc<Vec<CatalogProduct>>, AppError> {
        if let Some(cached) = self.cache.get(&()).await {
            return Ok(cached);
        }

        let (vendor_result, cms_result) =
            tokio::join!(self.vendor.list_products(), self.cms.fetch_products());

        let products = vendor_result?;
        let content = match cms_result {
            Ok(docs) => docs
                .into_iter()
                .filter_map(CmsProductDoc::into_content)
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, "CMS fetch failed, serving vendor-only catalog");
                Vec::new()
            }
        };

        let merged = Arc::new(merge_catalog(products, &content));
        self.cache.insert((), Arc::clone(&merged)).await;
        Ok(merged)
    }

    /// Live inventory snapshots for cart validation and checkout.
    ///
    /// Always hits the vendor; stale allocation data here would let carts
    /// oversell.
    ///
    /// # Errors
    ///
    /// Returns an error if the vendor fetch fails.
    pub async fn snapshots(&self) -> Result<Vec<ProductSnapshot>, AppError> {
        let products = self.vendor.list_products().await?;
        Ok(products
            .into_iter()
            .map(|product| ProductSnapshot {
                product_id: product.id,
                variant_ids: product
                    .variants
                    .into_iter()
                    .map(|variant| variant.variant_id)
                    .collect(),
                inventory: product.inventory,
            })
            .collect())
    }

    /// Drop the cached catalog so the next read re-fetches.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }
}
