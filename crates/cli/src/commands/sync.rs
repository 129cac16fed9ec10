//! Vendor to CMS sync commands.

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use driftwood_storefront::sync::{SyncHandler, SyncMetrics};
use driftwood_storefront::vendor::PaymentVendorPort;

use super::{cms_from_env, vendor_from_env};

/// Sync every vendor product into the CMS, printing per-item outcomes.
pub async fn all() -> Result<(), Box<dyn std::error::Error>> {
    let vendor = vendor_from_env()?;
    let cms = cms_from_env()?;
    let handler = SyncHandler::new(vendor.clone(), Arc::new(cms), Arc::new(SyncMetrics::default()));

    let products = vendor.list_products().await?;
    println!("Syncing {} products...", products.len());

    let mut synced = 0usize;
    let mut failed = 0usize;
    for product in &products {
        match handler.sync_product(product).await {
            Ok(()) => {
                synced += 1;
                println!("  ok      {} ({})", product.name, product.id);
            }
            Err(err) => {
                failed += 1;
                println!("  FAILED  {} ({}): {err}", product.name, product.id);
            }
        }
    }

    println!("Done: {synced} synced, {failed} failed");
    if failed > 0 {
        return Err(format!("{failed} products failed to sync").into());
    }
    Ok(())
}
