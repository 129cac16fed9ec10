//! Vendor catalog maintenance commands.

#![allow(clippy::print_stdout)]

use driftwood_storefront::vendor::PaymentVendorPort;

use super::vendor_from_env;

/// Archive every product at the vendor.
pub async fn archive_all() -> Result<(), Box<dyn std::error::Error>> {
    let vendor = vendor_from_env()?;

    let products = vendor.list_products().await?;
    println!("Archiving {} products...", products.len());

    let mut archived = 0usize;
    let mut failed = 0usize;
    for product in &products {
        match vendor.archive_product(&product.id).await {
            Ok(()) => {
                archived += 1;
                println!("  ok      {} ({})", product.name, product.id);
            }
            Err(err) => {
                failed += 1;
                println!("  FAILED  {} ({}): {err}", product.name, product.id);
            }
        }
    }

    println!("Done: {archived} archived, {failed} failed");
    if failed > 0 {
        return Err(format!("{failed} products failed to archive").into());
    }
    Ok(())
}
