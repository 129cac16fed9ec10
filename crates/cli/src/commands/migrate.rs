//! One-time vendor migration commands.

#![allow(clippy::print_stdout)]

use driftwood_storefront::config::{SquareConfig, StripeConfig};
use driftwood_storefront::vendor::{PaymentVendorPort, SquareClient, StripeClient};

/// Copy the Square catalog into Stripe.
///
/// Products carry their stock pool into Stripe metadata; each variant
/// becomes a price with its base-unit multiplier written as metadata so
/// nothing depends on nickname inference afterwards. Square is left
/// untouched.
pub async fn square_to_stripe() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::var("STOREFRONT_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());
    let square = SquareClient::new(&SquareConfig::from_env()?, &base_url);
    let stripe = StripeClient::new(&StripeConfig::from_env()?, &base_url);

    let products = square.list_products().await?;
    println!("Migrating {} products from Square to Stripe...", products.len());

    let mut migrated = 0usize;
    let mut failed = 0usize;
    for product in &products {
        let result = async {
            let stripe_id = stripe
                .create_product(
                    &product.name,
                    product.description.as_deref(),
                    product.inventory.total_base_units,
                )
                .await?;
            for variant in &product.variants {
                stripe
                    .create_price(
                        &stripe_id,
                        &variant.nickname,
                        variant.unit_price_cents,
                        variant.base_unit_multiplier,
                    )
                    .await?;
            }
            Ok::<_, driftwood_storefront::vendor::VendorError>(stripe_id)
        }
        .await;

        match result {
            Ok(stripe_id) => {
                migrated += 1;
                println!(
                    "  ok      {} ({} -> {})",
                    product.name, product.id, stripe_id
                );
            }
            Err(err) => {
                failed += 1;
                println!("  FAILED  {} ({}): {err}", product.name, product.id);
            }
        }
    }

    println!("Done: {migrated} migrated, {failed} failed");
    if failed > 0 {
        return Err(format!("{failed} products failed to migrate").into());
    }
    Ok(())
}
