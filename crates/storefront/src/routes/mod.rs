//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness check
//! GET  /health/ready                  - Readiness check (pings the CMS)
//!
//! # Catalog
//! GET  /api/catalog                   - Merged vendor + CMS catalog
//!
//! # Cart
//! POST /api/cart/validate             - Revalidate a persisted cart
//!
//! # Checkout
//! POST /api/checkout                  - Create a vendor checkout session
//! GET  /api/orders/{id}               - Order summary for the success page
//!
//! # Contact
//! POST /api/contact                   - Contact form submission
//!
//! # Webhooks
//! POST /webhooks/vendor               - Signed vendor event deliveries
//!
//! # Maintenance
//! POST /api/maintenance/fix-block-keys   - Repair rich-text block keys
//! POST /api/maintenance/dedupe-products  - Remove duplicate CMS mirrors
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod contact;
pub mod health;
pub mod maintenance;
pub mod orders;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(catalog::index))
        .route("/cart/validate", post(cart::validate))
        .route("/checkout", post(checkout::create))
        .route("/orders/{id}", get(orders::show))
        .route("/contact", post(contact::submit))
        .nest("/maintenance", maintenance_routes())
}

/// Create the maintenance routes router.
pub fn maintenance_routes() -> Router<AppState> {
    Router::new()
        .route("/fix-block-keys", post(maintenance::fix_block_keys))
        .route("/dedupe-products", post(maintenance::dedupe_products))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .nest("/api", api_routes())
        .route("/webhooks/vendor", post(webhooks::vendor))
}
