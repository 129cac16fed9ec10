//! Driftwood Roasters storefront library.
//!
//! This crate provides the storefront API as a library, allowing it to be
//! tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod cms;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod sync;
pub mod vendor;

use axum::Router;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router over the given state.
#[must_use]
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
