//! Driftwood Core - Domain logic for the Driftwood Roasters storefront.
//!
//! This crate holds the business logic shared by the other Driftwood
//! components:
//! - `storefront` - Public-facing API service
//! - `cli` - Command-line tools for sync and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no storage backends. The cart store talks to storage through the
//! [`cart::CartPersistence`] port, so everything here is testable without a
//! browser, a database, or a payment vendor.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and emails
//! - [`inventory`] - Shared base-unit inventory pool and allocation math
//! - [`sizing`] - Base-unit multiplier inference from variant nicknames
//! - [`cart`] - Client cart store, persistence port, and validation
//! - [`catalog`] - Vendor/CMS catalog merge

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod inventory;
pub mod sizing;
pub mod types;

pub use types::*;
