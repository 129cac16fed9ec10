//! Business logic services for the storefront.
//!
//! - `email` - Transactional email (contact form forwarding)

pub mod email;
