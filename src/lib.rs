//! Storefront Client Library
//!
//! Cache-first catalog access, client-side filtering, alerts and cart
//! submission for a storefront browsing client. Exposed as a library for the
//! CLI, benchmarks and integration tests.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
