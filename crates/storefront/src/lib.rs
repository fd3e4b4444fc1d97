//! Eazyy Storefront library.
//!
//! The JSON API behind the Eazyy laundry ordering site: catalog browsing, the
//! multi-step order draft, order commit, the Stripe payment bridge and
//! customer accounts. Exposed as a library so the binary and the integration
//! tests build the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
