//! Eazyy Core - shared types for the laundry storefront.
//!
//! Used by:
//! - `storefront` - the JSON API behind the ordering site
//! - `cli` - migrations and catalog seeding
//!
//! The crate holds plain values and pure logic only. No database access and
//! no HTTP clients, apart from the optional `sqlx` encodings behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, money, order numbers and statuses
//! - [`draft`] - the order draft threaded through the order flow

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod draft;
pub mod types;

pub use draft::{DraftAddress, DraftError, DraftItem, OrderDraft, QuantityOutcome, SelectableItem};
pub use types::*;
