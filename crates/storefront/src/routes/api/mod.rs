//! Cross-origin JSON endpoints called directly by the hosted checkout page.

pub mod payment;
