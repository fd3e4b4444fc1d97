//! Decimal money arithmetic for order totals.
//!
//! All amounts are in euros (the currency's standard unit, not cents).
//! Conversion to minor units only happens at the payment processor boundary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Dutch VAT rate applied to every order (21%).
pub const VAT_RATE: Decimal = Decimal::from_parts(21, 0, 0, false, 2);

/// ISO currency code, lowercase as the payment processor reports it.
pub const ORDER_CURRENCY: &str = "eur";

/// Shipping is free for every order.
pub const SHIPPING_FEE: Decimal = Decimal::ZERO;

/// Round a euro amount to whole cents, half away from zero.
#[must_use]
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a euro amount to cents.
///
/// Returns `None` if the amount does not fit in an `i64`.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Convert cents back to a euro amount.
#[must_use]
pub fn from_minor_units(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Computed subtotal, tax, shipping and total of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Derive tax and total from a subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Decimal) -> Self {
        let tax = round_cents(subtotal * VAT_RATE);
        Self {
            subtotal,
            tax,
            shipping_fee: SHIPPING_FEE,
            total: subtotal + tax + SHIPPING_FEE,
        }
    }
}

/// Format a euro amount for display, e.g. `€30.25`.
#[must_use]
pub fn format_eur(amount: Decimal) -> String {
    format!("€{:.2}", round_cents(amount))
}
