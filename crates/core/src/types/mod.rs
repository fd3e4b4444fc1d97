//! Domain value types shared by the storefront and the CLI.

pub mod email;
pub mod id;
pub mod order_number;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use order_number::{InvalidOrderNumber, OrderNumber};
pub use price::{
    ORDER_CURRENCY, OrderTotals, VAT_RATE, format_eur, from_minor_units, round_cents,
    to_minor_units,
};
pub use status::*;
