//! Domain models for the storefront.

pub mod address;
pub mod catalog;
pub mod order;
pub mod quote;
pub mod session;
pub mod user;

pub use address::{Address, NewAddress};
pub use catalog::{Category, Item, Service};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderWithItems};
pub use quote::{NewQuote, Quote};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{Profile, User};
