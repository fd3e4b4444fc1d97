//! Catalog records: services, their categories, and the items in them.

use rust_decimal::Decimal;
use serde::Serialize;

use eazyy_core::{CategoryId, ItemId, SelectableItem, ServiceId};

/// A laundry service such as dry cleaning or wash & fold.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Service {
    pub id: ServiceId,
    /// URL slug, e.g. `dry-cleaning`.
    pub service_identifier: String,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub icon: Option<String>,
    pub image_url: Option<String>,
    pub color_scheme: Option<serde_json::Value>,
    pub starting_price: Option<Decimal>,
    pub price_unit: Option<String>,
    pub features: Vec<String>,
    pub benefits: Vec<String>,
    pub sequence: i32,
    pub is_popular: bool,
    /// Active flag.
    pub status: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub service_id: ServiceId,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub sequence: i32,
    pub status: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Item {
    pub id: ItemId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    /// `None` means the item must be quoted.
    pub price: Option<Decimal>,
    pub is_custom_price: bool,
    pub is_popular: bool,
    pub sequence: i32,
    pub status: bool,
}

impl Item {
    /// Whether adding this item requires a custom price quote.
    #[must_use]
    pub const fn requires_quote(&self) -> bool {
        self.is_custom_price || self.price.is_none()
    }

    /// The pricing facts the order draft needs.
    #[must_use]
    pub fn selectable(&self) -> SelectableItem {
        SelectableItem {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            is_custom_price: self.is_custom_price,
        }
    }
}
