//! Custom price quotes for items that cannot be priced up front.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use eazyy_core::{DraftItem, ItemId, OrderDraft, QuoteId, QuoteStatus, QuoteUrgency, UserId};

/// Service slug used for drafts built from an accepted quote.
pub const CUSTOM_SERVICE: &str = "custom";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub id: QuoteId,
    pub user_id: UserId,
    pub item_name: String,
    pub description: String,
    pub image_url: Vec<String>,
    pub suggested_price: Option<Decimal>,
    pub status: QuoteStatus,
    pub urgency: QuoteUrgency,
    pub admin_price: Option<Decimal>,
    pub admin_note: Option<String>,
    pub admin_quoted_at: Option<DateTime<Utc>>,
    pub facility_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    /// The price the customer pays: the facility's price, else their own suggestion.
    #[must_use]
    pub fn offered_price(&self) -> Option<Decimal> {
        self.admin_price.or(self.suggested_price)
    }

    /// A fresh draft holding this quote as its only item.
    ///
    /// Returns `None` when the quote carries no price at all.
    #[must_use]
    pub fn to_draft(&self) -> Option<OrderDraft> {
        let price = self.offered_price()?;
        let id = ItemId::from_uuid(self.id.as_uuid());
        Some(OrderDraft::with_single_item(
            CUSTOM_SERVICE,
            DraftItem {
                id,
                name: self.item_name.clone(),
                price,
                quantity: 1,
            },
        ))
    }
}

/// Submitted fields for a quote request.
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuote {
    pub item_name: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Vec<String>,
    pub suggested_price: Option<Decimal>,
    #[serde(default)]
    pub urgency: QuoteUrgency,
}
