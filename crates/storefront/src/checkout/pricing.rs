//! Re-pricing a draft from the catalog and accepted quotes.
//!
//! Drafts round-trip through the client, so the names and prices they carry
//! are display copies only. Every line is priced again right before commit.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use eazyy_core::{DraftItem, ItemId, OrderDraft, QuoteId, QuoteStatus, UserId};

use crate::catalog::CatalogStore;
use crate::db::{QuoteStore, RepositoryError};

#[derive(Debug, Error)]
pub enum PricingError {
    /// Not an active catalog item and not one of the customer's accepted quotes.
    #[error("{0} is no longer available")]
    Unavailable(String),

    #[error("{0} needs a price quote first")]
    NeedsQuote(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Prices draft lines from trusted sources.
#[derive(Clone)]
pub struct Pricer {
    catalog: CatalogStore,
    quotes: Arc<dyn QuoteStore>,
}

impl Pricer {
    #[must_use]
    pub fn new(catalog: CatalogStore, quotes: Arc<dyn QuoteStore>) -> Self {
        Self { catalog, quotes }
    }

    /// Overwrite every line's name and unit price with the trusted values.
    ///
    /// Catalog items must be active with a fixed price. Any other line must
    /// be an accepted quote owned by `customer`, priced at the facility's
    /// price or, failing that, the customer's suggestion.
    ///
    /// # Errors
    ///
    /// - `PricingError::Unavailable` for an unknown or inactive item
    /// - `PricingError::NeedsQuote` for a custom-priced item
    pub async fn reprice(
        &self,
        draft: &mut OrderDraft,
        customer: UserId,
    ) -> Result<(), PricingError> {
        for line in draft.items.values_mut() {
            let (name, price) = self.trusted_line(line, customer).await?;
            if line.price != price {
                warn!(
                    item_id = %line.id,
                    submitted = %line.price,
                    trusted = %price,
                    "Draft price differs from the trusted price"
                );
            }
            line.name = name;
            line.price = price;
        }
        Ok(())
    }

    async fn trusted_line(
        &self,
        line: &DraftItem,
        customer: UserId,
    ) -> Result<(String, Decimal), PricingError> {
        if let Some(item) = self.catalog.item(line.id) {
            if !item.status {
                return Err(PricingError::Unavailable(item.name));
            }
            let price = item
                .selectable()
                .fixed_price()
                .ok_or_else(|| PricingError::NeedsQuote(item.name.clone()))?;
            return Ok((item.name, price));
        }

        let quote = self
            .quotes
            .get(customer, quote_id(line.id))
            .await?
            .filter(|q| q.status == QuoteStatus::Accepted)
            .ok_or_else(|| PricingError::Unavailable(line.name.clone()))?;
        let price = quote
            .offered_price()
            .ok_or_else(|| PricingError::NeedsQuote(quote.item_name.clone()))?;
        Ok((quote.item_name, price))
    }
}

/// Quote drafts reuse the quote's id as the line's item id.
const fn quote_id(id: ItemId) -> QuoteId {
    QuoteId::from_uuid(id.as_uuid())
}
