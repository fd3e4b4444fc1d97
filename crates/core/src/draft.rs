//! The in-progress order carried between order-flow steps.
//!
//! An [`OrderDraft`] is never written to the orders tables. Each step receives
//! the draft in its request body, applies one change, and hands the updated
//! draft back. Only the commit step turns it into persisted rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ItemId, OrderNumber, OrderTotals};

/// One selected item in the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftItem {
    pub id: ItemId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl DraftItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Address as the draft carries it: one display line plus city and postcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftAddress {
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

impl DraftAddress {
    /// Single-line address used for geocoding and the order's shipping address.
    #[must_use]
    pub fn one_line(&self) -> String {
        format!("{}, {} {}", self.street, self.postal_code, self.city)
    }
}

/// Pricing facts about a catalog item needed to change its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectableItem {
    pub id: ItemId,
    pub name: String,
    pub price: Option<Decimal>,
    pub is_custom_price: bool,
}

impl SelectableItem {
    /// The fixed price, or `None` if the item must be quoted.
    ///
    /// An item without a price is treated as custom-priced even when the flag
    /// is unset.
    #[must_use]
    pub fn fixed_price(&self) -> Option<Decimal> {
        if self.is_custom_price {
            None
        } else {
            self.price
        }
    }
}

/// Result of [`OrderDraft::change_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityOutcome {
    /// The item's quantity is now this value (zero means it was removed).
    Updated(u32),
    /// The item is custom-priced; the customer must request a quote instead.
    QuoteRequired,
}

/// Reasons a draft is not ready for the next step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("select at least one item")]
    NoItems,
    #[error("select an address first")]
    MissingAddress,
    #[error("choose a pickup date")]
    MissingPickupDate,
    #[error("delivery date cannot be before the pickup date")]
    DeliveryBeforePickup,
}

/// The in-progress order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub items: BTreeMap<ItemId, DraftItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<DraftAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    /// Reserved at confirmation so a re-entry reuses the same number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<OrderNumber>,
}

impl OrderDraft {
    /// Start a draft for a service.
    #[must_use]
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: Some(service.into()),
            ..Self::default()
        }
    }

    /// A draft holding exactly one item, as produced by an accepted quote.
    #[must_use]
    pub fn with_single_item(service: impl Into<String>, item: DraftItem) -> Self {
        let mut draft = Self::for_service(service);
        draft.items.insert(item.id, item);
        draft
    }

    /// Apply `delta` to an item's quantity.
    ///
    /// Custom-priced items leave the draft untouched and return
    /// [`QuantityOutcome::QuoteRequired`]. Otherwise the quantity is clamped at
    /// zero and a zero quantity removes the entry.
    pub fn change_quantity(&mut self, item: &SelectableItem, delta: i64) -> QuantityOutcome {
        let Some(price) = item.fixed_price() else {
            return QuantityOutcome::QuoteRequired;
        };

        let current = self.items.get(&item.id).map_or(0, |entry| entry.quantity);
        let next = (i64::from(current) + delta).clamp(0, i64::from(u32::MAX));
        let next = u32::try_from(next).unwrap_or(u32::MAX);

        if next == 0 {
            self.items.remove(&item.id);
        } else {
            self.items.insert(
                item.id,
                DraftItem {
                    id: item.id,
                    name: item.name.clone(),
                    price,
                    quantity: next,
                },
            );
        }

        QuantityOutcome::Updated(next)
    }

    /// Sum of every line total.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.values().map(DraftItem::line_total).sum()
    }

    #[must_use]
    pub fn totals(&self) -> OrderTotals {
        OrderTotals::from_subtotal(self.subtotal())
    }

    /// Check the draft can move on to address selection.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::NoItems`] when nothing is selected.
    pub fn ensure_has_items(&self) -> Result<(), DraftError> {
        if self.items.is_empty() {
            Err(DraftError::NoItems)
        } else {
            Ok(())
        }
    }

    /// Check the draft can move on to scheduling.
    ///
    /// # Errors
    ///
    /// Returns the first missing prerequisite.
    pub fn ensure_has_address(&self) -> Result<(), DraftError> {
        self.ensure_has_items()?;
        if self.address.is_none() {
            return Err(DraftError::MissingAddress);
        }
        Ok(())
    }

    /// Check the draft is complete enough to commit.
    ///
    /// # Errors
    ///
    /// Returns the first missing prerequisite, or
    /// [`DraftError::DeliveryBeforePickup`] for an inverted schedule.
    pub fn ensure_ready_to_confirm(&self) -> Result<(), DraftError> {
        self.ensure_has_address()?;
        let pickup = self.pickup_date.ok_or(DraftError::MissingPickupDate)?;
        if let Some(delivery) = self.delivery_date
            && delivery < pickup
        {
            return Err(DraftError::DeliveryBeforePickup);
        }
        Ok(())
    }

    /// The date the customer can expect the order back.
    #[must_use]
    pub fn estimated_delivery(&self) -> Option<DateTime<Utc>> {
        self.delivery_date.or(self.pickup_date)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed(name: &str, cents: i64) -> SelectableItem {
        SelectableItem {
            id: ItemId::new(),
            name: name.to_owned(),
            price: Some(Decimal::new(cents, 2)),
            is_custom_price: false,
        }
    }

    #[test]
    fn test_totals_for_two_lines() {
        let shirt = fixed("Shirt", 1000);
        let tie = fixed("Tie", 500);
        let mut draft = OrderDraft::for_service("dry-cleaning");
        draft.change_quantity(&shirt, 2);
        draft.change_quantity(&tie, 1);

        let totals = draft.totals();
        assert_eq!(totals.subtotal, Decimal::new(2500, 2));
        assert_eq!(totals.tax, Decimal::new(525, 2));
        assert_eq!(totals.total, Decimal::new(3025, 2));
    }

    #[test]
    fn test_decrement_below_zero_removes_entry() {
        for (start, delta) in [(0, -1), (1, -1), (1, -5), (3, -3), (2, -100)] {
            let item = fixed("Coat", 2250);
            let mut draft = OrderDraft::default();
            if start > 0 {
                draft.change_quantity(&item, start);
            }

            let outcome = draft.change_quantity(&item, delta);

            assert_eq!(outcome, QuantityOutcome::Updated(0));
            assert!(!draft.items.contains_key(&item.id));
        }
    }

    #[test]
    fn test_partial_decrement_keeps_entry() {
        let item = fixed("Coat", 2250);
        let mut draft = OrderDraft::default();
        draft.change_quantity(&item, 3);
        assert_eq!(draft.change_quantity(&item, -1), QuantityOutcome::Updated(2));
        assert_eq!(draft.items[&item.id].quantity, 2);
    }

    #[test]
    fn test_custom_priced_items_never_touch_the_map() {
        let flagged = SelectableItem {
            is_custom_price: true,
            ..fixed("Wedding dress", 9900)
        };
        let unpriced = SelectableItem {
            price: None,
            ..fixed("Rug", 0)
        };
        let regular = fixed("Shirt", 350);

        let mut draft = OrderDraft::default();
        draft.change_quantity(&regular, 1);
        let before = draft.items.clone();

        for item in [&flagged, &unpriced] {
            for delta in [-3, -1, 0, 1, 7] {
                assert_eq!(
                    draft.change_quantity(item, delta),
                    QuantityOutcome::QuoteRequired
                );
            }
        }
        assert_eq!(draft.items, before);
    }

    #[test]
    fn test_readiness_checks() {
        let mut draft = OrderDraft::default();
        assert_eq!(draft.ensure_has_items(), Err(DraftError::NoItems));

        draft.change_quantity(&fixed("Shirt", 350), 1);
        assert_eq!(draft.ensure_has_address(), Err(DraftError::MissingAddress));

        draft.address = Some(DraftAddress {
            street: "Keizersgracht 12".to_owned(),
            city: "Amsterdam".to_owned(),
            postal_code: "1015 CS".to_owned(),
        });
        assert_eq!(
            draft.ensure_ready_to_confirm(),
            Err(DraftError::MissingPickupDate)
        );

        let pickup = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        draft.pickup_date = Some(pickup);
        draft.delivery_date = Some(pickup - chrono::Duration::days(1));
        assert_eq!(
            draft.ensure_ready_to_confirm(),
            Err(DraftError::DeliveryBeforePickup)
        );

        draft.delivery_date = Some(pickup + chrono::Duration::days(2));
        assert!(draft.ensure_ready_to_confirm().is_ok());
        assert_eq!(draft.estimated_delivery(), draft.delivery_date);
    }

    #[test]
    fn test_draft_json_shape() {
        let item = fixed("Shirt", 350);
        let mut draft = OrderDraft::for_service("wash-and-fold");
        draft.change_quantity(&item, 2);

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["service"], "wash-and-fold");
        assert_eq!(json["items"][item.id.to_string()]["quantity"], 2);
        assert!(json.get("address").is_none());

        let back: OrderDraft = serde_json::from_value(json).unwrap();
        assert_eq!(back, draft);
    }
}
