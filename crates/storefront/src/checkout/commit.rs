//! Exactly-once persistence of a confirmed draft.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use eazyy_core::{DraftError, OrderDraft, OrderNumber};

use super::number::generate_order_number;
use super::pricing::{Pricer, PricingError};
use crate::db::{OrderStore, RepositoryError};
use crate::models::{CurrentUser, NewOrder, NewOrderItem, Order};
use crate::services::{GeocodeError, Geocoder};

/// Errors from committing an order.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("could not locate the pickup address: {0}")]
    Geocode(#[from] GeocodeError),

    /// Another commit inserted this number between the check and the insert.
    #[error("order number {0} is already in use")]
    DuplicateOrderNumber(OrderNumber),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("quantity of {0} is too large")]
    QuantityOverflow(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What a commit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Created(Order),
    /// An order with the draft's number already existed; nothing was written.
    AlreadyCommitted(Order),
}

impl CommitOutcome {
    #[must_use]
    pub const fn order(&self) -> &Order {
        match self {
            Self::Created(order) | Self::AlreadyCommitted(order) => order,
        }
    }

    #[must_use]
    pub fn into_order(self) -> Order {
        match self {
            Self::Created(order) | Self::AlreadyCommitted(order) => order,
        }
    }
}

/// Turns drafts into orders.
#[derive(Clone)]
pub struct OrderCommitter {
    orders: Arc<dyn OrderStore>,
    pricer: Pricer,
    geocoder: Arc<dyn Geocoder>,
    prefix: String,
}

impl OrderCommitter {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        pricer: Pricer,
        geocoder: Arc<dyn Geocoder>,
        prefix: &str,
    ) -> Self {
        Self {
            orders,
            pricer,
            geocoder,
            prefix: prefix.to_owned(),
        }
    }

    /// The draft's order number, generating and storing one if it has none.
    pub async fn reserve_number(&self, draft: &mut OrderDraft) -> OrderNumber {
        if let Some(number) = &draft.order_number {
            return number.clone();
        }
        let number = generate_order_number(self.orders.as_ref(), &self.prefix).await;
        draft.order_number = Some(number.clone());
        number
    }

    /// Persist the draft as an order owned by `customer`.
    ///
    /// A draft whose number already has an order is reported as
    /// [`CommitOutcome::AlreadyCommitted`] without writing anything. Otherwise
    /// the draft's lines are re-priced in place before the rows are built.
    ///
    /// # Errors
    ///
    /// - `CommitError::Draft` if the draft is incomplete
    /// - `CommitError::Pricing` if a line cannot be sold at a trusted price
    /// - `CommitError::Geocode` if the pickup address cannot be placed
    /// - `CommitError::DuplicateOrderNumber` if a concurrent commit won the number
    #[instrument(skip_all, fields(user_id = %customer.id))]
    pub async fn commit(
        &self,
        draft: &mut OrderDraft,
        customer: &CurrentUser,
    ) -> Result<CommitOutcome, CommitError> {
        draft.ensure_ready_to_confirm()?;
        let number = self.reserve_number(draft).await;

        if let Some(existing) = self.orders.find_by_number(&number).await? {
            if existing.user_id != customer.id {
                return Err(CommitError::DuplicateOrderNumber(number));
            }
            info!(order_number = %number, "Order already committed");
            return Ok(CommitOutcome::AlreadyCommitted(existing));
        }

        self.pricer.reprice(draft, customer.id).await?;
        let (order, items) = build_rows(draft, customer, number.clone())?;
        let coordinates = self.geocoder.geocode(&order.shipping_address).await?;
        let order = NewOrder {
            latitude: coordinates.lat.to_string(),
            longitude: coordinates.lng.to_string(),
            ..order
        };

        match self.orders.insert_with_items(&order, &items).await {
            Ok(created) => {
                info!(order_number = %number, items = items.len(), "Order committed");
                Ok(CommitOutcome::Created(created))
            }
            Err(RepositoryError::Conflict(_)) => Err(CommitError::DuplicateOrderNumber(number)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Order and item rows for a validated draft, without coordinates.
fn build_rows(
    draft: &OrderDraft,
    customer: &CurrentUser,
    number: OrderNumber,
) -> Result<(NewOrder, Vec<NewOrderItem>), CommitError> {
    let address = draft
        .address
        .as_ref()
        .ok_or(DraftError::MissingAddress)?
        .one_line();
    let pickup_date = draft.pickup_date.ok_or(DraftError::MissingPickupDate)?;
    let totals = draft.totals();

    let items = draft
        .items
        .values()
        .map(|item| {
            Ok(NewOrderItem {
                product_id: item.id,
                product_name: item.name.clone(),
                quantity: i32::try_from(item.quantity)
                    .map_err(|_| CommitError::QuantityOverflow(item.name.clone()))?,
                unit_price: item.price,
                subtotal: item.line_total(),
            })
        })
        .collect::<Result<Vec<_>, CommitError>>()?;

    let order = NewOrder {
        order_number: number,
        user_id: customer.id,
        customer_name: customer.full_name().unwrap_or_default(),
        email: customer.email.to_string(),
        phone: customer.phone.clone(),
        shipping_address: address,
        shipping_method: draft.pickup_option.clone(),
        pickup_date,
        delivery_date: draft.delivery_date,
        special_instructions: draft.special_instructions.clone(),
        subtotal: totals.subtotal,
        tax: totals.tax,
        shipping_fee: totals.shipping_fee,
        total_amount: totals.total,
        latitude: String::new(),
        longitude: String::new(),
    };

    Ok((order, items))
}
