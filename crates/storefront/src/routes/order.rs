//! The multi-step order flow.
//!
//! Every step takes the current [`OrderDraft`] in the request body and
//! returns the updated draft; nothing is written to the orders tables until
//! `confirm`.
//!
//! ```text
//! items -> address -> schedule -> confirm -> (create-payment | skip-payment) -> return
//! ```

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use eazyy_core::{
    AddressId, DraftAddress, ItemId, ORDER_CURRENCY, OrderDraft, OrderNumber, OrderTotals,
    QuantityOutcome, to_minor_units,
};

use crate::checkout::{CommitOutcome, park_draft};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::Order;
use crate::routes::api::payment::{OrderDetails, committed_order};
use crate::services::{IntentStatus, PaymentIntent};
use crate::state::AppState;

/// Where the client sends customers to request a quote.
pub const QUOTE_REQUEST_PATH: &str = "/account/quotes/new";

/// Default return path after logging in from the confirmation step.
pub const CONFIRMATION_PATH: &str = "/order/confirmation";

/// Where to send the customer to log in.
pub const LOGIN_PATH: &str = "/login";

/// A draft with its derived totals.
#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft: OrderDraft,
    pub totals: OrderTotals,
}

impl From<OrderDraft> for DraftResponse {
    fn from(draft: OrderDraft) -> Self {
        let totals = draft.totals();
        Self { draft, totals }
    }
}

// =============================================================================
// Items
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChangeQuantityRequest {
    #[serde(default)]
    pub draft: OrderDraft,
    pub item_id: ItemId,
    pub delta: i64,
    /// Path to come back to from the quote form.
    pub return_to: Option<String>,
}

/// Item summary handed to the quote form.
#[derive(Debug, Serialize)]
pub struct QuoteItem {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChangeQuantityResponse {
    Updated {
        quantity: u32,
        #[serde(flatten)]
        draft: DraftResponse,
    },
    /// The item is custom-priced; the draft is returned unchanged.
    QuoteRequired {
        redirect: &'static str,
        item: QuoteItem,
        return_to: String,
        #[serde(flatten)]
        draft: DraftResponse,
    },
}

/// `POST /api/order/items`
pub async fn change_quantity(
    State(state): State<AppState>,
    Json(body): Json<ChangeQuantityRequest>,
) -> Result<Json<ChangeQuantityResponse>> {
    let item = state
        .catalog()
        .item(body.item_id)
        .filter(|i| i.status)
        .ok_or_else(|| AppError::NotFound(format!("item {}", body.item_id)))?;

    let mut draft = body.draft;
    if draft.service.is_none() {
        let snapshot = state.catalog().snapshot();
        draft.service = snapshot
            .categories
            .iter()
            .find(|c| c.id == item.category_id)
            .and_then(|c| snapshot.services.iter().find(|s| s.id == c.service_id))
            .map(|s| s.service_identifier.clone());
    }

    let response = match draft.change_quantity(&item.selectable(), body.delta) {
        QuantityOutcome::Updated(quantity) => ChangeQuantityResponse::Updated {
            quantity,
            draft: draft.into(),
        },
        QuantityOutcome::QuoteRequired => {
            let return_to = body.return_to.unwrap_or_else(|| {
                draft
                    .service
                    .as_deref()
                    .map_or_else(|| "/order".to_owned(), |s| format!("/order/items/{s}"))
            });
            ChangeQuantityResponse::QuoteRequired {
                redirect: QUOTE_REQUEST_PATH,
                item: QuoteItem {
                    id: item.id,
                    name: item.name,
                    description: item.description,
                },
                return_to,
                draft: draft.into(),
            }
        }
    };

    Ok(Json(response))
}

// =============================================================================
// Address
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SelectAddressRequest {
    pub draft: OrderDraft,
    /// A saved address of the logged-in user.
    pub address_id: Option<AddressId>,
    /// An address typed in directly.
    pub address: Option<DraftAddress>,
}

/// `POST /api/order/address`
pub async fn select_address(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Json(body): Json<SelectAddressRequest>,
) -> Result<Json<DraftResponse>> {
    let mut draft = body.draft;
    draft.ensure_has_items()?;

    let address = match (body.address_id, body.address) {
        (Some(id), _) => {
            let user = user.ok_or_else(|| {
                AppError::Unauthorized("Log in to use a saved address".to_owned())
            })?;
            state
                .addresses()
                .get(user.id, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("address {id}")))?
                .to_draft()
        }
        (None, Some(address)) => {
            if [&address.street, &address.city, &address.postal_code]
                .iter()
                .any(|v| v.trim().is_empty())
            {
                return Err(AppError::BadRequest(
                    "street, city and postal_code are required".to_owned(),
                ));
            }
            address
        }
        (None, None) => return Err(AppError::BadRequest("No address given".to_owned())),
    };

    draft.address = Some(address);
    Ok(Json(draft.into()))
}

// =============================================================================
// Schedule
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub draft: OrderDraft,
    pub pickup_date: DateTime<Utc>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub pickup_option: Option<String>,
    pub delivery_option: Option<String>,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    #[serde(flatten)]
    pub draft: DraftResponse,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// `POST /api/order/schedule`
pub async fn schedule(Json(body): Json<ScheduleRequest>) -> Result<Json<ScheduleResponse>> {
    let mut draft = body.draft;
    draft.ensure_has_address()?;

    draft.pickup_date = Some(body.pickup_date);
    draft.delivery_date = body.delivery_date;
    draft.pickup_option = body.pickup_option;
    draft.delivery_option = body.delivery_option;
    draft.special_instructions = body
        .special_instructions
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty());
    draft.ensure_ready_to_confirm()?;

    let estimated_delivery = draft.estimated_delivery();
    Ok(Json(ScheduleResponse {
        draft: draft.into(),
        estimated_delivery,
    }))
}

// =============================================================================
// Confirm
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub draft: OrderDraft,
    pub return_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    /// The draft with its reserved order number.
    pub draft: OrderDraft,
    pub order: Order,
    /// `false` when the order already existed from an earlier confirm.
    pub created: bool,
    /// Whether `skip-payment` is available.
    pub test_mode: bool,
}

/// `POST /api/order/confirm`
///
/// Anonymous callers get `401` and their draft is parked in the session until
/// they log in.
#[instrument(skip_all)]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(body): Json<ConfirmRequest>,
) -> Result<Response> {
    let mut draft = body.draft;
    draft.ensure_ready_to_confirm()?;

    let Some(user) = user else {
        let return_to = body
            .return_to
            .unwrap_or_else(|| CONFIRMATION_PATH.to_owned());
        park_draft(&session, &return_to, &draft).await?;
        add_breadcrumb("checkout", "Draft parked for login", None);
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "Authentication required",
                "login": LOGIN_PATH,
                "return_to": return_to,
            })),
        )
            .into_response());
    };

    let outcome = state.committer().commit(&mut draft, &user).await?;
    let created = matches!(outcome, CommitOutcome::Created(_));
    add_breadcrumb(
        "checkout",
        "Order confirmed",
        Some(&[("order_number", outcome.order().order_number.as_str())]),
    );

    Ok(Json(ConfirmResponse {
        draft,
        order: outcome.into_order(),
        created,
        test_mode: state.config().stripe.test_mode,
    })
    .into_response())
}

// =============================================================================
// Payment completion
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SkipPaymentRequest {
    pub order_number: OrderNumber,
}

/// `POST /api/order/skip-payment`
///
/// Marks an order paid without the processor. Only available in test mode.
#[instrument(skip_all)]
pub async fn skip_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<SkipPaymentRequest>,
) -> Result<Json<OrderDetails>> {
    if !state.config().stripe.test_mode {
        return Err(AppError::NotFound("skip-payment".to_owned()));
    }

    let owned = state
        .orders()
        .find_by_number(&body.order_number)
        .await?
        .is_some_and(|o| o.user_id == user.id);
    if !owned {
        return Err(AppError::NotFound(format!("order {}", body.order_number)));
    }

    let order = state
        .orders()
        .mark_paid(&body.order_number, "test")
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {}", body.order_number)))?;

    tracing::info!(order_number = %order.order_number, "Payment skipped in test mode");
    Ok(Json(OrderDetails::for_order(&order)))
}

#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    pub payment_intent: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReturnResponse {
    pub success: bool,
    pub status: IntentStatus,
    pub order_details: Option<OrderDetails>,
}

/// `GET /api/order/return?payment_intent=<id>`
///
/// Landing step after the processor's redirect. A `succeeded` intent marks
/// the order paid by card, but only when it charged the order's full total
/// in euros. Anything else is reported as a failure and leaves the order
/// unpaid.
#[instrument(skip_all)]
pub async fn payment_return(
    State(state): State<AppState>,
    Query(query): Query<ReturnQuery>,
) -> Result<Json<PaymentReturnResponse>> {
    let id = query
        .payment_intent
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("No payment intent ID found".to_owned()))?;

    let intent = state.payments().retrieve_intent(id.trim()).await?;
    let failed = |intent: PaymentIntent| {
        Json(PaymentReturnResponse {
            success: false,
            status: intent.status,
            order_details: None,
        })
    };

    if !intent.status.is_succeeded() {
        tracing::info!(intent_id = %intent.id, status = ?intent.status, "Payment not successful");
        return Ok(failed(intent));
    }

    let Some(order) = committed_order(&state, &intent).await else {
        tracing::warn!(intent_id = %intent.id, "Paid intent without a committed order");
        return Ok(failed(intent));
    };

    if !covers_order(&intent, &order) {
        tracing::warn!(
            intent_id = %intent.id,
            order_number = %order.order_number,
            amount = intent.amount,
            currency = %intent.currency,
            total = %order.total_amount,
            "Paid intent does not match the order total"
        );
        return Ok(failed(intent));
    }

    let order = state
        .orders()
        .mark_paid(&order.order_number, "card")
        .await?
        .unwrap_or(order);

    Ok(Json(PaymentReturnResponse {
        success: true,
        status: intent.status,
        order_details: Some(OrderDetails::for_intent(&intent, Some(&order))),
    }))
}

/// Whether the intent charged exactly the order's total in euros.
fn covers_order(intent: &PaymentIntent, order: &Order) -> bool {
    intent.currency.eq_ignore_ascii_case(ORDER_CURRENCY)
        && to_minor_units(order.total_amount) == Some(intent.amount)
}
