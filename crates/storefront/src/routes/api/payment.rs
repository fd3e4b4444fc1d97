//! Payment bridge: create and verify Stripe payment intents.
//!
//! Both endpoints answer every failure, including validation, with
//! `500 {"error": "<message>"}` and carry permissive CORS headers.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::instrument;

use eazyy_core::{OrderNumber, from_minor_units, to_minor_units};

use crate::models::Order;
use crate::services::{CreateIntent, IntentMetadata, PaymentError, PaymentIntent};
use crate::state::AppState;

/// Customer name sent to the processor when none is given.
const DEFAULT_CUSTOMER_NAME: &str = "Guest";

/// Payment routes, mounted under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/create-payment",
            post(create_payment).layer(cors(Method::POST)),
        )
        .route("/check-payment", get(check_payment).layer(cors(Method::GET)))
}

fn cors(method: Method) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([method, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// Errors
// =============================================================================

/// Error answered as `500 {"error": message}`.
#[derive(Debug)]
pub struct BridgeError(pub String);

impl BridgeError {
    fn payment(err: &PaymentError, fallback: &str) -> Self {
        tracing::error!(error = %err, "Payment processor call failed");
        match err {
            PaymentError::Api { message, .. } => Self(message.clone()),
            PaymentError::Http(_) | PaymentError::Parse(_) => Self(fallback.to_owned()),
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0 })),
        )
            .into_response()
    }
}

// =============================================================================
// Create
// =============================================================================

/// Metadata as sent by the checkout page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetadata {
    pub order_number: Option<String>,
    pub customer_name: Option<String>,
    pub email: Option<String>,
}

/// Body of `POST /api/create-payment`.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Major currency units, e.g. `30.25`.
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<PaymentMetadata>,
}

impl CreatePaymentRequest {
    /// The processor request, or `None` when a required field is missing.
    fn to_intent(&self) -> Option<CreateIntent> {
        let amount = self.amount.filter(|a| *a > Decimal::ZERO)?;
        let currency = self.currency.as_deref().map(str::trim).filter(|c| !c.is_empty())?;
        let description = self.description.as_deref().filter(|d| !d.is_empty())?;
        let metadata = self.metadata.as_ref();

        Some(CreateIntent {
            amount: to_minor_units(amount)?,
            currency: currency.to_lowercase(),
            description: description.to_owned(),
            metadata: IntentMetadata {
                order_number: non_empty(metadata.and_then(|m| m.order_number.as_ref()))
                    .unwrap_or_default(),
                customer_name: non_empty(metadata.and_then(|m| m.customer_name.as_ref()))
                    .unwrap_or_else(|| DEFAULT_CUSTOMER_NAME.to_owned()),
                email: non_empty(metadata.and_then(|m| m.email.as_ref())).unwrap_or_default(),
            },
        })
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub client_secret: Option<String>,
}

/// Create a payment intent and hand its client secret to the checkout page.
#[instrument(skip(state, body))]
pub async fn create_payment(
    State(state): State<AppState>,
    body: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<Json<CreatePaymentResponse>, BridgeError> {
    let Json(body) = body.map_err(|e| BridgeError(e.body_text()))?;
    let request = body
        .to_intent()
        .ok_or_else(|| BridgeError("Missing required payment fields".to_owned()))?;

    let intent = state
        .payments()
        .create_intent(&request)
        .await
        .map_err(|e| BridgeError::payment(&e, "Payment creation failed"))?;

    tracing::info!(
        intent_id = %intent.id,
        order_number = %request.metadata.order_number,
        "Payment intent created"
    );

    Ok(Json(CreatePaymentResponse {
        client_secret: intent.client_secret,
    }))
}

// =============================================================================
// Check
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckPaymentQuery {
    pub payment_intent: Option<String>,
}

/// Order facts shown after payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub order_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub estimated_delivery: DateTime<Utc>,
}

impl OrderDetails {
    /// Details for an intent, preferring the committed order's delivery date.
    #[must_use]
    pub fn for_intent(intent: &PaymentIntent, order: Option<&Order>) -> Self {
        Self {
            order_number: intent.order_number().unwrap_or_default().to_owned(),
            total_amount: from_minor_units(intent.amount),
            estimated_delivery: order.map_or_else(Utc::now, |o| o.estimated_delivery),
        }
    }

    #[must_use]
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_number: order.order_number.to_string(),
            total_amount: order.total_amount,
            estimated_delivery: order.estimated_delivery,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPaymentResponse {
    pub status: crate::services::IntentStatus,
    pub order_details: OrderDetails,
}

/// Look up an intent and the order it pays for.
#[instrument(skip(state, query))]
pub async fn check_payment(
    State(state): State<AppState>,
    Query(query): Query<CheckPaymentQuery>,
) -> Result<Json<CheckPaymentResponse>, BridgeError> {
    let id = query
        .payment_intent
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| BridgeError("Payment intent ID is required".to_owned()))?;

    let intent = state
        .payments()
        .retrieve_intent(id.trim())
        .await
        .map_err(|e| BridgeError::payment(&e, "Payment check failed"))?;

    let order = committed_order(&state, &intent).await;

    Ok(Json(CheckPaymentResponse {
        status: intent.status,
        order_details: OrderDetails::for_intent(&intent, order.as_ref()),
    }))
}

/// The order named in the intent metadata, if it parses and exists.
///
/// Lookup failures are logged and treated as missing.
pub async fn committed_order(state: &AppState, intent: &PaymentIntent) -> Option<Order> {
    let number = OrderNumber::parse(intent.order_number()?).ok()?;
    match state.orders().find_by_number(&number).await {
        Ok(order) => order,
        Err(e) => {
            tracing::warn!(error = %e, order_number = %number, "Order lookup failed");
            None
        }
    }
}
