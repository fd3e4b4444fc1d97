//! Account route handlers.
//!
//! These routes require authentication.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use eazyy_core::{AddressId, OrderDraft, OrderNumber, QuoteId, QuoteStatus};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Address, NewAddress, NewQuote, OrderWithItems, Quote};
use crate::state::AppState;

// =============================================================================
// Addresses
// =============================================================================

/// `GET /api/account/addresses`
pub async fn list_addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = state.addresses().list(user.id).await?;
    Ok(Json(addresses))
}

/// `POST /api/account/addresses`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(address): Json<NewAddress>,
) -> Result<(StatusCode, Json<Address>)> {
    if let Some(field) = address.missing_field() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }

    let created = state.addresses().create(user.id, &address).await?;
    tracing::info!(address_id = %created.id, "Address saved");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /api/account/addresses/{id}/default`
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    state.addresses().set_default(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/account/addresses/{id}`
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    state.addresses().delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Quotes
// =============================================================================

/// `GET /api/account/quotes`
pub async fn list_quotes(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Quote>>> {
    let quotes = state.quotes().list(user.id).await?;
    Ok(Json(quotes))
}

/// `POST /api/account/quotes`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_quote(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(quote): Json<NewQuote>,
) -> Result<(StatusCode, Json<Quote>)> {
    if quote.item_name.trim().is_empty() {
        return Err(AppError::BadRequest("item_name is required".to_owned()));
    }
    if quote.description.trim().is_empty() {
        return Err(AppError::BadRequest("description is required".to_owned()));
    }

    let created = state.quotes().create(user.id, &quote).await?;
    tracing::info!(quote_id = %created.id, "Quote requested");
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Serialize)]
pub struct AcceptQuoteResponse {
    pub quote: Quote,
    /// A fresh draft holding the quoted item, ready for the address step.
    pub draft: OrderDraft,
}

/// `POST /api/account/quotes/{id}/accept`
///
/// Only a `quoted` quote with a price can be accepted.
pub async fn accept_quote(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<QuoteId>,
) -> Result<Json<AcceptQuoteResponse>> {
    let quotes = state.quotes();
    let quote = quotes
        .get(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("quote {id}")))?;

    if quote.status != QuoteStatus::Quoted {
        return Err(AppError::Conflict(format!(
            "Quote is {}, not quoted",
            quote.status.as_str()
        )));
    }
    if quote.to_draft().is_none() {
        return Err(AppError::BadRequest("Quote has no price yet".to_owned()));
    }

    let quote = quotes
        .transition(user.id, id, QuoteStatus::Quoted, QuoteStatus::Accepted)
        .await?
        .ok_or_else(|| AppError::Conflict("Quote changed, please reload".to_owned()))?;
    let draft = quote
        .to_draft()
        .ok_or_else(|| AppError::BadRequest("Quote has no price yet".to_owned()))?;

    tracing::info!(quote_id = %id, "Quote accepted");
    Ok(Json(AcceptQuoteResponse { quote, draft }))
}

/// `POST /api/account/quotes/{id}/decline`
///
/// Pending and quoted quotes can be declined.
pub async fn decline_quote(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<QuoteId>,
) -> Result<Json<Quote>> {
    let quotes = state.quotes();

    for from in [QuoteStatus::Quoted, QuoteStatus::Pending] {
        if let Some(quote) = quotes
            .transition(user.id, id, from, QuoteStatus::Declined)
            .await?
        {
            tracing::info!(quote_id = %id, "Quote declined");
            return Ok(Json(quote));
        }
    }

    match quotes.get(user.id, id).await? {
        Some(quote) => Err(AppError::Conflict(format!(
            "Quote is already {}",
            quote.status.as_str()
        ))),
        None => Err(AppError::NotFound(format!("quote {id}"))),
    }
}

// =============================================================================
// Orders
// =============================================================================

/// `GET /api/account/orders`
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderWithItems>>> {
    let orders = state.orders().list_for_user(user.id).await?;
    Ok(Json(orders))
}

/// `GET /api/account/orders/{number}`
pub async fn get_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(number): Path<String>,
) -> Result<Json<OrderWithItems>> {
    let not_found = || AppError::NotFound(format!("order {number}"));
    let number = OrderNumber::parse(&number).map_err(|_| not_found())?;

    let order = state
        .orders()
        .find_by_number(&number)
        .await?
        .filter(|o| o.user_id == user.id)
        .ok_or_else(not_found)?;
    let items = state.orders().items_for(order.id).await?;

    Ok(Json(OrderWithItems { order, items }))
}
