//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Health check
//! GET  /health/ready                        - Readiness (database)
//!
//! # Catalog
//! GET  /api/services                        - Active services
//! GET  /api/services/{identifier}/categories - Categories of a service
//! GET  /api/categories/{id}/items           - Active items of a category
//! GET  /api/catalog/status                  - Load state and loading flag
//! POST /api/catalog/retry                   - Reload after a failed load
//!
//! # Order flow (draft in, draft out)
//! POST /api/order/items                     - Change an item quantity
//! POST /api/order/address                   - Pick the pickup address
//! POST /api/order/schedule                  - Pick dates and options
//! POST /api/order/confirm                   - Commit the order
//! POST /api/order/skip-payment              - Mark paid (test mode only)
//! GET  /api/order/return                    - Landing after payment
//!
//! # Payment bridge (CORS enabled)
//! POST /api/create-payment                  - Create a payment intent
//! GET  /api/check-payment                   - Check a payment intent
//!
//! # Account (requires auth)
//! GET  /api/account/addresses               - Saved addresses
//! POST /api/account/addresses               - Save an address
//! POST /api/account/addresses/{id}/default  - Make an address the default
//! DEL  /api/account/addresses/{id}          - Delete an address
//! GET  /api/account/quotes                  - Quote requests
//! POST /api/account/quotes                  - Request a quote
//! POST /api/account/quotes/{id}/accept      - Accept a quoted price
//! POST /api/account/quotes/{id}/decline     - Decline a quote
//! GET  /api/account/orders                  - Order history
//! GET  /api/account/orders/{number}         - One order with its items
//!
//! # Auth (rate limited)
//! POST /auth/register                       - Create an account
//! POST /auth/login                          - Log in
//! POST /auth/logout                         - Log out
//! GET  /auth/me                             - Current user
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod order;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .layer(auth_rate_limiter())
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/services", get(catalog::services))
        .route(
            "/services/{identifier}/categories",
            get(catalog::service_categories),
        )
        .route("/categories/{id}/items", get(catalog::category_items))
        .route("/catalog/status", get(catalog::status))
        .route("/catalog/retry", post(catalog::retry))
}

/// Create the order flow routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/items", post(order::change_quantity))
        .route("/address", post(order::select_address))
        .route("/schedule", post(order::schedule))
        .route("/confirm", post(order::confirm))
        .route("/skip-payment", post(order::skip_payment))
        .route("/return", get(order::payment_return))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    use axum::routing::delete;

    Router::new()
        .route(
            "/addresses",
            get(account::list_addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}/default",
            post(account::set_default_address),
        )
        .route("/addresses/{id}", delete(account::delete_address))
        .route(
            "/quotes",
            get(account::list_quotes).post(account::create_quote),
        )
        .route("/quotes/{id}/accept", post(account::accept_quote))
        .route("/quotes/{id}/decline", post(account::decline_quote))
        .route("/orders", get(account::list_orders))
        .route("/orders/{number}", get(account::get_order))
}

/// Create all routes for the storefront.
///
/// The session layer is added by the caller.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest(
            "/api",
            catalog_routes()
                .nest("/order", order_routes())
                .nest("/account", account_routes())
                .merge(api::payment::routes()),
        )
        .nest("/auth", auth_routes())
}
