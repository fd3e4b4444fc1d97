//! Accounts, saved addresses and the login checkpoint against a live server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`eazyy-cli migrate`)
//! - A seeded catalog (`eazyy-cli seed catalog`)
//! - The storefront running (`cargo run -p eazyy-storefront`) with
//!   `PAYMENT_TEST_MODE=true`
//!
//! Run with: `cargo test -p eazyy-integration-tests -- --ignored`

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

fn unique_email() -> String {
    format!("live-{}@example.nl", Uuid::new_v4().simple())
}

async fn register(client: &Client, email: &str) -> Value {
    let resp = client
        .post(format!("{}/auth/register", base_url()))
        .json(&json!({
            "email": email,
            "password": "wasgoed-2026",
            "first_name": "Live",
            "last_name": "Tester",
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to read registration")
}

/// First seeded item with a fixed price.
async fn priced_item(client: &Client) -> Value {
    let base_url = base_url();
    let services: Vec<Value> = client
        .get(format!("{base_url}/api/services"))
        .send()
        .await
        .expect("Failed to list services")
        .json()
        .await
        .expect("Failed to read services");

    for service in &services {
        let identifier = service["service_identifier"].as_str().unwrap_or_default();
        let categories: Vec<Value> = client
            .get(format!("{base_url}/api/services/{identifier}/categories"))
            .send()
            .await
            .expect("Failed to list categories")
            .json()
            .await
            .expect("Failed to read categories");

        for category in &categories {
            let items: Vec<Value> = client
                .get(format!("{base_url}/api/categories/{}/items", category["id"].as_str().unwrap_or_default()))
                .send()
                .await
                .expect("Failed to list items")
                .json()
                .await
                .expect("Failed to read items");
            if let Some(item) = items.into_iter().find(|i| i["is_custom_price"] == false) {
                return item;
            }
        }
    }
    panic!("seeded catalog has no priced item");
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_readiness() {
    let resp = client()
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to check readiness");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_register_login_logout() {
    let client = client();
    let base_url = base_url();
    let email = unique_email();

    let registered = register(&client, &email).await;
    assert_eq!(registered["user"]["email"], email.as_str());
    assert_eq!(registered["checkpoint"]["order_draft"], Value::Null);

    let again = client
        .post(format!("{base_url}/auth/register"))
        .json(&json!({ "email": email, "password": "wasgoed-2026" }))
        .send()
        .await
        .expect("Failed to register twice");
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let resp = client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let me: Value = client
        .get(format!("{base_url}/auth/me"))
        .send()
        .await
        .expect("Failed to fetch me")
        .json()
        .await
        .expect("Failed to read me");
    assert_eq!(me["user"], Value::Null);

    let wrong = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({ "email": email, "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to attempt login");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .json(&json!({ "email": email, "password": "wasgoed-2026" }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_short_password_rejected() {
    let resp = client()
        .post(format!("{}/auth/register", base_url()))
        .json(&json!({ "email": unique_email(), "password": "kort" }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Addresses
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_saved_address_feeds_the_draft() {
    let client = client();
    let base_url = base_url();
    register(&client, &unique_email()).await;

    let missing = client
        .post(format!("{base_url}/api/account/addresses"))
        .json(&json!({ "street": "Damrak", "house_number": "", "city": "Amsterdam", "postal_code": "1012 LG" }))
        .send()
        .await
        .expect("Failed to post address");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let created: Value = client
        .post(format!("{base_url}/api/account/addresses"))
        .json(&json!({
            "name": "Home",
            "street": "Damrak",
            "house_number": "1",
            "city": "Amsterdam",
            "postal_code": "1012 LG",
        }))
        .send()
        .await
        .expect("Failed to save address")
        .json()
        .await
        .expect("Failed to read address");
    let address_id = created["id"].as_str().expect("address id").to_owned();

    let item = priced_item(&client).await;
    let step: Value = client
        .post(format!("{base_url}/api/order/items"))
        .json(&json!({ "item_id": item["id"], "delta": 1 }))
        .send()
        .await
        .expect("Failed to add item")
        .json()
        .await
        .expect("Failed to read draft");

    let addressed: Value = client
        .post(format!("{base_url}/api/order/address"))
        .json(&json!({ "draft": step["draft"], "address_id": address_id }))
        .send()
        .await
        .expect("Failed to select address")
        .json()
        .await
        .expect("Failed to read draft");
    assert_eq!(addressed["draft"]["address"]["street"], "Damrak 1");
    assert_eq!(addressed["draft"]["address"]["postal_code"], "1012 LG");

    let resp = client
        .delete(format!("{base_url}/api/account/addresses/{address_id}"))
        .send()
        .await
        .expect("Failed to delete address");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// ============================================================================
// Login checkpoint
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_parked_draft_survives_registration() {
    let client = client();
    let base_url = base_url();
    let item = priced_item(&client).await;

    let step: Value = client
        .post(format!("{base_url}/api/order/items"))
        .json(&json!({ "item_id": item["id"], "delta": 2 }))
        .send()
        .await
        .expect("Failed to add item")
        .json()
        .await
        .expect("Failed to read draft");
    let addressed: Value = client
        .post(format!("{base_url}/api/order/address"))
        .json(&json!({
            "draft": step["draft"],
            "address": { "street": "Damrak 1", "city": "Amsterdam", "postal_code": "1012 LG" },
        }))
        .send()
        .await
        .expect("Failed to set address")
        .json()
        .await
        .expect("Failed to read draft");
    let scheduled: Value = client
        .post(format!("{base_url}/api/order/schedule"))
        .json(&json!({ "draft": addressed["draft"], "pickup_date": "2026-11-02T09:00:00Z" }))
        .send()
        .await
        .expect("Failed to schedule")
        .json()
        .await
        .expect("Failed to read draft");

    let parked = client
        .post(format!("{base_url}/api/order/confirm"))
        .json(&json!({ "draft": scheduled["draft"] }))
        .send()
        .await
        .expect("Failed to confirm");
    assert_eq!(parked.status(), StatusCode::UNAUTHORIZED);

    let registered = register(&client, &unique_email()).await;
    assert_eq!(registered["checkpoint"]["return_to"], "/order/confirmation");
    assert_eq!(registered["checkpoint"]["order_draft"], scheduled["draft"]);

    let confirmed: Value = client
        .post(format!("{base_url}/api/order/confirm"))
        .json(&json!({ "draft": registered["checkpoint"]["order_draft"] }))
        .send()
        .await
        .expect("Failed to confirm after login")
        .json()
        .await
        .expect("Failed to read confirmation");
    assert_eq!(confirmed["created"], true);
    let number = confirmed["order"]["order_number"].clone();

    let paid: Value = client
        .post(format!("{base_url}/api/order/skip-payment"))
        .json(&json!({ "order_number": number }))
        .send()
        .await
        .expect("Failed to skip payment")
        .json()
        .await
        .expect("Failed to read order details");
    assert_eq!(paid["orderNumber"], number);

    let orders: Vec<Value> = client
        .get(format!("{base_url}/api/account/orders"))
        .send()
        .await
        .expect("Failed to list orders")
        .json()
        .await
        .expect("Failed to read orders");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["payment_status"], "paid");
}

// ============================================================================
// Quotes
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_quote_request_and_decline() {
    let client = client();
    let base_url = base_url();
    register(&client, &unique_email()).await;

    let created = client
        .post(format!("{base_url}/api/account/quotes"))
        .json(&json!({
            "item_name": "Wedding dress",
            "description": "Silk, lace train",
            "urgency": "express",
        }))
        .send()
        .await
        .expect("Failed to request quote");
    assert_eq!(created.status(), StatusCode::CREATED);
    let quote: Value = created.json().await.expect("Failed to read quote");
    assert_eq!(quote["status"], "pending");
    let id = quote["id"].as_str().expect("quote id").to_owned();

    let accept = client
        .post(format!("{base_url}/api/account/quotes/{id}/accept"))
        .send()
        .await
        .expect("Failed to accept quote");
    assert_eq!(accept.status(), StatusCode::CONFLICT);

    let decline: Value = client
        .post(format!("{base_url}/api/account/quotes/{id}/decline"))
        .send()
        .await
        .expect("Failed to decline quote")
        .json()
        .await
        .expect("Failed to read quote");
    assert_eq!(decline["status"], "declined");

    let again = client
        .post(format!("{base_url}/api/account/quotes/{id}/decline"))
        .send()
        .await
        .expect("Failed to decline twice");
    assert_eq!(again.status(), StatusCode::CONFLICT);
}
