//! Saved addresses and quote requests through the account endpoints.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use eazyy_core::{QuoteId, QuoteStatus};
use eazyy_integration_tests::{TestApp, TestClient, sample_user};

async fn logged_in(app: &TestApp) -> TestClient {
    let cookie = app.login_as(&sample_user()).await;
    TestClient::new(app).with_cookie(cookie)
}

fn home() -> Value {
    json!({
        "name": "Home",
        "street": "Prinsengracht",
        "house_number": "263",
        "city": "Amsterdam",
        "postal_code": "1016 GV",
    })
}

fn office() -> Value {
    json!({
        "name": "Office",
        "street": "Damrak",
        "house_number": "1",
        "additional_info": "3rd floor",
        "city": "Amsterdam",
        "postal_code": "1012 LG",
    })
}

async fn request_quote(client: &mut TestClient) -> QuoteId {
    let resp = client
        .post(
            "/api/account/quotes",
            &json!({
                "item_name": "Wedding dress",
                "description": "Silk, lace train",
                "urgency": "express",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    assert_eq!(resp.body["status"], "pending");
    resp.body["id"].as_str().unwrap().parse().unwrap()
}

// =============================================================================
// Addresses
// =============================================================================

#[tokio::test]
async fn test_first_address_becomes_default() {
    let app = TestApp::new().await;
    let mut client = logged_in(&app).await;

    let first = client.post("/api/account/addresses", &home()).await;
    assert_eq!(first.status, StatusCode::CREATED, "{:?}", first.body);
    assert_eq!(first.body["is_default"], true);

    let second = client.post("/api/account/addresses", &office()).await;
    assert_eq!(second.status, StatusCode::CREATED);
    assert_eq!(second.body["is_default"], false);

    let list = client.get("/api/account/addresses").await;
    assert_eq!(list.body.as_array().unwrap().len(), 2);
    assert_eq!(list.body[0]["name"], "Home");

    let office_id = second.body["id"].as_str().unwrap();
    let resp = client
        .post(
            &format!("/api/account/addresses/{office_id}/default"),
            &json!({}),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let list = client.get("/api/account/addresses").await;
    assert_eq!(list.body[0]["name"], "Office");
    assert_eq!(list.body[0]["is_default"], true);
    assert_eq!(list.body[1]["is_default"], false);
}

#[tokio::test]
async fn test_address_validation_and_delete() {
    let app = TestApp::new().await;
    let mut client = logged_in(&app).await;

    let mut incomplete = home();
    incomplete["house_number"] = json!(" ");
    let resp = client.post("/api/account/addresses", &incomplete).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "house_number is required");

    let created = client.post("/api/account/addresses", &home()).await;
    let uri = format!(
        "/api/account/addresses/{}",
        created.body["id"].as_str().unwrap()
    );
    assert_eq!(client.delete(&uri).await.status, StatusCode::NO_CONTENT);
    assert_eq!(client.delete(&uri).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_addresses_are_private() {
    let app = TestApp::new().await;
    let mut owner = logged_in(&app).await;
    let created = owner.post("/api/account/addresses", &home()).await;
    let id = created.body["id"].as_str().unwrap().to_owned();

    let mut stranger = logged_in(&app).await;
    assert_eq!(
        stranger.get("/api/account/addresses").await.body,
        json!([])
    );
    let resp = stranger
        .post(&format!("/api/account/addresses/{id}/default"), &json!({}))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    let resp = stranger
        .delete(&format!("/api/account/addresses/{id}"))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let mut anonymous = TestClient::new(&app);
    let resp = anonymous.get("/api/account/addresses").await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_saved_address_feeds_the_draft() {
    let app = TestApp::new().await;
    let mut client = logged_in(&app).await;
    let created = client.post("/api/account/addresses", &office()).await;
    let shirt = app.catalog.item("Shirt").id.to_string();

    let step = client
        .post(
            "/api/order/items",
            &json!({ "item_id": shirt, "delta": 1 }),
        )
        .await;
    let resp = client
        .post(
            "/api/order/address",
            &json!({ "draft": step.body["draft"], "address_id": created.body["id"] }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    assert_eq!(resp.body["draft"]["address"]["street"], "Damrak 1, 3rd floor");
    assert_eq!(resp.body["draft"]["address"]["postal_code"], "1012 LG");
}

// =============================================================================
// Quotes
// =============================================================================

#[tokio::test]
async fn test_pending_quote_cannot_be_accepted() {
    let app = TestApp::new().await;
    let mut client = logged_in(&app).await;
    let id = request_quote(&mut client).await;

    let resp = client
        .post(&format!("/api/account/quotes/{id}/accept"), &json!({}))
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body["error"], "Quote is pending, not quoted");
    assert_eq!(app.quotes.status(id), Some(QuoteStatus::Pending));
}

#[tokio::test]
async fn test_unpriced_quote_cannot_be_accepted() {
    let app = TestApp::new().await;
    let mut client = logged_in(&app).await;
    let id = request_quote(&mut client).await;
    app.quotes.offer(id, None);

    let resp = client
        .post(&format!("/api/account/quotes/{id}/accept"), &json!({}))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "Quote has no price yet");
    assert_eq!(app.quotes.status(id), Some(QuoteStatus::Quoted));
}

#[tokio::test]
async fn test_decline_once() {
    let app = TestApp::new().await;
    let mut client = logged_in(&app).await;
    let id = request_quote(&mut client).await;

    let declined = client
        .post(&format!("/api/account/quotes/{id}/decline"), &json!({}))
        .await;
    assert_eq!(declined.status, StatusCode::OK, "{:?}", declined.body);
    assert_eq!(declined.body["status"], "declined");

    let again = client
        .post(&format!("/api/account/quotes/{id}/decline"), &json!({}))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["error"], "Quote is already declined");

    let unknown = client
        .post(
            &format!("/api/account/quotes/{}/decline", QuoteId::new()),
            &json!({}),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_accepted_quote_orders_at_quoted_price() {
    let app = TestApp::new().await;
    let mut client = logged_in(&app).await;
    let id = request_quote(&mut client).await;
    app.quotes.offer(id, Some(Decimal::new(4500, 2)));

    let listed = client.get("/api/account/quotes").await;
    assert_eq!(listed.body[0]["status"], "quoted");
    assert_eq!(listed.body[0]["admin_price"], "45.00");

    let accepted = client
        .post(&format!("/api/account/quotes/{id}/accept"), &json!({}))
        .await;
    assert_eq!(accepted.status, StatusCode::OK, "{:?}", accepted.body);
    assert_eq!(accepted.body["quote"]["status"], "accepted");
    assert_eq!(accepted.body["draft"]["service"], "custom");
    assert_eq!(app.quotes.status(id), Some(QuoteStatus::Accepted));

    let mut draft = accepted.body["draft"].clone();
    draft["items"][id.to_string()]["price"] = json!("0.01");
    let addressed = client
        .post(
            "/api/order/address",
            &json!({
                "draft": draft,
                "address": {
                    "street": "Prinsengracht 263",
                    "city": "Amsterdam",
                    "postal_code": "1016 GV",
                },
            }),
        )
        .await;
    let scheduled = client
        .post(
            "/api/order/schedule",
            &json!({ "draft": addressed.body["draft"], "pickup_date": "2026-11-02T09:00:00Z" }),
        )
        .await;
    let confirmed = client
        .post(
            "/api/order/confirm",
            &json!({ "draft": scheduled.body["draft"] }),
        )
        .await;
    assert_eq!(confirmed.status, StatusCode::OK, "{:?}", confirmed.body);
    assert_eq!(confirmed.body["order"]["subtotal"], "45.00");
    assert_eq!(confirmed.body["order"]["total_amount"], "54.45");
}

#[tokio::test]
async fn test_quotes_are_private() {
    let app = TestApp::new().await;
    let mut owner = logged_in(&app).await;
    let id = request_quote(&mut owner).await;
    app.quotes.offer(id, Some(Decimal::new(4500, 2)));

    let mut stranger = logged_in(&app).await;
    assert_eq!(stranger.get("/api/account/quotes").await.body, json!([]));
    let resp = stranger
        .post(&format!("/api/account/quotes/{id}/accept"), &json!({}))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(app.quotes.status(id), Some(QuoteStatus::Quoted));
}
