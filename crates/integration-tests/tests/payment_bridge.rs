//! Payment intents through the bridge endpoints and the order return step.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{HeaderName, Method, StatusCode, header};
use serde_json::{Value, json};

use eazyy_core::PaymentStatus;
use eazyy_integration_tests::{TestApp, TestClient, sample_user};
use eazyy_storefront::services::IntentStatus;

const ORIGIN: &str = "https://eazyy.nl";

/// Confirm a two-shirt-and-blouse order and return its number.
async fn committed_order(app: &TestApp) -> String {
    let cookie = app.login_as(&sample_user()).await;
    let mut client = TestClient::new(app).with_cookie(cookie);
    let shirt = app.catalog.item("Shirt").id.to_string();
    let blouse = app.catalog.item("Blouse").id.to_string();

    let mut draft = json!({});
    for (item, delta) in [(&shirt, 2), (&blouse, 1)] {
        let step = client
            .post(
                "/api/order/items",
                &json!({ "draft": draft, "item_id": item, "delta": delta }),
            )
            .await;
        draft = step.body["draft"].clone();
    }
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
            &json!({
                "draft": addressed.body["draft"],
                "pickup_date": "2026-11-02T09:00:00Z",
                "delivery_date": "2026-11-04T17:00:00Z",
            }),
        )
        .await;
    let confirmed = client
        .post(
            "/api/order/confirm",
            &json!({ "draft": scheduled.body["draft"] }),
        )
        .await;
    assert_eq!(confirmed.status, StatusCode::OK, "{:?}", confirmed.body);
    confirmed.body["order"]["order_number"]
        .as_str()
        .unwrap()
        .to_owned()
}

fn payment_body(order_number: &str) -> Value {
    json!({
        "amount": 19.97,
        "currency": "EUR",
        "description": format!("Order {order_number}"),
        "metadata": {
            "orderNumber": order_number,
            "customerName": "Sanne de Vries",
            "email": "sanne@example.nl",
        },
    })
}

// =============================================================================
// create-payment
// =============================================================================

#[tokio::test]
async fn test_create_payment_returns_client_secret() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);

    let resp = client
        .post("/api/create-payment", &payment_body("EZY482913"))
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    assert_eq!(resp.body["clientSecret"], "pi_test_1_secret");

    let requests = app.payments.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, 1997);
    assert_eq!(requests[0].currency, "eur");
    assert_eq!(requests[0].metadata.order_number, "EZY482913");
}

#[tokio::test]
async fn test_create_payment_missing_fields() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);

    let resp = client
        .post("/api/create-payment", &json!({ "currency": "eur" }))
        .await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body["error"], "Missing required payment fields");
    assert!(app.payments.requests().is_empty());
}

#[tokio::test]
async fn test_create_payment_passes_processor_message() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);
    app.payments.fail_with("Your card was declined.");

    let resp = client
        .post("/api/create-payment", &payment_body("EZY482913"))
        .await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.body["error"], "Your card was declined.");
}

#[tokio::test]
async fn test_bridge_allows_any_origin() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app).with_header(header::ORIGIN, ORIGIN);

    let resp = client
        .post("/api/create-payment", &payment_body("EZY482913"))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );

    let mut preflight = TestClient::new(&app)
        .with_header(header::ORIGIN, ORIGIN)
        .with_header(
            HeaderName::from_static("access-control-request-method"),
            "POST",
        );
    let resp = preflight
        .send(Method::OPTIONS, "/api/create-payment", None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

// =============================================================================
// check-payment
// =============================================================================

#[tokio::test]
async fn test_check_payment_reports_order_details() {
    let app = TestApp::new().await;
    let number = committed_order(&app).await;
    let mut client = TestClient::new(&app);
    client.post("/api/create-payment", &payment_body(&number)).await;

    let resp = client
        .get("/api/check-payment?payment_intent=pi_test_1")
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    assert_eq!(resp.body["status"], "requires_payment_method");
    assert_eq!(resp.body["orderDetails"]["orderNumber"], number.as_str());
    assert_eq!(resp.body["orderDetails"]["totalAmount"], 19.97);
    assert_eq!(
        resp.body["orderDetails"]["estimatedDelivery"],
        "2026-11-04T17:00:00Z"
    );
}

#[tokio::test]
async fn test_check_payment_errors() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);

    let missing = client.get("/api/check-payment").await;
    assert_eq!(missing.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(missing.body["error"], "Payment intent ID is required");

    let unknown = client
        .get("/api/check-payment?payment_intent=pi_missing")
        .await;
    assert_eq!(unknown.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        unknown.body["error"],
        "No such payment_intent: 'pi_missing'"
    );
}

// =============================================================================
// Order return
// =============================================================================

#[tokio::test]
async fn test_return_marks_order_paid_by_card() {
    let app = TestApp::new().await;
    let number = committed_order(&app).await;
    let mut client = TestClient::new(&app);
    client.post("/api/create-payment", &payment_body(&number)).await;
    app.payments.set_status("pi_test_1", IntentStatus::Succeeded);

    let resp = client
        .get("/api/order/return?payment_intent=pi_test_1")
        .await;
    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    assert_eq!(resp.body["success"], true);
    assert_eq!(resp.body["status"], "succeeded");
    assert_eq!(resp.body["orderDetails"]["orderNumber"], number.as_str());

    let stored = &app.orders.orders()[0].order;
    assert_eq!(stored.payment_status, PaymentStatus::Paid);
    assert_eq!(stored.payment_method.as_deref(), Some("card"));
}

#[tokio::test]
async fn test_return_without_success_leaves_order_pending() {
    let app = TestApp::new().await;
    let number = committed_order(&app).await;
    let mut client = TestClient::new(&app);
    client.post("/api/create-payment", &payment_body(&number)).await;
    app.payments.set_status("pi_test_1", IntentStatus::RequiresAction);

    let resp = client
        .get("/api/order/return?payment_intent=pi_test_1")
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], false);
    assert_eq!(resp.body["status"], "requires_action");
    assert_eq!(resp.body["orderDetails"], Value::Null);

    assert_eq!(
        app.orders.orders()[0].order.payment_status,
        PaymentStatus::Pending
    );
}

#[tokio::test]
async fn test_return_rejects_intent_below_order_total() {
    let app = TestApp::new().await;
    let number = committed_order(&app).await;
    let mut client = TestClient::new(&app);
    let mut body = payment_body(&number);
    body["amount"] = json!(0.50);
    client.post("/api/create-payment", &body).await;
    app.payments.set_status("pi_test_1", IntentStatus::Succeeded);

    let resp = client
        .get("/api/order/return?payment_intent=pi_test_1")
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], false);
    assert_eq!(resp.body["status"], "succeeded");
    assert_eq!(resp.body["orderDetails"], Value::Null);

    let stored = &app.orders.orders()[0].order;
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
    assert_eq!(stored.payment_method, None);
}

#[tokio::test]
async fn test_return_rejects_other_currency() {
    let app = TestApp::new().await;
    let number = committed_order(&app).await;
    let mut client = TestClient::new(&app);
    let mut body = payment_body(&number);
    body["currency"] = json!("usd");
    client.post("/api/create-payment", &body).await;
    app.payments.set_status("pi_test_1", IntentStatus::Succeeded);

    let resp = client
        .get("/api/order/return?payment_intent=pi_test_1")
        .await;
    assert_eq!(resp.body["success"], false);
    assert_eq!(
        app.orders.orders()[0].order.payment_status,
        PaymentStatus::Pending
    );
}

#[tokio::test]
async fn test_return_without_order_is_not_success() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);
    client
        .post("/api/create-payment", &payment_body("EZY000001"))
        .await;
    app.payments.set_status("pi_test_1", IntentStatus::Succeeded);

    let resp = client
        .get("/api/order/return?payment_intent=pi_test_1")
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["success"], false);
    assert_eq!(resp.body["orderDetails"], Value::Null);
}

#[tokio::test]
async fn test_return_requires_intent_id() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);

    let resp = client.get("/api/order/return").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "No payment intent ID found");
}
