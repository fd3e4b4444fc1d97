//! Catalog browsing over the in-memory catalog source.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::Value;

use eazyy_integration_tests::{TestApp, TestClient};
use eazyy_storefront::catalog::{CatalogTable, ChangeEvent};

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_services_are_active_and_ordered() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);

    let resp = client.get("/api/services").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(names(&resp.body), ["Dry Cleaning", "Wash & Fold"]);
}

#[tokio::test]
async fn test_categories_skip_empty_ones() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);

    let resp = client.get("/api/services/dry-cleaning/categories").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(names(&resp.body), ["Tops", "Outerwear"]);

    let unknown = client.get("/api/services/ironing/categories").await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(unknown.body, Value::Array(Vec::new()));
}

#[tokio::test]
async fn test_items_sorted_by_sequence_without_inactive() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);
    let tops = app.catalog.category("Tops");

    let resp = client.get(&format!("/api/categories/{tops}/items")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(names(&resp.body), ["Shirt", "Blouse"]);
    assert_eq!(resp.body[0]["price"], "5.00");
}

#[tokio::test]
async fn test_status_after_load() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);

    let resp = client.get("/api/catalog/status").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["status"]["state"], "ready");
    assert_eq!(resp.body["loading"], false);
    assert_eq!(resp.body["subscribed"], true);
    assert!(resp.body["loaded_at"].is_string());
}

#[tokio::test]
async fn test_item_change_is_pushed_into_the_snapshot() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);
    let tops = app.catalog.category("Tops");

    app.source.edit_items(|items| {
        let shirt = items.iter_mut().find(|i| i.name == "Shirt").unwrap();
        shirt.price = Some(Decimal::new(550, 2));
    });
    app.feed.send(ChangeEvent::Table(CatalogTable::Items)).await;

    let mut seen = Value::Null;
    for _ in 0..50 {
        let resp = client.get(&format!("/api/categories/{tops}/items")).await;
        seen = resp.body[0]["price"].clone();
        if seen == "5.50" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(seen, "5.50");
}

#[tokio::test]
async fn test_failed_retry_keeps_serving_old_data() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);

    app.source.fail_next(10);
    let failed = client.post("/api/catalog/retry", &Value::Null).await;
    assert_eq!(failed.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(failed.body["error"], "Catalog is unavailable, please retry");

    let status = client.get("/api/catalog/status").await;
    assert_eq!(status.body["status"]["state"], "failed");
    assert_eq!(status.body["loading"], false);

    let services = client.get("/api/services").await;
    assert_eq!(names(&services.body), ["Dry Cleaning", "Wash & Fold"]);

    app.source.fail_next(0);
    let recovered = client.post("/api/catalog/retry", &Value::Null).await;
    assert_eq!(recovered.status, StatusCode::OK);
    assert_eq!(recovered.body["status"]["state"], "ready");
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let mut client = TestClient::new(&app);

    let resp = client.get("/health").await;
    assert_eq!(resp.status, StatusCode::OK);
}
