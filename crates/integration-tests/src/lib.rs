//! Integration tests for the Eazyy storefront API.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests over in-memory fakes
//! cargo test -p eazyy-integration-tests
//!
//! # Live tests against a running storefront and database
//! cargo test -p eazyy-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `catalog_api` - Catalog browsing and change propagation
//! - `order_flow` - Draft steps, confirmation and test-mode payment
//! - `payment_bridge` - Payment intent creation, checks and the return page
//! - `live_storefront` - Accounts and the login checkpoint against a real server

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, Method, Request, StatusCode, header};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub use eazyy_storefront::testing::{TestApp, sample_user};

/// A response with its body parsed as JSON (`Value::Null` when empty or not JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Sends requests through the router, carrying the session cookie forward
/// like a browser would.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
    headers: Vec<(HeaderName, String)>,
}

impl TestClient {
    #[must_use]
    pub fn new(app: &TestApp) -> Self {
        Self {
            router: app.router(),
            cookie: None,
            headers: Vec::new(),
        }
    }

    /// Start with an existing session cookie.
    #[must_use]
    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.cookie = Some(cookie);
        self
    }

    /// Send `name: value` with every request.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        self.headers.push((name, value.to_owned()));
        self
    }

    /// The session cookie currently held (`name=value`).
    #[must_use]
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: &Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None).await
    }

    pub async fn send(&mut self, method: Method, uri: &str, body: Option<&Value>) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            // The auth rate limiter keys on the client address.
            .header("x-forwarded-for", "203.0.113.7");
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(json).unwrap())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            && let Some(pair) = set_cookie.split(';').next()
        {
            self.cookie = Some(pair.to_owned());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
