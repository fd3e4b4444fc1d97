//! Stripe payment intents over the REST API.
//!
//! Only the two calls the checkout needs: create an intent before the
//! customer pays and retrieve it after the redirect back.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::StripeConfig;

/// Errors from the payment processor.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("Stripe error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Stripe payment intent status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

impl IntentStatus {
    #[must_use]
    pub const fn is_succeeded(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Metadata attached to every intent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentMetadata {
    pub order_number: String,
    pub customer_name: String,
    pub email: String,
}

/// Parameters for a new intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntent {
    /// Amount in minor units (cents).
    pub amount: i64,
    /// Lowercase ISO currency code.
    pub currency: String,
    pub description: String,
    pub metadata: IntentMetadata,
}

impl CreateIntent {
    /// Form parameters in Stripe's bracketed encoding.
    #[must_use]
    pub fn form_params(&self) -> Vec<(String, String)> {
        vec![
            ("amount".to_owned(), self.amount.to_string()),
            ("currency".to_owned(), self.currency.clone()),
            ("description".to_owned(), self.description.clone()),
            (
                "metadata[order_number]".to_owned(),
                self.metadata.order_number.clone(),
            ),
            (
                "metadata[customer_name]".to_owned(),
                self.metadata.customer_name.clone(),
            ),
            ("metadata[email]".to_owned(), self.metadata.email.clone()),
            (
                "automatic_payment_methods[enabled]".to_owned(),
                "true".to_owned(),
            ),
            (
                "automatic_payment_methods[allow_redirects]".to_owned(),
                "always".to_owned(),
            ),
        ]
    }
}

/// The fields of a Stripe payment intent the storefront reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: IntentStatus,
    /// Amount in minor units (cents).
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    #[must_use]
    pub fn order_number(&self) -> Option<&str> {
        self.metadata
            .get("order_number")
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// A hosted payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: &CreateIntent) -> Result<PaymentIntent, PaymentError>;

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError>;
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

/// Stripe REST client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            secret_key: config.secret_key.clone(),
        })
    }

    async fn read<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(body);
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    #[instrument(skip(self, request), fields(amount = request.amount, currency = %request.currency))]
    async fn create_intent(&self, request: &CreateIntent) -> Result<PaymentIntent, PaymentError> {
        let url = format!("{}/v1/payment_intents", self.api_base);
        let response = self
            .client
            .post(&url)
            .basic_auth(self.secret_key.expose_secret(), Some(""))
            .form(&request.form_params())
            .send()
            .await?;

        Self::read(response).await
    }

    #[instrument(skip(self))]
    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        let url = format!("{}/v1/payment_intents/{id}", self.api_base);
        let response = self
            .client
            .get(&url)
            .basic_auth(self.secret_key.expose_secret(), Some(""))
            .send()
            .await?;

        Self::read(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_params() {
        let request = CreateIntent {
            amount: 3025,
            currency: "eur".to_owned(),
            description: "Order EZY482913".to_owned(),
            metadata: IntentMetadata {
                order_number: "EZY482913".to_owned(),
                customer_name: "Guest".to_owned(),
                email: String::new(),
            },
        };
        let params: HashMap<_, _> = request.form_params().into_iter().collect();

        assert_eq!(params["amount"], "3025");
        assert_eq!(params["currency"], "eur");
        assert_eq!(params["metadata[order_number]"], "EZY482913");
        assert_eq!(params["metadata[customer_name]"], "Guest");
        assert_eq!(params["metadata[email]"], "");
        assert_eq!(params["automatic_payment_methods[enabled]"], "true");
        assert_eq!(params["automatic_payment_methods[allow_redirects]"], "always");
    }

    #[test]
    fn test_intent_parsing() {
        let json = r#"{
            "id": "pi_3Pq",
            "object": "payment_intent",
            "client_secret": "pi_3Pq_secret_abc",
            "status": "requires_payment_method",
            "amount": 3025,
            "currency": "eur",
            "metadata": {"order_number": "EZY482913", "email": ""}
        }"#;
        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.status, IntentStatus::RequiresPaymentMethod);
        assert_eq!(intent.order_number(), Some("EZY482913"));
        assert!(!intent.status.is_succeeded());
    }

    #[test]
    fn test_unknown_status_tolerated() {
        let status: IntentStatus = serde_json::from_str("\"requires_source\"").unwrap();
        assert_eq!(status, IntentStatus::Unknown);
    }
}
