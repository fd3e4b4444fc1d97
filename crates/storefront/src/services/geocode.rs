//! Address geocoding via the Google Geocoding API.
//!
//! Results are cached in memory for a day, keyed by the normalized address.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::GeocodingConfig;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Errors from geocoding.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service could not place the address.
    #[error("address not found: {0}")]
    NotFound(String),

    /// Non-OK status such as `OVER_QUERY_LIMIT` or `REQUEST_DENIED`.
    #[error("geocoding failed: {status}")]
    Api {
        status: String,
        message: Option<String>,
    },
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Resolves addresses to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Coordinates,
}

impl GeocodeResponse {
    fn into_coordinates(self, address: &str) -> Result<Coordinates, GeocodeError> {
        match self.status.as_str() {
            "OK" => self
                .results
                .into_iter()
                .next()
                .map(|r| r.geometry.location)
                .ok_or_else(|| GeocodeError::NotFound(address.to_owned())),
            "ZERO_RESULTS" => Err(GeocodeError::NotFound(address.to_owned())),
            _ => Err(GeocodeError::Api {
                status: self.status,
                message: self.error_message,
            }),
        }
    }
}

/// Google Geocoding client with a result cache.
#[derive(Clone)]
pub struct GoogleGeocoder {
    inner: Arc<GoogleGeocoderInner>,
}

struct GoogleGeocoderInner {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
    region: String,
    cache: Cache<String, Coordinates>,
}

impl GoogleGeocoder {
    /// Create a new geocoding client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        Self::with_endpoint(config, GEOCODE_URL)
    }

    /// Same as [`GoogleGeocoder::new`] against a different endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_endpoint(config: &GeocodingConfig, endpoint: &str) -> Result<Self, GeocodeError> {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(24 * 60 * 60))
            .build();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            inner: Arc::new(GoogleGeocoderInner {
                client,
                endpoint: endpoint.to_owned(),
                api_key: config.api_key.clone(),
                region: config.region.clone(),
                cache,
            }),
        })
    }

    async fn lookup(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let response: GeocodeResponse = self
            .inner
            .client
            .get(&self.inner.endpoint)
            .query(&[
                ("address", address),
                ("region", self.inner.region.as_str()),
                ("key", self.inner.api_key.expose_secret()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_coordinates(address)
    }
}

/// Cache key: trimmed, lowercased, inner whitespace collapsed.
fn cache_key(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    #[instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let key = cache_key(address);
        if let Some(hit) = self.inner.cache.get(&key).await {
            debug!("Geocode cache hit");
            return Ok(hit);
        }

        let coordinates = self.lookup(address).await.inspect_err(|e| {
            warn!(error = %e, "Geocoding failed");
        })?;
        self.inner.cache.insert(key, coordinates).await;
        Ok(coordinates)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response() {
        let json = r#"{
            "results": [{"geometry": {"location": {"lat": 52.3676, "lng": 4.9041}}}],
            "status": "OK"
        }"#;
        let response: GeocodeResponse = serde_json::from_str(json).unwrap();
        let coords = response.into_coordinates("Dam 1, Amsterdam").unwrap();
        assert!((coords.lat - 52.3676).abs() < f64::EPSILON);
        assert!((coords.lng - 4.9041).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_results() {
        let response: GeocodeResponse =
            serde_json::from_str(r#"{"results": [], "status": "ZERO_RESULTS"}"#).unwrap();
        assert!(matches!(
            response.into_coordinates("nowhere"),
            Err(GeocodeError::NotFound(_))
        ));
    }

    #[test]
    fn test_denied() {
        let response: GeocodeResponse = serde_json::from_str(
            r#"{"results": [], "status": "REQUEST_DENIED", "error_message": "bad key"}"#,
        )
        .unwrap();
        let err = response.into_coordinates("Dam 1").unwrap_err();
        assert_eq!(err.to_string(), "geocoding failed: REQUEST_DENIED");
        assert!(matches!(
            err,
            GeocodeError::Api { message: Some(ref m), .. } if m == "bad key"
        ));
    }

    #[test]
    fn test_cache_key_normalizes() {
        assert_eq!(
            cache_key("  Dam 1,\n 1012 JS   Amsterdam "),
            "dam 1, 1012 js amsterdam"
        );
    }
}
