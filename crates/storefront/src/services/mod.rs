//! Business logic services for the storefront.
//!
//! - `auth` - Password registration and login
//! - `geocode` - Address to coordinates (Google Geocoding)
//! - `loading` - Loading flag with a hard ceiling
//! - `payment` - Stripe payment intents

pub mod auth;
pub mod geocode;
pub mod loading;
pub mod payment;

pub use auth::{AuthError, AuthService, Registration};
pub use geocode::{Coordinates, GeocodeError, Geocoder, GoogleGeocoder};
pub use loading::LoadingIndicator;
pub use payment::{
    CreateIntent, IntentMetadata, IntentStatus, PaymentError, PaymentGateway, PaymentIntent,
    StripeClient,
};
