//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::{CatalogStore, PgChangeFeed};
use crate::checkout::{OrderCommitter, Pricer};
use crate::config::StorefrontConfig;
use crate::db::{
    AddressStore, CatalogRepository, OrderStore, PgAddressStore, PgOrderStore, PgQuoteStore,
    QuoteStore,
};
use crate::services::{
    GeocodeError, Geocoder, GoogleGeocoder, PaymentError, PaymentGateway, StripeClient,
};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to create payment client: {0}")]
    Payment(#[from] PaymentError),
    #[error("failed to create geocoding client: {0}")]
    Geocode(#[from] GeocodeError),
}

/// The swappable collaborators behind the state.
pub struct StateParts {
    pub catalog: CatalogStore,
    pub orders: Arc<dyn OrderStore>,
    pub quotes: Arc<dyn QuoteStore>,
    pub addresses: Arc<dyn AddressStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub payments: Arc<dyn PaymentGateway>,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: CatalogStore,
    orders: Arc<dyn OrderStore>,
    quotes: Arc<dyn QuoteStore>,
    addresses: Arc<dyn AddressStore>,
    payments: Arc<dyn PaymentGateway>,
    committer: OrderCommitter,
}

impl AppState {
    /// Create the production state: `PostgreSQL` catalog and account data, Stripe
    /// and Google Geocoding.
    ///
    /// The catalog starts empty; call [`CatalogStore::load`] to fill it.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let catalog = CatalogStore::new(
            Arc::new(CatalogRepository::new(pool.clone())),
            Some(Arc::new(PgChangeFeed::new(pool.clone()))),
            config.catalog,
        );
        let parts = StateParts {
            catalog,
            orders: Arc::new(PgOrderStore::new(pool.clone())),
            quotes: Arc::new(PgQuoteStore::new(pool.clone())),
            addresses: Arc::new(PgAddressStore::new(pool.clone())),
            geocoder: Arc::new(GoogleGeocoder::new(&config.geocoding)?),
            payments: Arc::new(StripeClient::new(&config.stripe)?),
        };
        Ok(Self::from_parts(config, pool, parts))
    }

    /// Assemble state from explicit collaborators.
    #[must_use]
    pub fn from_parts(config: StorefrontConfig, pool: PgPool, parts: StateParts) -> Self {
        let pricer = Pricer::new(parts.catalog.clone(), Arc::clone(&parts.quotes));
        let committer = OrderCommitter::new(
            Arc::clone(&parts.orders),
            pricer,
            parts.geocoder,
            &config.order_number_prefix,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog: parts.catalog,
                orders: parts.orders,
                quotes: parts.quotes,
                addresses: parts.addresses,
                payments: parts.payments,
                committer,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        &self.inner.catalog
    }

    #[must_use]
    pub fn orders(&self) -> &dyn OrderStore {
        self.inner.orders.as_ref()
    }

    #[must_use]
    pub fn quotes(&self) -> &dyn QuoteStore {
        self.inner.quotes.as_ref()
    }

    #[must_use]
    pub fn addresses(&self) -> &dyn AddressStore {
        self.inner.addresses.as_ref()
    }

    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.payments.as_ref()
    }

    #[must_use]
    pub fn committer(&self) -> &OrderCommitter {
        &self.inner.committer
    }
}
