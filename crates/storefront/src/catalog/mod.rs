//! In-memory catalog of services, categories and items.
//!
//! The [`CatalogStore`] loads all three tables once, serves every order-flow
//! lookup from an immutable snapshot, and keeps the snapshot fresh by
//! re-fetching whole tables when the database announces a change.
//!
//! # Lifecycle
//!
//! 1. [`CatalogStore::load`] fetches the three tables in parallel, retrying
//!    with linear backoff.
//! 2. After a successful load the store opens a change subscription.
//! 3. Each change event replaces one table in the snapshot (last write wins).
//! 4. Dropping the store ends the subscription task.

mod subscription;

pub use subscription::{
    CHANGE_CHANNEL, ChangeEvent, ChangeFeed, ChangeStream, PgChangeFeed, SubscriptionHandle,
};

use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use eazyy_core::{CategoryId, ItemId, ServiceId};

use crate::config::CatalogConfig;
use crate::db::RepositoryError;
use crate::models::{Category, Item, Service};
use crate::services::loading::LoadingIndicator;

/// Where catalog records come from. Each fetch returns the full table ordered
/// by sequence.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_services(&self) -> Result<Vec<Service>, RepositoryError>;
    async fn fetch_categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn fetch_items(&self) -> Result<Vec<Item>, RepositoryError>;
}

/// The three catalog tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogTable {
    Services,
    Categories,
    Items,
}

impl CatalogTable {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Categories => "categories",
            Self::Items => "items",
        }
    }
}

impl FromStr for CatalogTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "services" => Ok(Self::Services),
            "categories" => Ok(Self::Categories),
            "items" => Ok(Self::Items),
            other => Err(format!("unknown catalog table: {other}")),
        }
    }
}

/// Catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to load catalog after {attempts} attempts: {source}")]
    LoadFailed {
        attempts: u32,
        #[source]
        source: RepositoryError,
    },

    #[error("failed to open change subscription: {0}")]
    Subscribe(#[from] sqlx::Error),
}

/// Load state of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CatalogStatus {
    Loading,
    Ready,
    /// Loading gave up. Previously loaded data is still served.
    Failed { message: String },
}

/// An immutable view of the catalog.
///
/// Tables are individually reference counted so replacing one table does not
/// copy the others.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub services: Arc<Vec<Service>>,
    pub categories: Arc<Vec<Category>>,
    pub items: Arc<Vec<Item>>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    /// Active services in sequence order.
    #[must_use]
    pub fn active_services(&self) -> Vec<Service> {
        self.services.iter().filter(|s| s.status).cloned().collect()
    }

    #[must_use]
    pub fn service(&self, service_identifier: &str) -> Option<&Service> {
        self.services
            .iter()
            .find(|s| s.service_identifier == service_identifier)
    }

    /// Categories owned by the named service that hold at least one item.
    ///
    /// Unknown services yield an empty list.
    #[must_use]
    pub fn service_categories(&self, service_identifier: &str) -> Vec<Category> {
        let Some(service) = self.service(service_identifier) else {
            return Vec::new();
        };
        self.categories_of(service.id)
    }

    fn categories_of(&self, service_id: ServiceId) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|c| c.service_id == service_id)
            .filter(|c| self.items.iter().any(|i| i.category_id == c.id))
            .cloned()
            .collect()
    }

    /// Active items of a category, ascending by sequence.
    #[must_use]
    pub fn category_items(&self, category_id: CategoryId) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .items
            .iter()
            .filter(|i| i.category_id == category_id && i.status)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.sequence);
        items
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// Shared, self-refreshing catalog.
///
/// Cheap to clone; all clones share one snapshot.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn CatalogSource>,
    feed: Option<Arc<dyn ChangeFeed>>,
    config: CatalogConfig,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    status: RwLock<CatalogStatus>,
    loading: LoadingIndicator,
    subscription: Mutex<Option<SubscriptionHandle>>,
    /// Serializes `load` calls.
    load_lock: tokio::sync::Mutex<()>,
}

impl CatalogStore {
    /// Create an empty store. Nothing is fetched until [`CatalogStore::load`].
    ///
    /// Without a `feed` the store never refreshes on its own.
    #[must_use]
    pub fn new(
        source: Arc<dyn CatalogSource>,
        feed: Option<Arc<dyn ChangeFeed>>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                feed,
                config,
                snapshot: RwLock::new(Arc::new(CatalogSnapshot::default())),
                status: RwLock::new(CatalogStatus::Loading),
                loading: LoadingIndicator::new(config.loading_ceiling),
                subscription: Mutex::new(None),
                load_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Fetch all three tables, retrying with linear backoff.
    ///
    /// On success the snapshot is replaced and a fresh change subscription
    /// replaces any previous one. On final failure the status becomes
    /// [`CatalogStatus::Failed`] and the previous snapshot stays in place.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::LoadFailed` once all retries are exhausted.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), CatalogError> {
        let _guard = self.inner.load_lock.lock().await;

        self.inner.set_status(CatalogStatus::Loading);
        self.inner.loading.start();

        let result = self.fetch_with_retry().await;
        self.inner.loading.stop();

        match result {
            Ok(snapshot) => {
                info!(
                    services = snapshot.services.len(),
                    categories = snapshot.categories.len(),
                    items = snapshot.items.len(),
                    "Catalog loaded"
                );
                self.inner.replace_snapshot(snapshot);
                self.inner.set_status(CatalogStatus::Ready);
                self.resubscribe().await;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Catalog load failed");
                self.inner.set_status(CatalogStatus::Failed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn fetch_with_retry(&self) -> Result<CatalogSnapshot, CatalogError> {
        let mut retries = 0;
        loop {
            match self.inner.fetch_all().await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) if retries < self.inner.config.max_retries => {
                    retries += 1;
                    let delay = self.inner.config.retry_delay * retries;
                    warn!(error = %e, retry = retries, ?delay, "Catalog fetch failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(CatalogError::LoadFailed {
                        attempts: retries + 1,
                        source: e,
                    });
                }
            }
        }
    }

    async fn resubscribe(&self) {
        let Some(feed) = self.inner.feed.clone() else {
            return;
        };

        match feed.subscribe().await {
            Ok(stream) => {
                let handle = subscription::spawn(Arc::downgrade(&self.inner), stream);
                // Dropping the previous handle aborts the previous task.
                let previous = match self.inner.subscription.lock() {
                    Ok(mut slot) => slot.replace(handle),
                    Err(poisoned) => poisoned.into_inner().replace(handle),
                };
                drop(previous);
                info!("Catalog change subscription active");
            }
            Err(e) => {
                warn!(error = %e, "Catalog change subscription unavailable");
            }
        }
    }

    /// Re-fetch one table and swap it into the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the fetch fails; the snapshot is unchanged.
    pub async fn apply_change(&self, table: CatalogTable) -> Result<(), RepositoryError> {
        self.inner.refresh_table(table).await
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.inner.snapshot()
    }

    #[must_use]
    pub fn status(&self) -> CatalogStatus {
        match self.inner.status.read() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.is_loading()
    }

    /// Whether a change subscription task is currently running.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        match self.inner.subscription.lock() {
            Ok(slot) => slot.as_ref().is_some_and(|h| !h.is_finished()),
            Err(_) => false,
        }
    }

    #[must_use]
    pub fn services(&self) -> Vec<Service> {
        self.snapshot().active_services()
    }

    #[must_use]
    pub fn get_service_categories(&self, service_identifier: &str) -> Vec<Category> {
        self.snapshot().service_categories(service_identifier)
    }

    #[must_use]
    pub fn get_category_items(&self, category_id: CategoryId) -> Vec<Item> {
        self.snapshot().category_items(category_id)
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<Item> {
        self.snapshot().item(id).cloned()
    }
}

impl Inner {
    async fn fetch_all(&self) -> Result<CatalogSnapshot, RepositoryError> {
        let (services, categories, items) = tokio::try_join!(
            self.source.fetch_services(),
            self.source.fetch_categories(),
            self.source.fetch_items(),
        )?;

        Ok(CatalogSnapshot {
            services: Arc::new(services),
            categories: Arc::new(categories),
            items: Arc::new(items),
            loaded_at: Some(Utc::now()),
        })
    }

    async fn refresh_all(&self) -> Result<(), RepositoryError> {
        let snapshot = self.fetch_all().await?;
        self.replace_snapshot(snapshot);
        Ok(())
    }

    async fn refresh_table(&self, table: CatalogTable) -> Result<(), RepositoryError> {
        match table {
            CatalogTable::Services => {
                let services = Arc::new(self.source.fetch_services().await?);
                self.update_snapshot(|s| s.services = services);
            }
            CatalogTable::Categories => {
                let categories = Arc::new(self.source.fetch_categories().await?);
                self.update_snapshot(|s| s.categories = categories);
            }
            CatalogTable::Items => {
                let items = Arc::new(self.source.fetch_items().await?);
                self.update_snapshot(|s| s.items = items);
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> Arc<CatalogSnapshot> {
        match self.snapshot.read() {
            Ok(snapshot) => Arc::clone(&snapshot),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn replace_snapshot(&self, snapshot: CatalogSnapshot) {
        self.update_snapshot(|s| *s = snapshot);
    }

    fn update_snapshot(&self, apply: impl FnOnce(&mut CatalogSnapshot)) {
        let mut slot = match self.snapshot.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut next = CatalogSnapshot::clone(&slot);
        apply(&mut next);
        *slot = Arc::new(next);
    }

    fn set_status(&self, status: CatalogStatus) {
        match self.status.write() {
            Ok(mut slot) => *slot = status,
            Err(poisoned) => *poisoned.into_inner() = status,
        }
    }
}
