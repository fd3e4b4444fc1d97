//! Catalog queries and seeding.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use eazyy_core::{CategoryId, ItemId, ServiceId};

use super::RepositoryError;
use crate::catalog::CatalogSource;
use crate::models::{Category, Item, Service};

const SERVICE_COLUMNS: &str = "id, service_identifier, name, description, short_description, \
     icon, image_url, color_scheme, starting_price, price_unit, features, benefits, sequence, \
     is_popular, status";

const CATEGORY_COLUMNS: &str = "id, service_id, name, description, icon, sequence, status";

const ITEM_COLUMNS: &str =
    "id, category_id, name, description, price, is_custom_price, is_popular, sequence, status";

/// Reads the catalog tables. Owns a pool handle so it can back the
/// long-lived catalog store.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update a service, keyed by its identifier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_service(&self, seed: &ServiceSeed) -> Result<ServiceId, RepositoryError> {
        let id: ServiceId = sqlx::query_scalar(
            r"
            INSERT INTO services (service_identifier, name, description, short_description,
                                  icon, image_url, color_scheme, starting_price, price_unit,
                                  features, benefits, sequence, is_popular, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (service_identifier) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                short_description = EXCLUDED.short_description,
                icon = EXCLUDED.icon,
                image_url = EXCLUDED.image_url,
                color_scheme = EXCLUDED.color_scheme,
                starting_price = EXCLUDED.starting_price,
                price_unit = EXCLUDED.price_unit,
                features = EXCLUDED.features,
                benefits = EXCLUDED.benefits,
                sequence = EXCLUDED.sequence,
                is_popular = EXCLUDED.is_popular,
                status = EXCLUDED.status,
                updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(&seed.service_identifier)
        .bind(&seed.name)
        .bind(&seed.description)
        .bind(&seed.short_description)
        .bind(&seed.icon)
        .bind(&seed.image_url)
        .bind(&seed.color_scheme)
        .bind(seed.starting_price)
        .bind(&seed.price_unit)
        .bind(&seed.features)
        .bind(&seed.benefits)
        .bind(seed.sequence)
        .bind(seed.is_popular)
        .bind(seed.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Insert or update a category, keyed by service and name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_category(
        &self,
        service_id: ServiceId,
        seed: &CategorySeed,
    ) -> Result<CategoryId, RepositoryError> {
        let id: CategoryId = sqlx::query_scalar(
            r"
            INSERT INTO categories (service_id, name, description, icon, sequence, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (service_id, name) DO UPDATE SET
                description = EXCLUDED.description,
                icon = EXCLUDED.icon,
                sequence = EXCLUDED.sequence,
                status = EXCLUDED.status,
                updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(service_id)
        .bind(&seed.name)
        .bind(&seed.description)
        .bind(&seed.icon)
        .bind(seed.sequence)
        .bind(seed.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Insert or update an item, keyed by category and name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_item(
        &self,
        category_id: CategoryId,
        seed: &ItemSeed,
    ) -> Result<ItemId, RepositoryError> {
        let id: ItemId = sqlx::query_scalar(
            r"
            INSERT INTO items (category_id, name, description, price, is_custom_price,
                               is_popular, sequence, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (category_id, name) DO UPDATE SET
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                is_custom_price = EXCLUDED.is_custom_price,
                is_popular = EXCLUDED.is_popular,
                sequence = EXCLUDED.sequence,
                status = EXCLUDED.status,
                updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(category_id)
        .bind(&seed.name)
        .bind(&seed.description)
        .bind(seed.price)
        .bind(seed.is_custom_price)
        .bind(seed.is_popular)
        .bind(seed.sequence)
        .bind(seed.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }
}

#[async_trait]
impl CatalogSource for CatalogRepository {
    async fn fetch_services(&self) -> Result<Vec<Service>, RepositoryError> {
        let sql = format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY sequence, name");
        Ok(sqlx::query_as::<_, Service>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY sequence, name");
        Ok(sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn fetch_items(&self) -> Result<Vec<Item>, RepositoryError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY sequence, name");
        Ok(sqlx::query_as::<_, Item>(&sql).fetch_all(&self.pool).await?)
    }
}

// =============================================================================
// Seed input
// =============================================================================

/// A service as written in a seed file, with its categories nested inside.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSeed {
    pub service_identifier: String,
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub icon: Option<String>,
    pub image_url: Option<String>,
    pub color_scheme: Option<serde_json::Value>,
    pub starting_price: Option<Decimal>,
    pub price_unit: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub sequence: i32,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default = "default_true")]
    pub status: bool,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[serde(default)]
    pub sequence: i32,
    #[serde(default = "default_true")]
    pub status: bool,
    #[serde(default)]
    pub items: Vec<ItemSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemSeed {
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub is_custom_price: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub sequence: i32,
    #[serde(default = "default_true")]
    pub status: bool,
}

const fn default_true() -> bool {
    true
}
