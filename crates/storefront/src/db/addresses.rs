//! Saved addresses.

use async_trait::async_trait;
use sqlx::PgPool;

use eazyy_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, NewAddress};

const ADDRESS_COLUMNS: &str = "id, user_id, name, street, house_number, additional_info, city, \
     postal_code, is_default, created_at";

/// Storage operations behind the saved-address endpoints.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// All addresses of a user, default first, then oldest first.
    async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError>;

    async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError>;

    /// Save a new address. A user's first address becomes their default.
    async fn create(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError>;

    /// Make one address the only default.
    ///
    /// Returns `RepositoryError::NotFound` if the address does not belong to the user.
    async fn set_default(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError>;

    /// Returns `RepositoryError::NotFound` if the address does not belong to the user.
    async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed [`AddressStore`].
pub struct PgAddressStore {
    pool: PgPool,
}

impl PgAddressStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressStore for PgAddressStore {
    async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM user_addresses WHERE user_id = $1 \
             ORDER BY is_default DESC, created_at ASC"
        );
        Ok(sqlx::query_as::<_, Address>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let sql =
            format!("SELECT {ADDRESS_COLUMNS} FROM user_addresses WHERE id = $1 AND user_id = $2");
        Ok(sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let has_any: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM user_addresses WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        let sql = format!(
            r"
            INSERT INTO user_addresses (user_id, name, street, house_number, additional_info,
                                        city, postal_code, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ADDRESS_COLUMNS}
            "
        );
        let created = sqlx::query_as::<_, Address>(&sql)
            .bind(user_id)
            .bind(&address.name)
            .bind(address.street.trim())
            .bind(address.house_number.trim())
            .bind(&address.additional_info)
            .bind(address.city.trim())
            .bind(address.postal_code.trim())
            .bind(!has_any)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    // Clear the flag on all, then set it on one.
    async fn set_default(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE user_addresses SET is_default = FALSE WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let result =
            sqlx::query("UPDATE user_addresses SET is_default = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM user_addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
