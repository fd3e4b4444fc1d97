//! Custom price quote requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use eazyy_core::{QuoteId, QuoteStatus, UserId};

use super::{RepositoryError, parse_column};
use crate::models::{NewQuote, Quote};

/// Storage operations behind the quote endpoints and quote-priced orders.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// The user's quotes, newest first.
    async fn list(&self, user_id: UserId) -> Result<Vec<Quote>, RepositoryError>;

    async fn get(&self, user_id: UserId, id: QuoteId) -> Result<Option<Quote>, RepositoryError>;

    /// Record a new quote request in `pending` state.
    async fn create(&self, user_id: UserId, quote: &NewQuote) -> Result<Quote, RepositoryError>;

    /// Move a quote from `from` to `to`.
    ///
    /// Returns `Ok(None)` when the quote is not owned by the user or is not in
    /// the expected state.
    async fn transition(
        &self,
        user_id: UserId,
        id: QuoteId,
        from: QuoteStatus,
        to: QuoteStatus,
    ) -> Result<Option<Quote>, RepositoryError>;
}

const QUOTE_COLUMNS: &str = "id, user_id, item_name, description, image_url, suggested_price, \
     status, urgency, admin_price, admin_note, admin_quoted_at, facility_note, created_at";

#[derive(sqlx::FromRow)]
struct QuoteRow {
    id: QuoteId,
    user_id: UserId,
    item_name: String,
    description: String,
    image_url: Vec<String>,
    suggested_price: Option<Decimal>,
    status: String,
    urgency: String,
    admin_price: Option<Decimal>,
    admin_note: Option<String>,
    admin_quoted_at: Option<DateTime<Utc>>,
    facility_note: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuoteRow> for Quote {
    type Error = RepositoryError;

    fn try_from(r: QuoteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            item_name: r.item_name,
            description: r.description,
            image_url: r.image_url,
            suggested_price: r.suggested_price,
            status: parse_column("quote status", &r.status)?,
            urgency: parse_column("quote urgency", &r.urgency)?,
            admin_price: r.admin_price,
            admin_note: r.admin_note,
            admin_quoted_at: r.admin_quoted_at,
            facility_note: r.facility_note,
            created_at: r.created_at,
        })
    }
}

/// `PostgreSQL`-backed [`QuoteStore`].
pub struct PgQuoteStore {
    pool: PgPool,
}

impl PgQuoteStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuoteStore for PgQuoteStore {
    async fn list(&self, user_id: UserId) -> Result<Vec<Quote>, RepositoryError> {
        let sql = format!(
            "SELECT {QUOTE_COLUMNS} FROM custom_price_quotes WHERE user_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, QuoteRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Quote::try_from)
            .collect()
    }

    async fn get(&self, user_id: UserId, id: QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let sql = format!(
            "SELECT {QUOTE_COLUMNS} FROM custom_price_quotes WHERE id = $1 AND user_id = $2"
        );
        sqlx::query_as::<_, QuoteRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Quote::try_from)
            .transpose()
    }

    async fn create(&self, user_id: UserId, quote: &NewQuote) -> Result<Quote, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO custom_price_quotes (user_id, item_name, description, image_url,
                                             suggested_price, status, urgency)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {QUOTE_COLUMNS}
            "
        );
        sqlx::query_as::<_, QuoteRow>(&sql)
            .bind(user_id)
            .bind(quote.item_name.trim())
            .bind(quote.description.trim())
            .bind(&quote.image_url)
            .bind(quote.suggested_price)
            .bind(QuoteStatus::Pending.as_str())
            .bind(quote.urgency.as_str())
            .fetch_one(&self.pool)
            .await?
            .try_into()
    }

    async fn transition(
        &self,
        user_id: UserId,
        id: QuoteId,
        from: QuoteStatus,
        to: QuoteStatus,
    ) -> Result<Option<Quote>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE custom_price_quotes
            SET status = $4, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND status = $3
            RETURNING {QUOTE_COLUMNS}
            "
        );
        sqlx::query_as::<_, QuoteRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(Quote::try_from)
            .transpose()
    }
}
