//! Order persistence.
//!
//! [`OrderStore`] is the seam between the order commit and the database so
//! the commit logic can run against an in-memory store in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use eazyy_core::{OrderId, OrderNumber, OrderStatus, PaymentStatus, UserId};

use super::{RepositoryError, parse_column};
use crate::models::{NewOrder, NewOrderItem, Order, OrderItem, OrderWithItems};

/// Storage operations the order flow needs.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Whether any order already uses this number.
    async fn order_number_exists(&self, number: &OrderNumber) -> Result<bool, RepositoryError>;

    async fn find_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, RepositoryError>;

    /// Insert the order and all of its items atomically.
    ///
    /// Returns `RepositoryError::Conflict` if the order number is taken.
    async fn insert_with_items(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError>;

    /// Move an order to `processing`/`paid` and record the payment method.
    async fn mark_paid(
        &self,
        number: &OrderNumber,
        payment_method: &str,
    ) -> Result<Option<Order>, RepositoryError>;

    /// A user's orders with their items, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderWithItems>, RepositoryError>;

    async fn items_for(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError>;
}

const ORDER_COLUMNS: &str = "id, order_number, user_id, customer_name, email, phone, \
     shipping_address, shipping_method, pickup_date, delivery_date, estimated_delivery, \
     special_instructions, subtotal, tax, shipping_fee, total_amount, status, payment_status, \
     payment_method, latitude, longitude, order_type, pickup_completed, facility_processing, \
     dropoff_completed, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, quantity, unit_price, subtotal";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    user_id: UserId,
    customer_name: String,
    email: String,
    phone: Option<String>,
    shipping_address: String,
    shipping_method: Option<String>,
    pickup_date: DateTime<Utc>,
    delivery_date: Option<DateTime<Utc>>,
    estimated_delivery: DateTime<Utc>,
    special_instructions: Option<String>,
    subtotal: Decimal,
    tax: Decimal,
    shipping_fee: Decimal,
    total_amount: Decimal,
    status: String,
    payment_status: String,
    payment_method: Option<String>,
    latitude: String,
    longitude: String,
    order_type: String,
    pickup_completed: bool,
    facility_processing: bool,
    dropoff_completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            order_number: parse_column("order_number", &r.order_number)?,
            user_id: r.user_id,
            customer_name: r.customer_name,
            email: r.email,
            phone: r.phone,
            shipping_address: r.shipping_address,
            shipping_method: r.shipping_method,
            pickup_date: r.pickup_date,
            delivery_date: r.delivery_date,
            estimated_delivery: r.estimated_delivery,
            special_instructions: r.special_instructions,
            subtotal: r.subtotal,
            tax: r.tax,
            shipping_fee: r.shipping_fee,
            total_amount: r.total_amount,
            status: parse_column("order status", &r.status)?,
            payment_status: parse_column("payment status", &r.payment_status)?,
            payment_method: r.payment_method,
            latitude: r.latitude,
            longitude: r.longitude,
            order_type: parse_column("order type", &r.order_type)?,
            pickup_completed: r.pickup_completed,
            facility_processing: r.facility_processing,
            dropoff_completed: r.dropoff_completed,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// `PostgreSQL`-backed [`OrderStore`].
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn order_number_exists(&self, number: &OrderNumber) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = $1)")
                .bind(number.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn find_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(number.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(Order::try_from)
            .transpose()
    }

    async fn insert_with_items(
        &self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r"
            INSERT INTO orders (order_number, user_id, customer_name, email, phone,
                                shipping_address, shipping_method, pickup_date, delivery_date,
                                estimated_delivery, special_instructions, subtotal, tax,
                                shipping_fee, total_amount, status, payment_status,
                                latitude, longitude, order_type, pickup_completed,
                                facility_processing, dropoff_completed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, FALSE, FALSE, FALSE)
            RETURNING {ORDER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order.order_number.as_str())
            .bind(order.user_id)
            .bind(&order.customer_name)
            .bind(&order.email)
            .bind(&order.phone)
            .bind(&order.shipping_address)
            .bind(&order.shipping_method)
            .bind(order.pickup_date)
            .bind(order.delivery_date)
            .bind(order.estimated_delivery())
            .bind(&order.special_instructions)
            .bind(order.subtotal)
            .bind(order.tax)
            .bind(order.shipping_fee)
            .bind(order.total_amount)
            .bind(OrderStatus::Pending.as_str())
            .bind(PaymentStatus::Pending.as_str())
            .bind(&order.latitude)
            .bind(&order.longitude)
            .bind(order.order_type().as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_unique(e, "order number already exists"))?;

        for item in items {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, product_id, product_name, quantity,
                                         unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(row.id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.subtotal)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Order::try_from(row)
    }

    async fn mark_paid(
        &self,
        number: &OrderNumber,
        payment_method: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE orders
            SET status = $2, payment_status = $3, payment_method = $4, updated_at = NOW()
            WHERE order_number = $1
            RETURNING {ORDER_COLUMNS}
            "
        );
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(number.as_str())
            .bind(OrderStatus::Processing.as_str())
            .bind(PaymentStatus::Paid.as_str())
            .bind(payment_method)
            .fetch_optional(&self.pool)
            .await?
            .map(Order::try_from)
            .transpose()
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let orders = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<uuid::Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();
        let sql = format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY product_name"
        );
        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in sqlx::query_as::<_, OrderItem>(&sql)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?
        {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }

    async fn items_for(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY product_name"
        );
        Ok(sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?)
    }
}
