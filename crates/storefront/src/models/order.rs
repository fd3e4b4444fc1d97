//! Committed orders and their line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use eazyy_core::{
    ItemId, OrderId, OrderItemId, OrderNumber, OrderStatus, OrderType, PaymentStatus, UserId,
};

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub customer_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub shipping_address: String,
    pub shipping_method: Option<String>,
    pub pickup_date: DateTime<Utc>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub estimated_delivery: DateTime<Utc>,
    pub special_instructions: Option<String>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_fee: Decimal,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub latitude: String,
    pub longitude: String,
    pub order_type: OrderType,
    pub pickup_completed: bool,
    pub facility_processing: bool,
    pub dropoff_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable snapshot of one draft entry at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ItemId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Values for a new order row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub customer_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub shipping_address: String,
    pub shipping_method: Option<String>,
    pub pickup_date: DateTime<Utc>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub special_instructions: Option<String>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_fee: Decimal,
    pub total_amount: Decimal,
    pub latitude: String,
    pub longitude: String,
}

impl NewOrder {
    /// Orders with a delivery date are delivered back; the rest are pickup only.
    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        if self.delivery_date.is_some() {
            OrderType::Delivery
        } else {
            OrderType::Pickup
        }
    }

    #[must_use]
    pub fn estimated_delivery(&self) -> DateTime<Utc> {
        self.delivery_date.unwrap_or(self.pickup_date)
    }
}

/// Values for a new order item row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ItemId,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}
