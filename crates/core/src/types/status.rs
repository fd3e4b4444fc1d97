//! Status enums stored as text columns.
//!
//! Each enum round-trips through its snake_case name via `Display`/`FromStr`,
//! which is also how it is written to and read from the database.

use serde::{Deserialize, Serialize};

/// Error returned when a stored or submitted status string is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct InvalidStatus {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// The snake_case name stored in the database.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = InvalidStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(InvalidStatus {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

/// Order lifecycle status.
///
/// This storefront only ever writes `Pending` and `Processing`; the later
/// states are set by drivers and facilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    DriverAssigned,
    PickedUp,
    AtFacility,
    OutForDelivery,
    Delivered,
    Completed,
    Cancelled,
}

text_enum!(OrderStatus, "order status", {
    Pending => "pending",
    Processing => "processing",
    DriverAssigned => "driver_assigned",
    PickedUp => "picked_up",
    AtFacility => "at_facility",
    OutForDelivery => "out_for_delivery",
    Delivered => "delivered",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

text_enum!(PaymentStatus, "payment status", {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

/// Whether the order is picked up only or also delivered back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Pickup,
    Delivery,
}

text_enum!(OrderType, "order type", {
    Pickup => "pickup",
    Delivery => "delivery",
});

/// Custom price quote status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    /// Waiting for the facility to price the item.
    #[default]
    Pending,
    /// A price has been offered.
    Quoted,
    Accepted,
    Declined,
}

text_enum!(QuoteStatus, "quote status", {
    Pending => "pending",
    Quoted => "quoted",
    Accepted => "accepted",
    Declined => "declined",
});

/// How fast the customer wants a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuoteUrgency {
    #[default]
    Standard,
    Express,
}

text_enum!(QuoteUrgency, "quote urgency", {
    Standard => "standard",
    Express => "express",
});
