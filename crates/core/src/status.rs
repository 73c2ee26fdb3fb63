//! Status enums for every stateful entity and their exact wire values.
//!
//! The database stores these as `TEXT` columns guarded by `CHECK`
//! constraints; the strings below must match those constraints.

use serde::{Deserialize, Serialize};

/// Generates `as_str`, `Display` and `FromStr` for a fieldless status enum.
macro_rules! wire_status {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The exact wire / column value.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(UnknownStatus {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        /// Lets `sqlx` decode `TEXT` columns via `#[sqlx(try_from = "String")]`.
        impl TryFrom<String> for $name {
            type Error = UnknownStatus;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

/// A status string that does not belong to the expected enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Held,
    Sold,
    Blocked,
}

wire_status!(SeatStatus {
    Available => "AVAILABLE",
    Held => "HELD",
    Sold => "SOLD",
    Blocked => "BLOCKED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldStatus {
    Active,
    Consumed,
    Expired,
}

wire_status!(HoldStatus {
    Active => "ACTIVE",
    Consumed => "CONSUMED",
    Expired => "EXPIRED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Cancelled,
    Expired,
}

wire_status!(OrderStatus {
    PendingPayment => "PENDING_PAYMENT",
    Paid => "PAID",
    Cancelled => "CANCELLED",
    Expired => "EXPIRED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Denied,
    Refunded,
}

wire_status!(PaymentStatus {
    Pending => "PENDING",
    Approved => "APPROVED",
    Denied => "DENIED",
    Refunded => "REFUNDED",
});

impl PaymentStatus {
    /// No further transition is accepted from a terminal status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Refunded)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Valid,
    Used,
    Cancelled,
}

wire_status!(TicketStatus {
    Valid => "VALID",
    Used => "USED",
    Cancelled => "CANCELLED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Approved,
}

wire_status!(RefundStatus {
    Approved => "APPROVED",
});

/// Publication state of a session (a single timed performance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Draft,
    Published,
    Closed,
}

wire_status!(SessionStatus {
    Draft => "DRAFT",
    Published => "PUBLISHED",
    Closed => "CLOSED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Published,
    Archived,
}

wire_status!(EventStatus {
    Draft => "DRAFT",
    Published => "PUBLISHED",
    Archived => "ARCHIVED",
});
