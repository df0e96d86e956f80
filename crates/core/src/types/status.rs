//! Status enums for orders and checkout.

use serde::{Deserialize, Serialize};

/// How an order is paid for.
///
/// Serialized the way the commerce API spells it (`"cash"` / `"card"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Online card payment through the external payment gateway.
    #[default]
    Card,
    /// Cash on delivery.
    Cash,
}

impl PaymentMethod {
    /// The wire spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Cash => "cash",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "cash" => Ok(Self::Cash),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Fulfilment progress of an order, derived from the API's paid/delivered flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, not yet paid.
    Pending,
    /// Paid, not yet delivered.
    Paid,
    /// Delivered (cash orders may be delivered before they are marked paid).
    Delivered,
}

impl OrderStatus {
    /// Derive the status from the API's boolean flags.
    #[must_use]
    pub const fn from_flags(is_paid: bool, is_delivered: bool) -> Self {
        match (is_paid, is_delivered) {
            (_, true) => Self::Delivered,
            (true, false) => Self::Paid,
            (false, false) => Self::Pending,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
            Self::Delivered => write!(f, "delivered"),
        }
    }
}
