//! Order status lifecycle and gateway state mapping.
//!
//! Orders carry one of four statuses. The payment gateway reports its own
//! transaction states (in Spanish on production accounts, English in some
//! sandbox payloads), which are folded into those four here.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Internal payment lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
    Failed,
}

impl OrderStatus {
    /// Textual form stored in the `orders.status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Failed => "FAILED",
        }
    }

    /// Whether an order in this status keeps its items out of stock.
    #[must_use]
    pub const fn holds_stock(self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "FAILED" => Ok(Self::Failed),
            _ => Err(Error::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// Maps a gateway `x_transaction_state` to an order status.
///
/// Returns `None` for states it does not recognize; callers keep the order's
/// current status in that case.
#[must_use]
pub fn map_gateway_state(state: &str) -> Option<OrderStatus> {
    match state.trim().to_lowercase().as_str() {
        "aceptada" | "accepted" | "approved" => Some(OrderStatus::Approved),
        "rechazada" | "rejected" | "reversada" | "reversed" | "cancelada" | "cancelled"
        | "abandonada" | "abandoned" | "expirada" | "expired" => Some(OrderStatus::Rejected),
        "pendiente" | "pending" | "retenido" | "retenida" | "iniciada" => {
            Some(OrderStatus::Pending)
        }
        "fallida" | "failed" => Some(OrderStatus::Failed),
        other => {
            warn!(state = other, "Unrecognized gateway transaction state");
            None
        }
    }
}
