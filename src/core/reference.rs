//! Reference codes and payment methods.
//!
//! A reference code is the merchant identifier shared with the payment
//! gateway (`x_id_invoice`). Balance orders use a `SALDO_` prefix so they are
//! recognisable in gateway-side reports and legacy rows.

use serde::{Deserialize, Serialize};
use std::fmt;

const BALANCE_PREFIX: &str = "SALDO_";
const GATEWAY_PREFIX: &str = "ORD-";

/// How an order was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Internal wallet debit
    #[serde(alias = "saldo")]
    Balance,
    /// Hosted ePayco checkout
    Epayco,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Epayco => "epayco",
        }
    }

    /// Reads the `orders.payment_method` column, falling back to the
    /// reference prefix for rows written before the column existed.
    #[must_use]
    pub fn from_column(value: &str, reference: &str) -> Self {
        match value {
            "balance" => Self::Balance,
            "epayco" => Self::Epayco,
            _ => Self::from_reference(reference),
        }
    }

    /// Classifies a reference code by its prefix.
    #[must_use]
    pub fn from_reference(reference: &str) -> Self {
        if reference.starts_with(BALANCE_PREFIX) {
            Self::Balance
        } else {
            Self::Epayco
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn short_suffix() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// Reference for an order paid from the internal balance.
#[must_use]
pub fn balance_reference() -> String {
    format!(
        "{BALANCE_PREFIX}{}_{}",
        chrono::Utc::now().timestamp_millis(),
        short_suffix()
    )
}

/// Reference for an order delegated to the payment gateway.
#[must_use]
pub fn gateway_reference() -> String {
    format!(
        "{GATEWAY_PREFIX}{}-{}",
        chrono::Utc::now().timestamp_millis(),
        short_suffix().to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_reference_shape() {
        let reference = balance_reference();
        assert!(reference.starts_with("SALDO_"));
        assert_eq!(PaymentMethod::from_reference(&reference), PaymentMethod::Balance);
    }

    #[test]
    fn test_gateway_reference_shape() {
        let reference = gateway_reference();
        assert!(reference.starts_with("ORD-"));
        assert_eq!(reference.split('-').count(), 3);
        assert_eq!(PaymentMethod::from_reference(&reference), PaymentMethod::Epayco);
    }

    #[test]
    fn test_from_column_falls_back_to_prefix() {
        assert_eq!(PaymentMethod::from_column("epayco", "SALDO_1"), PaymentMethod::Epayco);
        assert_eq!(PaymentMethod::from_column("", "SALDO_1"), PaymentMethod::Balance);
        assert_eq!(PaymentMethod::from_column("", "ORD-1-A"), PaymentMethod::Epayco);
    }

    #[test]
    fn test_references_are_unique_within_same_millisecond() {
        let a = gateway_reference();
        let b = gateway_reference();
        assert_ne!(a, b);
    }
}
