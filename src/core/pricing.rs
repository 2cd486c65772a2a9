//! Order pricing.
//!
//! Catalog prices are tax-exclusive. An order's charged amount is the item
//! subtotal plus IVA plus an optional tip, and `tax_base` is whatever part of
//! that amount is not tax. All money values are rounded to cents.

use crate::errors::{Error, Result};
use serde::Serialize;

/// Largest difference between two amounts still treated as equal.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

/// A line ready for pricing: catalog price times requested quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricedLine {
    pub product_id: i64,
    pub unit_price: f64,
    pub quantity: i64,
}

/// Totals for a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub subtotal: f64,
    pub tax: f64,
    pub tip: f64,
    pub total: f64,
}

impl Quote {
    /// Portion of the total that is not tax.
    #[must_use]
    pub fn tax_base(&self) -> f64 {
        round2(self.total - self.tax)
    }
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Returns true when two amounts are equal within [`AMOUNT_TOLERANCE`].
#[must_use]
pub fn amounts_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= AMOUNT_TOLERANCE + f64::EPSILON * a.abs().max(b.abs())
}

/// Prices `lines` at `tax_rate` and adds `tip`.
///
/// # Errors
/// Returns `EmptyOrder` for no lines, `InvalidQuantity` for non-positive
/// quantities and `InvalidAmount` for negative or non-finite prices or tip.
pub fn quote(lines: &[PricedLine], tax_rate: f64, tip: f64) -> Result<Quote> {
    if lines.is_empty() {
        return Err(Error::EmptyOrder);
    }
    if !tip.is_finite() || tip < 0.0 {
        return Err(Error::InvalidAmount { amount: tip });
    }

    let mut subtotal = 0.0;
    for line in lines {
        if line.quantity <= 0 {
            return Err(Error::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }
        if !line.unit_price.is_finite() || line.unit_price < 0.0 {
            return Err(Error::InvalidAmount {
                amount: line.unit_price,
            });
        }
        #[allow(clippy::cast_precision_loss)]
        let quantity = line.quantity as f64;
        subtotal += line.unit_price * quantity;
    }

    let subtotal = round2(subtotal);
    let tax = round2(subtotal * tax_rate);
    let tip = round2(tip);
    Ok(Quote {
        subtotal,
        tax,
        tip,
        total: round2(subtotal + tax + tip),
    })
}

/// Checks a client-claimed total against the server-side quote.
///
/// # Errors
/// Returns `AmountMismatch` when `claimed` is present and differs from
/// `quote.total` by more than a cent.
pub fn reconcile(quote: &Quote, claimed: Option<f64>) -> Result<()> {
    match claimed {
        Some(received) if !amounts_match(quote.total, received) => Err(Error::AmountMismatch {
            expected: quote.total,
            received,
        }),
        _ => Ok(()),
    }
}
