//! Framework-agnostic business logic.
//!
//! Nothing here knows about HTTP; handlers in [`crate::http`] call into these
//! functions and translate the returned [`crate::errors::Error`] values.

/// Hosted gateway widget parameters
pub mod checkout;
/// Order creation, lookups and admin listing
pub mod order;
/// Subtotal, tax and total arithmetic
pub mod pricing;
/// Catalog products and stock
pub mod product;
/// Balance (wallet) purchases
pub mod purchase;
/// Gateway confirmations and status side effects
pub mod reconcile;
/// Payment methods and reference codes
pub mod reference;
/// Order status lifecycle
pub mod status;
/// Users, wallets and the wallet ledger
pub mod user;
