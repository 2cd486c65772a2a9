//! Transaction entity - Wallet ledger entries.
//!
//! Every change to a user's `balance` writes one row here: `purchase` for
//! balance payments (negative amount), `topup` for credits and `refund` when a
//! balance-paid order leaves the approved state.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Wallet owner's external identity id
    pub clerk_id: String,
    /// Order this entry paid for or refunded, if any
    pub order_id: Option<i64>,
    /// Signed amount (negative for debits)
    pub amount: f64,
    /// `"purchase"`, `"topup"` or `"refund"`
    pub kind: String,
    /// Human-readable description of the transaction
    pub description: String,
    /// When the transaction was created
    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
