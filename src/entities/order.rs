//! Order entity - A purchase and its payment lifecycle.
//!
//! `reference_code` correlates the order with the payment gateway. `status`
//! holds the textual form of [`crate::core::status::OrderStatus`] and
//! `payment_method` the textual form of
//! [`crate::core::reference::PaymentMethod`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Merchant reference shared with the gateway
    #[sea_orm(unique)]
    pub reference_code: String,
    /// Buyer's external identity id
    pub clerk_id: String,
    /// `"balance"` or `"epayco"`
    pub payment_method: String,
    /// Tax-inclusive total charged
    pub amount: f64,
    pub tax: f64,
    /// `amount - tax`
    pub tax_base: f64,
    pub tip: f64,
    pub currency: String,
    /// `PENDING`, `APPROVED`, `REJECTED` or `FAILED`
    pub status: String,
    /// Gateway transaction id, once confirmed
    pub transaction_id: Option<String>,
    /// Gateway `ref_payco`, once confirmed
    pub ref_payco: Option<String>,
    pub processing_date: Option<DateTimeUtc>,
    pub buyer_email: String,
    pub buyer_name: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_country: String,
    pub phone: String,
    pub document_type: String,
    pub document_number: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many line items
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
