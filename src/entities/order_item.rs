//! Order item entity - Snapshot of a product line at the time of purchase.
//!
//! Name and price are copied from the catalog when the order is created so
//! later catalog edits do not rewrite order history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning order
    pub order_id: i64,
    /// Catalog product this line was taken from
    pub product_id: i64,
    pub name: String,
    /// Unit price at purchase time
    pub price: f64,
    pub quantity: i64,
    pub image: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub size_range: Option<String>,
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `OrderItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
