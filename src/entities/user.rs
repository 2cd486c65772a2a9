//! User entity - Storefront customers known by their external identity id.
//!
//! The `clerk_id` is assigned by the hosted identity provider and is the only
//! identifier the HTTP layer ever sees. `balance` is the internal wallet used
//! for balance payments.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Internal identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// External identity provider user id
    #[sea_orm(unique)]
    pub clerk_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Wallet balance; never negative
    pub balance: f64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
