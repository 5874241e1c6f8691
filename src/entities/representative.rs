//! Representative entity - A staff member who takes orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Representative database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "representatives")]
pub struct Model {
    /// Unique identifier for the representative
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name shown on orders and exports
    pub name: String,
    /// Soft delete flag
    pub active: bool,
}

/// Defines relationships between Representative and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One representative is attributed to many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
