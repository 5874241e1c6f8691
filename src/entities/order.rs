//! Order entity - A client's order header.
//!
//! `total_price` is denormalized: it is the sum of the order's line item prices and is
//! rewritten on every insert or edit rather than derived at read time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// When the order was captured
    pub created_at: DateTimeUtc,
    /// Date the client wants the order ready
    pub due_date: Date,
    /// Client's name
    pub client_name: String,
    /// Phone number or other contact detail
    pub contact: String,
    /// Whether the order must be delivered
    pub needs_delivery: bool,
    /// Delivery address, empty when collected
    pub delivery_address: String,
    /// Free-text note
    pub comment: String,
    /// Completion flag - completed orders drop out of the open order list
    pub completed: bool,
    /// Representative who took the order, if any
    pub representative_id: Option<i64>,
    /// Sum of all line item prices
    pub total_price: f64,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many line items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    /// Each order may belong to one representative
    #[sea_orm(
        belongs_to = "super::representative::Entity",
        from = "Column::RepresentativeId",
        to = "super::representative::Column::Id"
    )]
    Representative,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::representative::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Representative.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
