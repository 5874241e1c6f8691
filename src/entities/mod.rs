//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.

pub mod order;
pub mod order_item;
pub mod product;
pub mod representative;

// Re-export specific types to avoid conflicts
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use representative::{
    Column as RepresentativeColumn, Entity as Representative, Model as RepresentativeModel,
};
