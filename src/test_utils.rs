//! Shared test utilities.
//!
//! Helpers for setting up an in-memory database and creating catalog entries and
//! orders with sensible defaults.

use crate::{
    core::{
        order::{self, OrderDetails, OrderLine, OrderWithItems},
        product, representative,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an active product with the given unit price.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
) -> Result<entities::product::Model> {
    product::create_product(db, name.to_string(), price).await
}

/// Creates an active representative.
pub async fn create_test_representative(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::representative::Model> {
    representative::create_representative(db, name.to_string()).await
}

/// Creates a single-line order for `client_name`.
///
/// # Defaults
/// * `contact`: `"000 000 0000"`
/// * `due_date`: `"2024-12-24"`
/// * no representative, no delivery, empty comment
pub async fn create_test_order(
    db: &DatabaseConnection,
    client_name: &str,
    product_id: i64,
    quantity: i32,
) -> Result<OrderWithItems> {
    let details = OrderDetails {
        client_name: client_name.to_string(),
        contact: "000 000 0000".to_string(),
        due_date: "2024-12-24".to_string(),
        items: vec![OrderLine::new(product_id, quantity)],
        ..Default::default()
    };
    order::create_order(db, &details).await
}
