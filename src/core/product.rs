//! Product business logic - Handles the bakery catalog.
//!
//! Products are created, renamed/repriced and soft-deleted here. Deactivated products
//! disappear from [`load_products`] but stay in the table so existing order items keep
//! a valid reference.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Retrieves all active products, ordered alphabetically by name.
///
/// This is the list offered when capturing a new order.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn load_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::Active.eq(true))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by ID, active or not.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

fn validate_product(name: &str, price: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Product name cannot be empty"));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(Error::validation("Invalid price"));
    }
    Ok(())
}

/// Adds a new active product to the catalog.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The price is negative or not finite
/// - The database insert fails
pub async fn create_product(
    db: &DatabaseConnection,
    name: String,
    price: f64,
) -> Result<product::Model> {
    validate_product(&name, price)?;

    let product = product::ActiveModel {
        name: Set(name.trim().to_string()),
        price: Set(price),
        active: Set(true),
        ..Default::default()
    };
    let product = product.insert(db).await?;
    info!("Added product {} ({})", product.name, product.id);
    Ok(product)
}

/// Changes the name and unit price of an active product.
///
/// Existing order items keep the line price they were written with.
///
/// # Errors
/// Returns an error if:
/// - The new name or price is invalid
/// - The product does not exist or has been deactivated
/// - The database update fails
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    new_name: String,
    new_price: f64,
) -> Result<product::Model> {
    validate_product(&new_name, new_price)?;

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .filter(|p| p.active)
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    product.name = Set(new_name.trim().to_string());
    product.price = Set(new_price);

    product.update(db).await.map_err(Into::into)
}

/// Soft deletes a product so it can no longer be ordered.
///
/// # Errors
/// Returns an error if the product does not exist or the update fails.
pub async fn deactivate_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?
        .into();

    product.active = Set(false);
    let product = product.update(db).await?;
    info!("Deactivated product {} ({})", product.name, product.id);
    Ok(product)
}
