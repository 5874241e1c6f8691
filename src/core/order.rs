//! Order business logic - Capturing, editing, listing and completing orders.
//!
//! An order is a header row plus one or more line items. Line prices are computed from
//! the product's unit price at write time and persisted, and the header's `total_price`
//! is rewritten with their sum on every insert or edit. Both writes happen inside a
//! single database transaction: either the header and every line land, or nothing does.
//!
//! Editing is a destructive replace. All existing lines are deleted and the new set is
//! inserted; there is no concurrency token, so the last writer wins.

use crate::{
    core::input::parse_due_date,
    entities::{
        Order, OrderItem, Product, Representative, order, order_item, product, representative,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info, warn};

/// One requested product and how many of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    /// Product to order
    pub product_id: i64,
    /// Number of units, at least one
    pub quantity: i32,
}

impl OrderLine {
    /// Creates a line for `quantity` units of `product_id`.
    #[must_use]
    pub const fn new(product_id: i64, quantity: i32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Everything the user enters for an order, used both to create and to replace one.
#[derive(Debug, Clone, Default)]
pub struct OrderDetails {
    /// Client's name
    pub client_name: String,
    /// Phone number or other contact detail
    pub contact: String,
    /// Due date as entered, `YYYY-MM-DD`
    pub due_date: String,
    /// Representative taking the order
    pub representative_id: Option<i64>,
    /// Whether the order must be delivered
    pub needs_delivery: bool,
    /// Delivery address
    pub delivery_address: String,
    /// Free-text note
    pub comment: String,
    /// Requested products
    pub items: Vec<OrderLine>,
}

/// A line item together with the name of its product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemView {
    /// Stored line item
    pub item: order_item::Model,
    /// Name of the referenced product
    pub product_name: String,
}

/// An order with its representative name and line items, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithItems {
    /// Stored order header
    pub order: order::Model,
    /// Name of the attributed representative, if any
    pub representative_name: Option<String>,
    /// Line items in insertion order
    pub items: Vec<OrderItemView>,
}

/// Retrieves all open (not completed) orders, newest first, each with its line items.
///
/// Line items are fetched with one query per order.
///
/// # Errors
/// Returns an error if any query fails; no partial list is returned.
pub async fn load_orders(db: &DatabaseConnection) -> Result<Vec<OrderWithItems>> {
    let rows = Order::find()
        .find_also_related(Representative)
        .filter(order::Column::Completed.eq(false))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await?;

    let mut orders = Vec::with_capacity(rows.len());
    for (order, representative) in rows {
        let items = load_items(db, order.id).await?;
        orders.push(OrderWithItems {
            order,
            representative_name: representative.map(|r| r.name),
            items,
        });
    }
    debug!("Loaded {} open orders", orders.len());
    Ok(orders)
}

/// Retrieves a single order with its line items, whether completed or not.
///
/// # Errors
/// Returns an error if a query fails.
pub async fn get_order(db: &DatabaseConnection, order_id: i64) -> Result<Option<OrderWithItems>> {
    let Some((order, representative)) = Order::find_by_id(order_id)
        .find_also_related(Representative)
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let items = load_items(db, order.id).await?;
    Ok(Some(OrderWithItems {
        order,
        representative_name: representative.map(|r| r.name),
        items,
    }))
}

async fn load_items(db: &DatabaseConnection, order_id: i64) -> Result<Vec<OrderItemView>> {
    let rows = OrderItem::find()
        .find_also_related(Product)
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(item, product)| OrderItemView {
            item,
            product_name: product.map(|p| p.name).unwrap_or_default(),
        })
        .collect())
}

/// Checks the parts of the details that need no database access.
fn validate_details(details: &OrderDetails) -> Result<Date> {
    let due_date = parse_due_date(&details.due_date)?;

    if details.client_name.trim().is_empty() {
        return Err(Error::validation("Client name cannot be empty"));
    }
    if details.items.is_empty() {
        return Err(Error::validation("An order needs at least one item"));
    }
    if details.items.iter().any(|line| line.quantity < 1) {
        return Err(Error::validation("Invalid quantity"));
    }
    Ok(due_date)
}

/// Captures a new order and its line items in one transaction.
///
/// Products must exist and be active, and the representative (if given) must be
/// active. The stored `total_price` is the sum of the computed line prices.
///
/// # Errors
/// Returns an error if:
/// - The due date does not parse, the client name is blank, there are no items or a
///   quantity is below one
/// - A product or the representative is missing or inactive
/// - Any insert or the commit fails
///
/// On error nothing is persisted.
pub async fn create_order(db: &DatabaseConnection, details: &OrderDetails) -> Result<OrderWithItems> {
    let due_date = validate_details(details)?;

    let txn = db.begin().await?;
    match insert_order_rows(&txn, details, due_date).await {
        Ok(order_id) => {
            txn.commit().await?;
            info!("Created order {} for {}", order_id, details.client_name.trim());
            get_order(db, order_id)
                .await?
                .ok_or(Error::OrderNotFound { id: order_id })
        }
        Err(e) => {
            warn!("Rolling back new order for {}: {}", details.client_name.trim(), e);
            rollback(txn).await;
            Err(e)
        }
    }
}

async fn insert_order_rows(
    txn: &DatabaseTransaction,
    details: &OrderDetails,
    due_date: Date,
) -> Result<i64> {
    if let Some(representative_id) = details.representative_id {
        find_representative(txn, representative_id, true).await?;
    }

    let header = order::ActiveModel {
        created_at: Set(Utc::now()),
        due_date: Set(due_date),
        client_name: Set(details.client_name.trim().to_string()),
        contact: Set(details.contact.trim().to_string()),
        needs_delivery: Set(details.needs_delivery),
        delivery_address: Set(details.delivery_address.trim().to_string()),
        comment: Set(details.comment.trim().to_string()),
        completed: Set(false),
        representative_id: Set(details.representative_id),
        total_price: Set(0.0),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    let total = insert_lines(txn, header.id, &details.items, true).await?;

    let mut header: order::ActiveModel = header.into();
    header.total_price = Set(total);
    let header = header.update(txn).await?;
    Ok(header.id)
}

/// A failed rollback is only logged so the caller still sees the error that caused it.
async fn rollback(txn: DatabaseTransaction) {
    if let Err(e) = txn.rollback().await {
        warn!("Rollback failed: {}", e);
    }
}

/// Replaces an order's fields and its entire set of line items in one transaction.
///
/// Line prices are recomputed from current unit prices. Products only need to exist,
/// so an order can keep a product that has since been deactivated.
///
/// # Errors
/// Returns an error if validation fails, the order, a product or the representative
/// does not exist, or any statement or the commit fails. On error the order and its
/// existing items are left as they were.
pub async fn edit_order(
    db: &DatabaseConnection,
    order_id: i64,
    details: &OrderDetails,
) -> Result<OrderWithItems> {
    let due_date = validate_details(details)?;

    let txn = db.begin().await?;
    match replace_order_rows(&txn, order_id, details, due_date).await {
        Ok(()) => {
            txn.commit().await?;
            info!("Edited order {}", order_id);
            get_order(db, order_id)
                .await?
                .ok_or(Error::OrderNotFound { id: order_id })
        }
        Err(e) => {
            warn!("Rolling back edit of order {}: {}", order_id, e);
            rollback(txn).await;
            Err(e)
        }
    }
}

async fn replace_order_rows(
    txn: &DatabaseTransaction,
    order_id: i64,
    details: &OrderDetails,
    due_date: Date,
) -> Result<()> {
    let existing = Order::find_by_id(order_id)
        .one(txn)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;

    if let Some(representative_id) = details.representative_id {
        find_representative(txn, representative_id, false).await?;
    }

    let mut header: order::ActiveModel = existing.into();
    header.due_date = Set(due_date);
    header.client_name = Set(details.client_name.trim().to_string());
    header.contact = Set(details.contact.trim().to_string());
    header.needs_delivery = Set(details.needs_delivery);
    header.delivery_address = Set(details.delivery_address.trim().to_string());
    header.comment = Set(details.comment.trim().to_string());
    header.representative_id = Set(details.representative_id);
    let header = header.update(txn).await?;

    let removed = OrderItem::delete_many()
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(txn)
        .await?;
    debug!("Removed {} items from order {}", removed.rows_affected, order_id);

    let total = insert_lines(txn, order_id, &details.items, false).await?;

    let mut header: order::ActiveModel = header.into();
    header.total_price = Set(total);
    header.update(txn).await?;
    Ok(())
}

/// Inserts one row per line and returns the sum of the line prices.
async fn insert_lines(
    txn: &DatabaseTransaction,
    order_id: i64,
    lines: &[OrderLine],
    require_active: bool,
) -> Result<f64> {
    let mut total = 0.0;
    for line in lines {
        let product = find_product(txn, line.product_id, require_active).await?;
        let price = product.price * f64::from(line.quantity);

        order_item::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(product.id),
            quantity: Set(line.quantity),
            price: Set(price),
            ..Default::default()
        }
        .insert(txn)
        .await?;

        total += price;
    }
    Ok(total)
}

async fn find_product(
    txn: &DatabaseTransaction,
    product_id: i64,
    require_active: bool,
) -> Result<product::Model> {
    Product::find_by_id(product_id)
        .one(txn)
        .await?
        .filter(|p| p.active || !require_active)
        .ok_or(Error::ProductNotFound { id: product_id })
}

async fn find_representative(
    txn: &DatabaseTransaction,
    representative_id: i64,
    require_active: bool,
) -> Result<representative::Model> {
    Representative::find_by_id(representative_id)
        .one(txn)
        .await?
        .filter(|r| r.active || !require_active)
        .ok_or(Error::RepresentativeNotFound {
            id: representative_id,
        })
}

/// Marks an order completed (or reopens it). Completed orders leave [`load_orders`].
///
/// # Errors
/// Returns an error if the order does not exist or the update fails.
pub async fn set_order_completed(
    db: &DatabaseConnection,
    order_id: i64,
    completed: bool,
) -> Result<order::Model> {
    let mut order: order::ActiveModel = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?
        .into();

    order.completed = Set(completed);
    let order = order.update(db).await?;
    info!("Order {} completed = {}", order.id, order.completed);
    Ok(order)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::product::deactivate_product;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    fn details(items: Vec<OrderLine>) -> OrderDetails {
        OrderDetails {
            client_name: "Thandi".to_string(),
            contact: "082 555 0101".to_string(),
            due_date: "2024-12-20".to_string(),
            items,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_order_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut bad_date = details(vec![OrderLine::new(1, 1)]);
        bad_date.due_date = "20/12/2024".to_string();
        let result = create_order(&db, &bad_date).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        let result = create_order(&db, &details(vec![])).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        let result = create_order(&db, &details(vec![OrderLine::new(1, 0)])).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        let mut no_client = details(vec![OrderLine::new(1, 1)]);
        no_client.client_name = " ".to_string();
        let result = create_order(&db, &no_client).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_two_items_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let product_a = create_test_product(&db, "Product A", 7.5).await?;
        let product_b = create_test_product(&db, "Product B", 5.0).await?;

        let created = create_order(
            &db,
            &details(vec![OrderLine::new(product_a.id, 2), OrderLine::new(product_b.id, 3)]),
        )
        .await?;

        assert_eq!(created.order.total_price, 30.0);
        assert_eq!(created.items.len(), 2);
        assert_eq!(created.items[0].item.price, 15.0);
        assert_eq!(created.items[0].product_name, "Product A");
        assert_eq!(created.items[1].item.price, 15.0);
        assert_eq!(created.items[1].product_name, "Product B");
        assert!(!created.order.completed);
        assert_eq!(
            created.order.due_date,
            chrono::NaiveDate::from_ymd_opt(2024, 12, 20).unwrap()
        );

        let stored = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(created.order.id))
            .count(&db)
            .await?;
        assert_eq!(stored, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_with_representative() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Scone", 10.0).await?;
        let rep = create_test_representative(&db, "Lerato").await?;

        let mut new_order = details(vec![OrderLine::new(product.id, 1)]);
        new_order.representative_id = Some(rep.id);
        new_order.needs_delivery = true;
        new_order.delivery_address = "12 Long Street".to_string();
        let created = create_order(&db, &new_order).await?;

        assert_eq!(created.representative_name.as_deref(), Some("Lerato"));
        assert!(created.order.needs_delivery);
        assert_eq!(created.order.delivery_address, "12 Long Street");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_create_leaves_nothing_behind() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Cupcake", 15.0).await?;

        // Second line fails after the header and first line were written
        let result = create_order(
            &db,
            &details(vec![OrderLine::new(product.id, 1), OrderLine::new(999, 1)]),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { id: 999 }));

        assert!(load_orders(&db).await?.is_empty());
        assert_eq!(Order::find().count(&db).await?, 0);
        assert_eq!(OrderItem::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_rejects_inactive_product() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Fruitcake", 90.0).await?;
        deactivate_product(&db, product.id).await?;

        let result = create_order(&db, &details(vec![OrderLine::new(product.id, 1)])).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { id } if id == product.id));
        assert_eq!(Order::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_orders_newest_first_and_open_only() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Muffin", 12.0).await?;

        let first = create_test_order(&db, "First", product.id, 1).await?;
        let second = create_test_order(&db, "Second", product.id, 2).await?;
        let third = create_test_order(&db, "Third", product.id, 3).await?;
        set_order_completed(&db, second.order.id, true).await?;

        let orders = load_orders(&db).await?;
        let ids: Vec<i64> = orders.iter().map(|o| o.order.id).collect();
        assert_eq!(ids, vec![third.order.id, first.order.id]);

        assert_eq!(orders[0].items.len(), 1);
        assert_eq!(orders[0].items[0].item.quantity, 3);
        assert_eq!(orders[0].items[0].item.order_id, third.order.id);
        assert_eq!(orders[0].items[0].product_name, "Muffin");
        assert_eq!(orders[0].representative_name, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_orders_sorts_by_creation_time() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Muffin", 12.0).await?;

        let older_id = create_test_order(&db, "Lower Id", product.id, 1).await?;
        let newer_id = create_test_order(&db, "Higher Id", product.id, 1).await?;

        // Captured later despite the lower id
        let mut backdated: order::ActiveModel = older_id.order.clone().into();
        backdated.created_at = Set(newer_id.order.created_at + chrono::Duration::hours(1));
        backdated.update(&db).await?;

        let ids: Vec<i64> = load_orders(&db).await?.iter().map(|o| o.order.id).collect();
        assert_eq!(ids, vec![older_id.order.id, newer_id.order.id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_write_returns_the_write_error() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_errors([DbErr::Custom("disk full".to_string())])
            .append_query_errors([DbErr::Custom("disk full".to_string())])
            .into_connection();

        let result = create_order(&db, &details(vec![OrderLine::new(1, 1)])).await;
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert!(err.to_string().contains("disk full"));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_order_replaces_items() -> Result<()> {
        let db = setup_test_db().await?;
        let cupcake = create_test_product(&db, "Cupcake", 15.0).await?;
        let brownie = create_test_product(&db, "Brownie", 20.0).await?;
        let cookie = create_test_product(&db, "Cookie", 4.0).await?;

        let original = create_test_order(&db, "Sipho", cupcake.id, 1).await?;
        let old_item_id = original.items[0].item.id;

        let mut replacement = details(vec![OrderLine::new(brownie.id, 2), OrderLine::new(cookie.id, 5)]);
        replacement.client_name = "Sipho M".to_string();
        replacement.comment = "No nuts".to_string();
        replacement.due_date = "2025-01-03".to_string();
        let edited = edit_order(&db, original.order.id, &replacement).await?;

        assert_eq!(edited.order.id, original.order.id);
        assert_eq!(edited.order.client_name, "Sipho M");
        assert_eq!(edited.order.comment, "No nuts");
        assert_eq!(edited.order.created_at, original.order.created_at);
        assert_eq!(edited.order.total_price, 60.0);

        let products: Vec<i64> = edited.items.iter().map(|i| i.item.product_id).collect();
        assert_eq!(products, vec![brownie.id, cookie.id]);
        assert!(edited.items.iter().all(|i| i.item.id != old_item_id));
        assert_eq!(OrderItem::find().count(&db).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_edit_rolls_back() -> Result<()> {
        let db = setup_test_db().await?;
        let cupcake = create_test_product(&db, "Cupcake", 15.0).await?;
        let brownie = create_test_product(&db, "Brownie", 20.0).await?;
        let original = create_test_order(&db, "Naledi", cupcake.id, 2).await?;

        // Header update and item delete have run by the time the bad line is reached
        let mut replacement = details(vec![OrderLine::new(brownie.id, 1), OrderLine::new(404, 1)]);
        replacement.client_name = "Someone Else".to_string();
        let result = edit_order(&db, original.order.id, &replacement).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { id: 404 }));

        let after = get_order(&db, original.order.id).await?.unwrap();
        assert_eq!(after, original);
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_missing_order() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Cupcake", 15.0).await?;

        let result = edit_order(&db, 77, &details(vec![OrderLine::new(product.id, 1)])).await;
        assert!(matches!(result.unwrap_err(), Error::OrderNotFound { id: 77 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_keeps_deactivated_product() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Seasonal Pie", 50.0).await?;
        let order = create_test_order(&db, "Ayesha", product.id, 1).await?;
        deactivate_product(&db, product.id).await?;

        let mut replacement = details(vec![OrderLine::new(product.id, 2)]);
        replacement.client_name = "Ayesha".to_string();
        let edited = edit_order(&db, order.order.id, &replacement).await?;
        assert_eq!(edited.order.total_price, 100.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_order_completed_toggles() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Cupcake", 15.0).await?;
        let order = create_test_order(&db, "Kim", product.id, 1).await?;

        let done = set_order_completed(&db, order.order.id, true).await?;
        assert!(done.completed);
        assert!(load_orders(&db).await?.is_empty());

        // Completed orders are still retrievable individually
        assert!(get_order(&db, order.order.id).await?.unwrap().order.completed);

        let reopened = set_order_completed(&db, order.order.id, false).await?;
        assert!(!reopened.completed);
        assert_eq!(load_orders(&db).await?.len(), 1);

        let result = set_order_completed(&db, 999, true).await;
        assert!(matches!(result.unwrap_err(), Error::OrderNotFound { id: 999 }));
        Ok(())
    }
}
