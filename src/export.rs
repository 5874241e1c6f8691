//! Spreadsheet export of the full order history.
//!
//! Orders are flattened to one row per line item: an order with three items occupies
//! three rows, each repeating the order-level columns. Completed orders are included.
//! The workbook has a single `Orders` sheet with a bold, shaded header row and an
//! auto-filter over everything written.

use crate::{
    core::input::{DATE_FORMAT, format_rand},
    entities::{Order, order, order_item, product, representative},
    errors::Result,
};
use chrono::NaiveDate;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};
use sea_orm::{FromQueryResult, JoinType, QueryOrder, QuerySelect, RelationTrait, prelude::*};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "Orders";

/// Column headers, in output order.
pub const HEADERS: [&str; 13] = [
    "Order ID",
    "Representative",
    "Status",
    "Date",
    "Client",
    "Contact",
    "Due Date",
    "Product",
    "Quantity",
    "Unit Price",
    "Line Total",
    "Order Total",
    "Comment",
];

const HEADER_FILL: u32 = 0x00E0_E0E0;
const COLUMN_WIDTH: f64 = 15.0;
const LAST_COLUMN: u16 = 12;

/// One joined order/line-item row.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct ExportRow {
    /// Order id
    pub order_id: i64,
    /// Representative name, if the order has one
    pub representative_name: Option<String>,
    /// Completion flag
    pub completed: bool,
    /// When the order was captured
    pub created_at: DateTimeUtc,
    /// Client's name
    pub client_name: String,
    /// Client's contact detail
    pub contact: String,
    /// Requested date
    pub due_date: Date,
    /// Product on this line
    pub product_name: Option<String>,
    /// Units on this line
    pub quantity: Option<i32>,
    /// Current catalog price of the product
    pub unit_price: Option<f64>,
    /// Stored line total
    pub line_total: Option<f64>,
    /// Stored order total
    pub order_total: f64,
    /// Order comment
    pub comment: String,
}

impl ExportRow {
    /// Status label shown in the sheet.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        if self.completed { "Completed" } else { "Pending" }
    }
}

/// Runs the export join: every order with each of its items, newest order first, then by
/// order id and product name.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn load_export_rows(db: &DatabaseConnection) -> Result<Vec<ExportRow>> {
    Order::find()
        .select_only()
        .column_as(order::Column::Id, "order_id")
        .column_as(representative::Column::Name, "representative_name")
        .column(order::Column::Completed)
        .column(order::Column::CreatedAt)
        .column(order::Column::ClientName)
        .column(order::Column::Contact)
        .column(order::Column::DueDate)
        .column_as(product::Column::Name, "product_name")
        .column(order_item::Column::Quantity)
        .column_as(product::Column::Price, "unit_price")
        .column_as(order_item::Column::Price, "line_total")
        .column_as(order::Column::TotalPrice, "order_total")
        .column(order::Column::Comment)
        .join(JoinType::LeftJoin, order::Relation::OrderItems.def())
        .join(JoinType::LeftJoin, order_item::Relation::Product.def())
        .join(JoinType::LeftJoin, order::Relation::Representative.def())
        .order_by_desc(order::Column::CreatedAt)
        .order_by_asc(order::Column::Id)
        .order_by_asc(product::Column::Name)
        .into_model::<ExportRow>()
        .all(db)
        .await
        .map_err(Into::into)
}

/// Exports the whole order history to an `.xlsx` file at `path`.
///
/// Returns the number of data rows written (excluding the header).
///
/// # Errors
/// Returns an error if the query fails or the file cannot be written.
pub async fn export_orders<P: AsRef<Path>>(db: &DatabaseConnection, path: P) -> Result<usize> {
    let rows = load_export_rows(db).await?;
    write_workbook(&rows, path.as_ref())?;
    info!("Exported {} rows to {}", rows.len(), path.as_ref().display());
    Ok(rows.len())
}

/// Writes `rows` under the header row to a new workbook at `path`.
///
/// Header styling, column widths and the auto-filter are cosmetic: failures there are
/// logged and ignored.
///
/// # Errors
/// Returns an error if a cell cannot be written or the file cannot be saved.
pub fn write_workbook(rows: &[ExportRow], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_FILL));

    for (col, header) in (0_u16..).zip(HEADERS) {
        if worksheet
            .write_string_with_format(0, col, header, &header_format)
            .is_err()
        {
            warn!("Could not style header cell {header:?}, writing it plain");
            worksheet.write_string(0, col, header)?;
        }
        if let Err(e) = worksheet.set_column_width(col, COLUMN_WIDTH) {
            warn!("Could not set width of column {col}: {e}");
        }
    }

    let mut last_row = 0_u32;
    for row in rows {
        last_row += 1;
        write_row(worksheet, last_row, row)?;
    }

    if let Err(e) = worksheet.autofilter(0, 0, last_row, LAST_COLUMN) {
        warn!("Could not apply auto-filter: {e}");
    }

    workbook.save(path)?;
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn write_row(worksheet: &mut Worksheet, index: u32, row: &ExportRow) -> Result<()> {
    worksheet.write_number(index, 0, row.order_id as f64)?;
    worksheet.write_string(index, 1, row.representative_name.as_deref().unwrap_or_default())?;
    worksheet.write_string(index, 2, row.status())?;
    worksheet.write_string(index, 3, row.created_at.format("%Y-%m-%d %H:%M").to_string())?;
    worksheet.write_string(index, 4, row.client_name.as_str())?;
    worksheet.write_string(index, 5, row.contact.as_str())?;
    worksheet.write_string(index, 6, row.due_date.format(DATE_FORMAT).to_string())?;
    worksheet.write_string(index, 7, row.product_name.as_deref().unwrap_or_default())?;
    if let Some(quantity) = row.quantity {
        worksheet.write_number(index, 8, quantity)?;
    }
    worksheet.write_string(index, 9, row.unit_price.map(format_rand).unwrap_or_default())?;
    worksheet.write_string(index, 10, row.line_total.map(format_rand).unwrap_or_default())?;
    worksheet.write_string(index, 11, format_rand(row.order_total))?;
    worksheet.write_string(index, 12, row.comment.as_str())?;
    Ok(())
}

/// Suggested file name for an export made on `date`, e.g. `orders_2024-12-20.xlsx`.
#[must_use]
pub fn default_export_file_name(date: NaiveDate) -> String {
    format!("orders_{}.xlsx", date.format(DATE_FORMAT))
}

/// Appends `.xlsx` unless `path` already ends with it (case-insensitive).
#[must_use]
pub fn ensure_xlsx_extension(path: &Path) -> PathBuf {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    if has_extension {
        return path.to_path_buf();
    }
    let mut with_extension = path.as_os_str().to_owned();
    with_extension.push(".xlsx");
    PathBuf::from(with_extension)
}
