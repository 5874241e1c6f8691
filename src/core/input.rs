//! Parsing of user-entered text into typed values.

use crate::errors::{Error, Result};
use chrono::NaiveDate;

/// Date format accepted for due dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a unit price such as `"15"` or `"12.50"`.
///
/// # Errors
/// Returns [`Error::Validation`] for text that is not a finite, non-negative number.
pub fn parse_price(text: &str) -> Result<f64> {
    let price: f64 = text.trim().parse().map_err(|_| Error::validation("Invalid price"))?;
    if !price.is_finite() || price < 0.0 {
        return Err(Error::validation("Invalid price"));
    }
    Ok(price)
}

/// Parses an item quantity, which must be a whole number of at least one.
///
/// # Errors
/// Returns [`Error::Validation`] for anything else.
pub fn parse_quantity(text: &str) -> Result<i32> {
    let quantity: i32 = text
        .trim()
        .parse()
        .map_err(|_| Error::validation("Invalid quantity"))?;
    if quantity < 1 {
        return Err(Error::validation("Invalid quantity"));
    }
    Ok(quantity)
}

/// Parses a due date in `YYYY-MM-DD` form.
///
/// # Errors
/// Returns [`Error::Validation`] if the text is not a valid calendar date.
pub fn parse_due_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|e| Error::validation(format!("Invalid due date '{}': {e}", text.trim())))
}

/// Formats an amount the way the business writes currency, e.g. `R15.00`.
#[must_use]
pub fn format_rand(amount: f64) -> String {
    format!("R{amount:.2}")
}
