//! Unified error type for the order manager.
//!
//! Every fallible operation in the crate returns [`Result`], so errors flow up to
//! the front end with `?` and are reported there.

use thiserror::Error;

/// All errors produced by the library.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or unusable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// The database could not be opened or did not answer the startup ping
    #[error("Connection error: {message}")]
    Connection {
        /// Details of the connection failure
        message: String,
    },

    /// Any error reported by the ORM (query, row decoding, begin/commit)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// User input that could not be accepted
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// Product id that does not exist or is no longer active
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Requested product id
        id: i64,
    },

    /// Representative id that does not exist or is no longer active
    #[error("Representative not found: {id}")]
    RepresentativeNotFound {
        /// Requested representative id
        id: i64,
    },

    /// Order id that does not exist
    #[error("Order not found: {id}")]
    OrderNotFound {
        /// Requested order id
        id: i64,
    },

    /// Spreadsheet writer failure
    #[error("Export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    /// File-system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Config`] with the given message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
