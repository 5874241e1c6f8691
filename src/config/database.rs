//! Database connection and schema management.
//!
//! Opens a pooled connection from a [`DatabaseConfig`], verifies it with a single
//! ping bounded by [`PING_TIMEOUT`], and creates the four tables from the entity
//! definitions using `Schema::create_table_from_entity`, so the SQL schema always
//! matches the Rust models.

use crate::config::store::DatabaseConfig;
use crate::entities::{Order, OrderItem, Product, Representative};
use crate::errors::{Error, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound on pooled connections.
pub const MAX_CONNECTIONS: u32 = 25;

/// Lifetime of a pooled connection before it is recycled.
pub const CONNECTION_MAX_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Timeout for the startup connectivity check.
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the URL handed to the driver.
///
/// Local `sqlite:` URLs are used as-is. Any other URL gets the auth token appended as
/// a form-encoded `authToken` query parameter.
#[must_use]
pub fn connection_string(config: &DatabaseConfig) -> String {
    let url = config.database_url.trim();
    if url.starts_with("sqlite:") {
        return url.to_string();
    }
    let token: String = url::form_urlencoded::byte_serialize(config.auth_token.as_bytes()).collect();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}authToken={token}")
}

/// Validates the config, opens the pool, pings it and ensures the schema exists.
///
/// # Errors
/// Returns [`Error::Config`] for incomplete settings, [`Error::Connection`] if the
/// database cannot be opened or does not answer the ping in time, and
/// [`Error::Database`] if table creation fails.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    config
        .validate()
        .map_err(|e| Error::config(format!("database configuration invalid: {e}")))?;

    let mut options = ConnectOptions::new(connection_string(config));
    options
        .max_connections(MAX_CONNECTIONS)
        .max_lifetime(CONNECTION_MAX_LIFETIME)
        .sqlx_logging(false);

    let db = Database::connect(options).await.map_err(|e| Error::Connection {
        message: format!("error preparing database connection: {e}"),
    })?;

    match tokio::time::timeout(PING_TIMEOUT, db.ping()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            close_quietly(db).await;
            return Err(Error::Connection {
                message: format!("error connecting to database: {e}"),
            });
        }
        Err(_) => {
            close_quietly(db).await;
            return Err(Error::Connection {
                message: format!("database did not respond within {}s", PING_TIMEOUT.as_secs()),
            });
        }
    }
    info!("Connected to database");

    create_tables(&db).await?;
    Ok(db)
}

async fn close_quietly(db: DatabaseConnection) {
    if let Err(e) = db.close().await {
        warn!("Failed to close database after failed ping: {}", e);
    }
}

/// Creates all tables that do not exist yet.
///
/// Tables are created parents first so the foreign keys on `orders` and
/// `order_items` resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let tables = [
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(Representative),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(OrderItem),
    ];

    for mut table in tables {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    info!("Database schema ready");
    Ok(())
}
