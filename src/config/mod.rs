/// Database connection and schema management
pub mod database;

/// Persisted connection settings (`database_config.json`)
pub mod store;
