//! Persisted database settings.
//!
//! The database URL and auth token live in a small JSON file under the user's
//! config directory (`<config dir>/BlissfulBytesManagement/database_config.json`).
//! A missing file is not an error: it simply yields an empty configuration, which
//! then fails [`DatabaseConfig::validate`] until the user saves real values.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Application folder created inside the per-OS config directory.
pub const APP_CONFIG_DIR: &str = "BlissfulBytesManagement";

/// File name of the persisted settings.
pub const CONFIG_FILE_NAME: &str = "database_config.json";

/// Environment variable holding the database URL.
pub const DATABASE_URL_VAR: &str = "TURSO_DATABASE_URL";

/// Environment variable holding the auth token.
pub const AUTH_TOKEN_VAR: &str = "TURSO_AUTH_TOKEN";

/// Connection details for the order database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (`sqlite://...` for a local file, `libsql://...` for a hosted one)
    #[serde(default)]
    pub database_url: String,
    /// Auth token sent with remote connections
    #[serde(default)]
    pub auth_token: String,
}

impl DatabaseConfig {
    /// Creates a config from the two settings.
    pub fn new(database_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            auth_token: auth_token.into(),
        }
    }

    /// Checks that both the URL and the token are present.
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the first missing setting.
    pub fn validate(&self) -> Result<()> {
        if is_blank(&self.database_url) {
            return Err(Error::config("database URL is missing"));
        }
        if is_blank(&self.auth_token) {
            return Err(Error::config("authentication token is missing"));
        }
        Ok(())
    }

    /// Fills empty or whitespace-only settings from `TURSO_DATABASE_URL` / `TURSO_AUTH_TOKEN`.
    ///
    /// Values stored in the config file take precedence over the environment.
    #[must_use]
    pub fn with_env_fallback(self) -> Self {
        self.with_fallback(|key| std::env::var(key).ok())
    }

    /// Fills empty settings using `lookup`, keyed by environment variable name.
    #[must_use]
    pub fn with_fallback<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if is_blank(&self.database_url) {
            if let Some(url) = lookup(DATABASE_URL_VAR) {
                self.database_url = url;
            }
        }
        if is_blank(&self.auth_token) {
            if let Some(token) = lookup(AUTH_TOKEN_VAR) {
                self.auth_token = token;
            }
        }
        self
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Returns the default config file path, creating the application folder if needed.
///
/// # Errors
/// Returns an error if the OS has no config directory or the folder cannot be created.
pub fn config_file_path() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| Error::config("no user config directory on this system"))?;
    let app_dir = base.join(APP_CONFIG_DIR);
    fs::create_dir_all(&app_dir)?;
    Ok(app_dir.join(CONFIG_FILE_NAME))
}

/// Loads the config from the default location.
///
/// # Errors
/// See [`load_from`].
pub fn load() -> Result<DatabaseConfig> {
    load_from(config_file_path()?)
}

/// Saves the config to the default location.
///
/// # Errors
/// See [`save_to`].
pub fn save(config: &DatabaseConfig) -> Result<()> {
    save_to(config_file_path()?, config)
}

/// Loads the config stored at `path`.
///
/// A file that does not exist yields an empty config.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or is not valid JSON.
pub fn load_from<P: AsRef<Path>>(path: P) -> Result<DatabaseConfig> {
    let path = path.as_ref();
    debug!("Loading database config from {:?}", path);
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DatabaseConfig::default()),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&contents).map_err(|e| {
        Error::config(format!("Failed to parse config file {}: {e}", path.display()))
    })
}

/// Writes the config as JSON to `path`, replacing any previous file.
///
/// # Errors
/// Returns an error if serialization or the write fails.
pub fn save_to<P: AsRef<Path>>(path: P, config: &DatabaseConfig) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string(config)?;
    fs::write(path, json)?;
    debug!("Saved database config to {:?}", path);
    Ok(())
}
