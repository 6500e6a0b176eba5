//! Service configuration
//!
//! Load order: built-in defaults, then an optional JSON file, then
//! environment overrides.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowgateConfig {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

/// Connection and pool settings
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; when set, the discrete fields are ignored
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_db_name")]
    pub name: String,

    /// Schema whose tables are exposed
    #[serde(default = "default_schema")]
    pub schema: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

fn default_db_host() -> String {
    "localhost".to_string()
}
fn default_db_port() -> u16 {
    5432
}
fn default_db_user() -> String {
    "postgres".to_string()
}
fn default_db_name() -> String {
    "postgres".to_string()
}
fn default_schema() -> String {
    "public".to_string()
}
fn default_max_connections() -> u32 {
    10
}
fn default_acquire_timeout_ms() -> u64 {
    5_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: None,
            name: default_db_name(),
            schema: default_schema(),
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
        }
    }
}

// Credentials never reach the logs
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_ms", &self.acquire_timeout_ms)
            .finish()
    }
}

/// Query layer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Column targeted by `booking_status`
    #[serde(default = "default_status_column")]
    pub status_column: String,

    /// Column targeted by `market_segment`
    #[serde(default = "default_segment_column")]
    pub segment_column: String,

    /// Column targeted by `min_price`/`max_price` and aggregated by stats
    #[serde(default = "default_price_column")]
    pub price_column: String,

    /// Largest accepted `limit`
    #[serde(default = "default_max_limit")]
    pub max_limit: i64,

    /// Time budget of one request, covering all of its statements
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_status_column() -> String {
    "booking_status".to_string()
}
fn default_segment_column() -> String {
    "market_segment".to_string()
}
fn default_price_column() -> String {
    "avg_price_per_room".to_string()
}
fn default_max_limit() -> i64 {
    1000
}
fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            status_column: default_status_column(),
            segment_column: default_segment_column(),
            price_column: default_price_column(),
            max_limit: default_max_limit(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl RowgateConfig {
    /// Load from an optional file, then apply process environment overrides
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply overrides from `PORT`, `HOST`, `DATABASE_URL` and the `DB_*`
    /// variables
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_env("PORT", &port)?;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }

        let db = &mut self.database;
        if let Some(url) = lookup("DATABASE_URL") {
            db.url = Some(url);
        }
        if let Some(host) = lookup("DB_HOST") {
            db.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            db.port = parse_env("DB_PORT", &port)?;
        }
        if let Some(user) = lookup("DB_USER") {
            db.user = user;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            db.password = Some(password);
        }
        if let Some(name) = lookup("DB_NAME") {
            db.name = name;
        }
        if let Some(schema) = lookup("DB_SCHEMA") {
            db.schema = schema;
        }

        Ok(())
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be > 0".to_string(),
            ));
        }
        if self.database.schema.is_empty() {
            return Err(ConfigError::Invalid(
                "database.schema must not be empty".to_string(),
            ));
        }
        if self.query.max_limit <= 0 {
            return Err(ConfigError::Invalid("query.max_limit must be > 0".to_string()));
        }
        if self.query.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "query.request_timeout_ms must be > 0".to_string(),
            ));
        }
        for (key, column) in [
            ("query.status_column", &self.query.status_column),
            ("query.segment_column", &self.query.segment_column),
            ("query.price_column", &self.query.price_column),
        ] {
            if column.is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", key)));
            }
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}
