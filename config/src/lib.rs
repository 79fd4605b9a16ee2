//! # Configuration Management for Warehouse
//!
//! This crate provides the configuration structures shared by the warehouse
//! crates: the database connection settings and the manager options.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{DatabaseConfig, WarehouseOptions};
//!
//! let db_config = DatabaseConfig::new(
//!     "localhost".to_string(), 5432, "warehouse".to_string(),
//!     "postgres".to_string(), "password".to_string(),
//!     30, 30,
//! );
//!
//! let options = WarehouseOptions::default().with_default_page_size(50);
//! assert_eq!(options.default_page_size, 50);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [database]
//! host = "localhost"
//! port = 5432
//! database = "warehouse"
//! username = "postgres"
//! password = "password"
//! connection_timeout_seconds = 30
//! command_timeout_seconds = 30
//!
//! [warehouse]
//! schema = "warehouse"
//! default_page_size = 20
//! command_timeout_seconds = 30
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from warehouse.toml (or the path in WAREHOUSE_CONFIG)
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./warehouse.toml";
const CONFIG_PATH_VARIABLE: &str = "WAREHOUSE_CONFIG";

/// Default schema holding the warehouse stored procedures.
pub const DEFAULT_SCHEMA: &str = "warehouse";
/// Default number of items per page returned by `find` operations.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Default command timeout in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub warehouse: WarehouseOptions,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; when set it takes precedence over the discrete fields.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_timeout")]
    pub connection_timeout_seconds: u64,
    #[serde(default = "default_timeout")]
    pub command_timeout_seconds: u64,
}

/// Options used to configure the warehouse managers and stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseOptions {
    /// Schema holding the stored procedures called by the PostgreSQL stores.
    pub schema: String,
    /// Page size used by `find` when the caller does not give one.
    pub default_page_size: usize,
    /// Timeout applied to every store command.
    pub command_timeout_seconds: u64,
}

fn default_port() -> u16 {
    5432
}

fn default_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECONDS
}

impl AppConfig {
    /// Load configuration from the TOML file named by `WAREHOUSE_CONFIG` (in `.env`
    /// or the environment) or from `./warehouse.toml`
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is not an error, the variable may come from the environment
        let _ = dotenvy::dotenv();

        match dotenvy::var(CONFIG_PATH_VARIABLE) {
            Ok(config_path) => Self::from_file(&config_path),
            Err(dotenvy::Error::EnvVar(_)) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)
            }
            Err(dotenvy::Error::EnvVar(_)) => Err(ConfigError::Invalid(format!(
                "Config path must be specified as {} or in {} file",
                CONFIG_PATH_VARIABLE, DEFAULT_CONFIG_PATH
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.warehouse.validate()
    }
}

impl DatabaseConfig {
    /// Create a new database configuration
    pub fn new(
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
        connection_timeout_seconds: u64,
        command_timeout_seconds: u64,
    ) -> Self {
        Self {
            url: None,
            host,
            port,
            database,
            username,
            password,
            connection_timeout_seconds,
            command_timeout_seconds,
        }
    }

    /// Create a configuration from a full connection URL
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            host: String::new(),
            port: default_port(),
            database: String::new(),
            username: String::new(),
            password: String::new(),
            connection_timeout_seconds: DEFAULT_COMMAND_TIMEOUT_SECONDS,
            command_timeout_seconds: DEFAULT_COMMAND_TIMEOUT_SECONDS,
        }
    }

    /// Build connection string
    pub fn connection_string(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.url {
            if url.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "Database url cannot be empty".to_string(),
                ));
            }
        } else {
            if self.host.is_empty() {
                return Err(ConfigError::Invalid(
                    "Database host cannot be empty".to_string(),
                ));
            }
            if self.port == 0 {
                return Err(ConfigError::Invalid(
                    "Database port cannot be zero".to_string(),
                ));
            }
            if self.database.is_empty() {
                return Err(ConfigError::Invalid(
                    "Database name cannot be empty".to_string(),
                ));
            }
            if self.username.is_empty() {
                return Err(ConfigError::Invalid(
                    "Database username cannot be empty".to_string(),
                ));
            }
        }
        if self.connection_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Database connection_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.command_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Database command_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl WarehouseOptions {
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn with_default_page_size(mut self, default_page_size: usize) -> Self {
        self.default_page_size = default_page_size;
        self
    }

    pub fn with_command_timeout(mut self, seconds: u64) -> Self {
        self.command_timeout_seconds = seconds;
        self
    }

    /// Qualify a stored procedure name with the configured schema
    pub fn procedure(&self, name: &str) -> String {
        format!("{}.{}", self.schema, name)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.schema.is_empty() {
            return Err(ConfigError::Invalid(
                "Warehouse schema cannot be empty".to_string(),
            ));
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "Warehouse default_page_size must be greater than 0".to_string(),
            ));
        }
        if self.command_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Warehouse command_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for WarehouseOptions {
    fn default() -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            command_timeout_seconds: DEFAULT_COMMAND_TIMEOUT_SECONDS,
        }
    }
}
