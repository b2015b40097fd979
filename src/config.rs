//! Configuration management for Libreria server

use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix placed before the `/v1` version segment
    pub url_prefix: String,
    pub request_timeout_secs: u64,
    /// How long in-flight requests may run once shutdown has begun
    pub shutdown_grace_secs: u64,
}

impl ServerConfig {
    /// Mount point of the versioned API, e.g. `/api/v1`
    pub fn api_base(&self) -> String {
        format!("{}/v1", self.url_prefix.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    /// Full connection URL; takes precedence over the individual parts
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Connection attempts made at startup before giving up
    pub max_retries: u32,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment variables, e.g. LIBRERIA_SERVER__PORT=9090
            .add_source(
                Environment::with_prefix("LIBRERIA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            url_prefix: "/api".to_string(),
            request_timeout_secs: 30,
            shutdown_grace_secs: 5,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            name: "libreria".to_string(),
            user: "postgres".to_string(),
            password: "12345".to_string(),
            max_connections: 10,
            min_connections: 1,
            max_retries: 5,
            read_timeout_secs: 10,
            write_timeout_secs: 10,
            run_migrations: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        }
    }
}
