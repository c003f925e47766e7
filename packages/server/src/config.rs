use std::time::Duration;

use common::config::DocumentStoreConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Pool size. Default: 20.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Seconds to wait for a connection. Default: 8.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    20
}
fn default_connect_timeout_secs() -> u64 {
    8
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Access token lifetime. Default: 24.
    #[serde(default = "default_access_ttl_hours")]
    pub access_ttl_hours: i64,
    /// Refresh token lifetime. Default: 168 (one week).
    #[serde(default = "default_refresh_ttl_hours")]
    pub refresh_ttl_hours: i64,
}

fn default_access_ttl_hours() -> i64 {
    24
}
fn default_refresh_ttl_hours() -> i64 {
    168
}

/// Tuning for the achievement record service.
#[derive(Debug, Deserialize, Clone)]
pub struct RecordsConfig {
    /// Deadline applied to every individual store call. Default: 3000.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// Page size when the caller gives none. Default: 10.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Upper bound for a requested page size. Default: 100.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

fn default_store_timeout_ms() -> u64 {
    3000
}
fn default_page_size() -> u64 {
    10
}
fn default_max_page_size() -> u64 {
    100
}

impl RecordsConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout_ms(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub document: DocumentStoreConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub records: RecordsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., LAUREL__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("LAUREL").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
