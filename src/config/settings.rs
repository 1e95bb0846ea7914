//! TOML-based configuration for modelsmith.
//!
//! Supports a config file (modelsmith.toml) with environment variable expansion
//! in connection fields.
//!
//! Example configuration:
//! ```toml
//! [connections.production]
//! driver = "mysql"
//! host = "db.internal"
//! database = "shop"
//! user = "${SHOP_DB_USER}"
//! password = "${SHOP_DB_PASSWORD}"
//!
//! [connections.local]
//! driver = "sqlite"
//! host = "./shop.db"
//!
//! [catalog]
//! timeout_secs = 30
//! max_retries = 2
//! initial_backoff_ms = 100
//! prefetch = false
//!
//! [output]
//! dir = "models"
//! timestamps = true
//! indent = 2
//! pluralization = "suffix"  # or "english"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::connection::{ConnectionConfig, Driver};
use crate::catalog::FacadeOptions;
use crate::emitter::{EmitConfig, Indent};
use crate::model::Pluralization;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Named database connections.
    pub connections: BTreeMap<String, ConnectionSettings>,

    /// Catalog call policy.
    pub catalog: CatalogSettings,

    /// Emission options.
    pub output: OutputSettings,
}

/// Connection configuration. String fields support `${VAR}` / `$VAR`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Database driver (mysql, sqlite).
    pub driver: String,

    /// Server hostname, or database file path for SQLite.
    pub host: String,

    #[serde(default)]
    pub port: Option<u16>,

    /// Schema to inspect.
    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl ConnectionSettings {
    /// Get the driver type.
    pub fn driver_type(&self) -> Result<Driver, SettingsError> {
        self.driver
            .parse()
            .map_err(|_| SettingsError::UnsupportedDriver(self.driver.clone()))
    }

    /// Resolve into a connection descriptor, expanding environment variables.
    pub fn resolve(&self) -> Result<ConnectionConfig, SettingsError> {
        let expand_opt = |value: &Option<String>| value.as_deref().map(expand_env_vars).transpose();

        let host = expand_env_vars(&self.host)?;
        let mut config = match self.driver_type()? {
            Driver::MySql => ConnectionConfig::mysql(host, expand_opt(&self.database)?.unwrap_or_default()),
            Driver::Sqlite => ConnectionConfig::sqlite(host),
        };
        config.port = self.port;
        config.username = expand_opt(&self.user)?;
        config.password = expand_opt(&self.password)?;
        Ok(config)
    }
}

/// Catalog call policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Timeout for each catalog call, in seconds.
    pub timeout_secs: u64,

    /// Retries for connectivity failures.
    pub max_retries: u32,

    /// First retry delay in milliseconds (doubles per retry).
    pub initial_backoff_ms: u64,

    /// Fetch all table metadata concurrently before classifying.
    pub prefetch: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 2,
            initial_backoff_ms: 100,
            prefetch: false,
        }
    }
}

impl CatalogSettings {
    pub fn facade_options(&self) -> FacadeOptions {
        FacadeOptions::default()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retries(self.max_retries, Duration::from_millis(self.initial_backoff_ms))
    }
}

/// Emission options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory the artifacts are written to.
    pub dir: PathBuf,

    /// `timestamps` option of every generated table.
    pub timestamps: bool,

    /// Spaces per indent level; 0 for tabs.
    pub indent: usize,

    pub pluralization: Pluralization,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            timestamps: true,
            indent: 2,
            pluralization: Pluralization::Suffix,
        }
    }
}

impl OutputSettings {
    pub fn emit_config(&self) -> EmitConfig {
        EmitConfig::default()
            .with_indent(Indent::from_width(self.indent))
            .with_timestamps(self.timestamps)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `MODELSMITH_CONFIG`
    /// 2. `./modelsmith.toml`
    /// 3. `<config dir>/modelsmith/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("MODELSMITH_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("modelsmith.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("modelsmith").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    /// Get the default connection ("default" if defined, else the first by name).
    pub fn default_connection(&self) -> Option<(&str, &ConnectionSettings)> {
        if let Some(conn) = self.connections.get("default") {
            return Some(("default", conn));
        }
        self.connections.iter().next().map(|(k, v)| (k.as_str(), v))
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A lone `$` is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                result.push('$');
                continue;
            }
        }

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
