//! Configuration module for modelsmith.
//!
//! Handles the connection descriptor, environment variables, and settings.
//! Only the binary reads configuration; library entry points take explicit
//! option structs.

mod connection;
mod settings;

pub use connection::{ConnectionConfig, ConnectionError, Driver};
pub use settings::{
    expand_env_vars, CatalogSettings, ConnectionSettings, OutputSettings, Settings, SettingsError,
};
