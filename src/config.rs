use crate::core::db::{ConnectOptions, DEFAULT_HOST};
use crate::core::{DbalError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: Option<LoggingConfig>,
}

/// Connection settings.
#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
    pub host: Option<String>,
    pub create_if_missing: Option<bool>,
    pub read_only: Option<bool>,
    pub foreign_keys: Option<bool>,
}

/// Logging configuration, used by the command line front end.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl Config {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DbalError::Config(e.to_string()))
    }

    /// Log filter directive, if one is configured.
    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref()?.level.as_deref()
    }
}

impl DatabaseConfig {
    /// Builds connect options, filling unset fields with their defaults.
    pub fn to_options(&self) -> ConnectOptions {
        let defaults = ConnectOptions::new(&self.user, &self.password, &self.database);
        ConnectOptions {
            host: self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
            create_if_missing: self.create_if_missing.unwrap_or(defaults.create_if_missing),
            read_only: self.read_only.unwrap_or(defaults.read_only),
            foreign_keys: self.foreign_keys.unwrap_or(defaults.foreign_keys),
            ..defaults
        }
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = dbal::config::load_config("dbal.toml").expect("Failed to load config");
/// println!("{:?}", config.database.to_options());
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    Config::from_toml_str(&content)
}
