// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use tracing::warn;

/// Which storage backend the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Seeded in-memory maps, lost on restart.
    #[default]
    Memory,
    /// MySQL, configured through the `DB_*` variables.
    Database,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "database" | "db" | "mysql" => Ok(StorageBackend::Database),
            other => Err(anyhow!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            name: "ProjectFlow".to_string(),
            ssl: false,
        }
    }
}

impl DatabaseConfig {
    /// Logs a warning when no password is configured. Local setups often run without one.
    pub fn warn_if_passwordless(&self) -> bool {
        if self.password.is_empty() {
            warn!("DB_PASSWORD not set. Using empty password for local development.");
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub storage: StorageBackend,
    pub database: DatabaseConfig,
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any variable source; unset variables take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = DatabaseConfig::default();

        let host: IpAddr = match lookup("HOST") {
            Some(raw) => raw.parse().with_context(|| format!("Invalid HOST '{}'", raw))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.parse().with_context(|| format!("Invalid PORT '{}'", raw))?,
            None => 5000,
        };
        let storage = match lookup("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::default(),
        };

        let database = DatabaseConfig {
            host: lookup("DB_HOST").unwrap_or(defaults.host),
            port: match lookup("DB_PORT") {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("Invalid DB_PORT '{}'", raw))?,
                None => defaults.port,
            },
            user: lookup("DB_USER").unwrap_or(defaults.user),
            password: lookup("DB_PASSWORD").unwrap_or(defaults.password),
            name: lookup("DB_NAME").unwrap_or(defaults.name),
            ssl: lookup("DB_SSL").as_deref().is_some_and(parse_bool),
        };

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            storage,
            database,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000".parse().unwrap());
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.database, DatabaseConfig::default());
        assert!(config.database.warn_if_passwordless());
    }

    #[test]
    fn test_database_variables() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "database"),
            ("PORT", "8080"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "3307"),
            ("DB_USER", "flow"),
            ("DB_PASSWORD", "secret"),
            ("DB_NAME", "flow_prod"),
            ("DB_SSL", "true"),
        ])
        .unwrap();
        assert_eq!(config.storage, StorageBackend::Database);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3307);
        assert!(config.database.ssl);
        assert!(!config.database.warn_if_passwordless());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config_from(&[("DB_PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "redis")]).is_err());
        assert!(!config_from(&[("DB_SSL", "nope")]).unwrap().database.ssl);
    }
}
