//! Application configuration
//!
//! Layered lowest to highest priority: built-in defaults, an optional TOML
//! file, then environment variables. The CLI applies its flags on top.
//!
//! Environment variables:
//! - `LIBRARY_LISTEN_HOST`, `LIBRARY_LISTEN_PORT`, `LIBRARY_REQUEST_TIMEOUT`
//! - `LIBRARY_SERVICE_DB_HOST`, `LIBRARY_SERVICE_DB_PORT`,
//!   `LIBRARY_SERVICE_DB_SSL_ENABLED`, `LIBRARY_SERVICE_DB_NAME`,
//!   `LIBRARY_SERVICE_DB_CRED_PATH`
//! - `LIBRARY_SERVICE_TIMEOUT` (seconds), `LIBRARY_CONCURRENCY`
//! - `DATABASE_URL` replaces the individual database settings

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use cloudlib_core::PipelineConfig;
use serde::{Deserialize, Serialize};

use crate::db::PostgresOptions;

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path:?} is empty; it must contain valid database credentials")]
    EmptyFile { path: PathBuf },

    #[error("could not parse credentials in {path:?}: {source}")]
    Credentials {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid TOML in {path:?}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("environment variable {var}={value:?} is invalid: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid listen address {addr:?}")]
    InvalidAddr { addr: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub library: LibrarySection,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub cors_permissive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_secs: 15,
            cors_permissive: false,
        }
    }
}

/// Database and pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySection {
    /// Full connection string; overrides the individual database fields
    pub database_url: Option<String>,
    pub database_host: String,
    pub database_port: u16,
    pub database_ssl_enabled: bool,
    pub database_name: String,
    /// JSON file holding `{"username": .., "password": ..}`
    pub database_credentials: PathBuf,
    pub max_connections: u32,
    /// Per-operation deadline in seconds
    pub timeout_secs: u64,
    /// Worker count for batch persistence
    pub concurrency: usize,
}

impl Default for LibrarySection {
    fn default() -> Self {
        Self {
            database_url: None,
            database_host: "127.0.0.1".to_string(),
            database_port: 5432,
            database_ssl_enabled: false,
            database_name: "library".to_string(),
            database_credentials: PathBuf::from("/credentials.json"),
            max_connections: 5,
            timeout_secs: 30,
            concurrency: 5,
        }
    }
}

impl LibrarySection {
    pub fn postgres_options(&self) -> PostgresOptions {
        PostgresOptions {
            host: self.database_host.clone(),
            port: self.database_port,
            database: self.database_name.clone(),
            ssl_enabled: self.database_ssl_enabled,
        }
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig::new(self.concurrency, Duration::from_secs(self.timeout_secs))
    }
}

impl AppConfig {
    /// Load defaults, then `path` (or the default file if it exists), then
    /// the process environment.
    ///
    /// An explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Default config file: ~/.cloudlib/config.toml
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cloudlib/config.toml")
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overwrite fields from variables returned by `lookup`.
    ///
    /// Unset variables keep the current value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = &mut self.server;
        let library = &mut self.library;

        if let Some(v) = lookup("LIBRARY_LISTEN_HOST") {
            server.host = v;
        }
        set_parsed(&lookup, "LIBRARY_LISTEN_PORT", &mut server.port)?;
        set_parsed(&lookup, "LIBRARY_REQUEST_TIMEOUT", &mut server.request_timeout_secs)?;

        if let Some(v) = lookup("LIBRARY_SERVICE_DB_HOST") {
            library.database_host = v;
        }
        set_parsed(&lookup, "LIBRARY_SERVICE_DB_PORT", &mut library.database_port)?;
        set_parsed(&lookup, "LIBRARY_SERVICE_DB_SSL_ENABLED", &mut library.database_ssl_enabled)?;
        if let Some(v) = lookup("LIBRARY_SERVICE_DB_NAME") {
            library.database_name = v;
        }
        if let Some(v) = lookup("LIBRARY_SERVICE_DB_CRED_PATH") {
            library.database_credentials = PathBuf::from(v);
        }
        set_parsed(&lookup, "LIBRARY_SERVICE_TIMEOUT", &mut library.timeout_secs)?;
        set_parsed(&lookup, "LIBRARY_CONCURRENCY", &mut library.concurrency)?;

        if let Some(url) = lookup("DATABASE_URL").filter(|u| !u.is_empty()) {
            library.database_url = Some(url);
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|_| ConfigError::InvalidAddr { addr })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

fn set_parsed<F, T>(lookup: &F, var: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = lookup(var) {
        *slot = value.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnv {
            var,
            value: value.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}
