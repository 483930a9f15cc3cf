//! Subcommand implementations and the plumbing they share

pub mod import;
pub mod migrate;
pub mod serve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use cloudlib_server::config::LibrarySection;
use cloudlib_server::db::{connect_options, create_pool_with_options, Credentials};
use cloudlib_server::AppConfig;
use sqlx::postgres::PgConnectOptions;
use sqlx::PgPool;

pub use import::{run_import, ImportArgs};
pub use migrate::{run_migrate, MigrateArgs};
pub use serve::{run_serve, ServeArgs};

/// Where configuration and the database come from
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Config file (default: ~/.cloudlib/config.toml if present)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database URL (overrides config/environment)
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,
}

impl ConfigArgs {
    /// Defaults, then the config file, then the environment, then flags
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref()).context("Failed to load configuration")?;

        if let Some(url) = &self.database_url {
            config.library.database_url = Some(url.clone());
        }
        Ok(config)
    }
}

/// Batch pipeline tuning
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Number of concurrent store workers (0 = service default)
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Per-operation timeout in seconds (0 = service default)
    #[arg(long, value_name = "S")]
    pub timeout_secs: Option<u64>,
}

impl PipelineArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(concurrency) = self.concurrency {
            config.library.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout_secs {
            config.library.timeout_secs = timeout;
        }
    }
}

/// Open a pool from a URL or from host settings plus the credentials file
pub async fn connect(library: &LibrarySection) -> Result<PgPool> {
    let options = match &library.database_url {
        Some(url) => url
            .parse::<PgConnectOptions>()
            .context("Invalid database URL")?,
        None => {
            let credentials = Credentials::from_file(&library.database_credentials)
                .context("Failed to load database credentials")?;
            connect_options(&library.postgres_options(), &credentials)
        }
    };

    tracing::info!(
        host = options.get_host(),
        port = options.get_port(),
        database = options.get_database().unwrap_or_default(),
        "Connecting to database"
    );

    create_pool_with_options(options, library.max_connections)
        .await
        .context("Failed to create database pool")
}
