//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;
use cloudlib_server::db::migrations;

use super::{connect, ConfigArgs};

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Create the books schema and exit
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let config = args.config.load()?;
    let pool = connect(&config.library).await?;

    let result = migrations::run(&pool)
        .await
        .context("Failed to run migrations");
    pool.close().await;

    result
}
