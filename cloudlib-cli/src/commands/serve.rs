//! HTTP server command
//!
//! Builds the library service on PostgreSQL (or in memory) and serves it
//! until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cloudlib_core::{BookStore, LibraryService, MemoryBookStore};
use cloudlib_server::db::{migrations, PgBookStore};
use cloudlib_server::http::{run_server, AppState, ServerConfig};
use sqlx::PgPool;

use super::{connect, ConfigArgs, PipelineArgs};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: LIBRARY_LISTEN_HOST:LIBRARY_LISTEN_PORT or 0.0.0.0:3000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Keep books in memory instead of PostgreSQL (lost on exit)
    #[arg(long)]
    pub in_memory: bool,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = args.config.load()?;
    args.pipeline.apply(&mut config);
    if args.cors_permissive {
        config.server.cors_permissive = true;
    }

    let bind_addr = match args.bind {
        Some(addr) => addr,
        None => config.bind_addr()?,
    };

    let (store, pool): (Arc<dyn BookStore>, Option<PgPool>) = if args.in_memory {
        tracing::warn!("Using in-memory book store; data is lost on exit");
        (Arc::new(MemoryBookStore::new()), None)
    } else {
        let pool = connect(&config.library).await?;
        migrations::run(&pool)
            .await
            .context("Failed to run migrations")?;
        (Arc::new(PgBookStore::new(pool.clone())), Some(pool))
    };

    let service = LibraryService::new(Some(store), config.library.pipeline())?;

    tracing::info!("Starting cloudlib server on {}", bind_addr);

    let server = ServerConfig {
        bind_addr,
        cors_permissive: config.server.cors_permissive,
        request_timeout: config.request_timeout(),
    };

    // Run server (blocks until shutdown)
    let result = run_server(AppState::new(service, pool.clone()), server)
        .await
        .context("Server error");

    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database pool closed");
    }

    result
}
