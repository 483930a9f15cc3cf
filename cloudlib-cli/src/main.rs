//! cloudlib CLI - book library service
//!
//! Entry point for the library service:
//! - `serve` runs the HTTP API on PostgreSQL (or an in-memory store)
//! - `migrate` creates the books schema
//! - `import` stores a JSON file of books through the batch pipeline

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "cloudlib",
    author,
    version,
    about = "Book library service with concurrent batch persistence",
    long_about = "Store and query books in PostgreSQL. Batches of books are persisted \
                  concurrently by a bounded worker pool with a per-book timeout."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the `telemetry` feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::ServeArgs),
    /// Create the database schema and exit
    Migrate(commands::MigrateArgs),
    /// Import books from a JSON file
    Import(commands::ImportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })
    .ok();

    let result = match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::Migrate(args) => commands::run_migrate(args).await,
        Commands::Import(args) => commands::run_import(args).await,
    };

    tracing_setup::shutdown();
    result
}
