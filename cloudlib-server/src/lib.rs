//! cloudlib-server: PostgreSQL storage and HTTP API for the library service
//!
//! Implements [`cloudlib_core::BookStore`] on PostgreSQL and exposes
//! [`cloudlib_core::LibraryService`] over HTTP.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;

pub use config::{AppConfig, ConfigError};
pub use db::PgBookStore;
pub use error::{ServerError, ServerResult};
pub use http::{build_router, run_server, AppState, ServerConfig};
