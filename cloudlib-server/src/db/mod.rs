//! Database layer - connection pool, schema, and the PostgreSQL book store
//!
//! # Design Principles
//!
//! - Connection pool (max 5 connections by default) shared by every worker
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Bound parameters only; filters are assembled with `QueryBuilder`

pub mod books;
pub mod credentials;
pub mod health;
pub mod migrations;
pub mod pool;

pub use books::PgBookStore;
pub use credentials::Credentials;
pub use health::is_alive;
pub use pool::{connect_options, create_pool, create_pool_with_options, PostgresOptions};
