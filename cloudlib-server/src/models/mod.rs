//! Request models with validation
//!
//! Books arriving over HTTP are checked here before they reach the
//! pipeline. Invalid input returns ValidationError, not panic.

pub mod book;
pub mod validation;

pub use book::{validate_batch, validate_book, Isbn};
pub use validation::ValidationError;
