//! cloudlib-core: book records and the concurrent batch-persistence pipeline
//!
//! The [`LibraryService`] accepts a batch of books, fans it out to a fixed
//! pool of workers that each call the [`BookStore`] under a per-call
//! deadline, and folds the outcomes into one [`BatchResult`].

pub mod book;
pub mod error;
pub mod pipeline;
pub mod service;
pub mod store;

pub use book::{Book, BookFilters};
pub use error::{BatchError, LibraryError, Result, UnitFailure};
pub use pipeline::{BatchResult, Operation, OperationKind, PipelineConfig};
pub use service::LibraryService;
pub use store::{BookStore, MemoryBookStore};
