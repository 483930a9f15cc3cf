//! Book store capability
//!
//! The pipeline only ever talks to storage through [`BookStore`]. Callers
//! bound each call with `tokio::time::timeout`; implementations must leave
//! storage consistent if their future is dropped mid-call.

pub mod memory;

use async_trait::async_trait;

use crate::book::{Book, BookFilters};
use crate::error::Result;

pub use memory::MemoryBookStore;

/// CRUD access to the books table (testable)
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert when `book.id == 0`, update otherwise.
    ///
    /// Returns the stored book with its identifier set. Updating an id that
    /// does not exist fails with `NotFound`.
    async fn store(&self, book: Book) -> Result<Book>;

    /// Fetch one book, `NotFound` if absent
    async fn get(&self, id: i64) -> Result<Book>;

    /// Delete one book, `NotFound` if nothing was removed
    async fn delete(&self, book: &Book) -> Result<()>;

    /// List books matching `filters`, ordered by id
    async fn list(&self, filters: &BookFilters) -> Result<Vec<Book>>;
}
