//! Library service: the entry point the transport layer calls into
//!
//! Owns the book store handle and the pipeline configuration. Batches go
//! through the worker pool; single-book calls go straight to the store
//! under the same per-call deadline.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::book::{Book, BookFilters};
use crate::error::{LibraryError, Result};
use crate::pipeline::{run_batch, BatchResult, OperationKind, PipelineConfig};
use crate::store::BookStore;

/// Cheap to clone; clones share one store handle
#[derive(Clone)]
pub struct LibraryService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    store: Arc<dyn BookStore>,
    config: PipelineConfig,
}

impl fmt::Debug for LibraryService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryService")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl LibraryService {
    /// Build a service around `store`.
    ///
    /// Fails with `InvalidConfiguration` when no store is given. Zero-valued
    /// settings in `config` have already been replaced by defaults.
    pub fn new(store: Option<Arc<dyn BookStore>>, config: PipelineConfig) -> Result<Self> {
        let store = store
            .ok_or_else(|| LibraryError::invalid_configuration("book store must not be empty"))?;

        debug!(
            concurrency = config.concurrency(),
            timeout_ms = config.timeout().as_millis() as u64,
            "library service ready"
        );

        Ok(Self {
            inner: Arc::new(ServiceInner { store, config }),
        })
    }

    pub fn config(&self) -> PipelineConfig {
        self.inner.config
    }

    /// Persist every book in `books` concurrently.
    ///
    /// Always returns both the stored books (in completion order) and the
    /// combined error of the units that failed, if any.
    #[instrument(skip_all, fields(books = books.len()))]
    pub async fn store_batch(&self, books: Vec<Book>) -> BatchResult<Book> {
        let store = Arc::clone(&self.inner.store);

        run_batch(books, self.inner.config, OperationKind::Store, move |book| {
            let store = Arc::clone(&store);
            async move { store.store(book).await }
        })
        .await
    }

    /// Fetch a single book. `NotFound` if it does not exist.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> Result<Book> {
        self.bounded(self.inner.store.get(id)).await
    }

    /// Delete a single book, returning what was removed.
    ///
    /// The lookup and the delete share one deadline.
    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: i64) -> Result<Book> {
        let store = &self.inner.store;
        self.bounded(async {
            let book = store.get(id).await?;
            store.delete(&book).await?;
            Ok(book)
        })
        .await
    }

    /// List books matching `filters`
    #[instrument(skip(self))]
    pub async fn list(&self, filters: &BookFilters) -> Result<Vec<Book>> {
        self.bounded(self.inner.store.list(filters)).await
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let timeout = self.inner.config.timeout();
        tokio::time::timeout(timeout, call)
            .await
            .unwrap_or_else(|_| Err(LibraryError::timeout(timeout)))
    }
}
