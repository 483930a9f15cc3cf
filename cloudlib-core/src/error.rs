/// Structured error types for cloudlib-core.
///
/// Per-unit failures (`NotFound`, `StorageFailure`) travel inside the
/// pipeline as values; `BatchPartialFailure` is the combined error a batch
/// call hands back when at least one unit failed.
use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Main error type for cloudlib-core operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    /// Service was constructed without what it needs to run
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// A read, update or delete referenced a book that does not exist
    #[error("book {id} not found")]
    NotFound { id: i64 },

    /// Any other failure reported by the store, timeouts included
    #[error("storage failure: {reason}")]
    StorageFailure { reason: String },

    /// One or more units of a batch failed
    #[error("{0}")]
    BatchPartialFailure(BatchError),
}

/// Result type alias for cloudlib-core operations
pub type Result<T> = std::result::Result<T, LibraryError>;

impl LibraryError {
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    /// Wrap any backend error as a storage failure
    pub fn storage(err: impl fmt::Display) -> Self {
        Self::StorageFailure {
            reason: err.to_string(),
        }
    }

    /// Storage failure for a call that outlived its deadline
    pub fn timeout(after: Duration) -> Self {
        Self::StorageFailure {
            reason: format!("operation timed out after {}ms", after.as_millis()),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::StorageFailure { reason } if reason.starts_with("operation timed out"))
    }
}

/// One failed unit of a batch, tagged with its position in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub index: usize,
    pub error: LibraryError,
}

impl fmt::Display for UnitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit #{}: {}", self.index, self.error)
    }
}

/// Combined error of a batch run.
///
/// Never empty: a batch with no failures has no `BatchError` at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    failures: Vec<UnitFailure>,
    total: usize,
}

impl BatchError {
    /// Join per-unit failures. Returns `None` when there are none.
    pub fn join(mut failures: Vec<UnitFailure>, total: usize) -> Option<Self> {
        if failures.is_empty() {
            return None;
        }
        failures.sort_by_key(|f| f.index);
        Some(Self { failures, total })
    }

    /// Failures in input order
    pub fn failures(&self) -> &[UnitFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<UnitFailure> {
        self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of units in the batch the failures came from
    pub fn batch_size(&self) -> usize {
        self.total
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} units failed", self.failures.len(), self.total)?;
        for failure in &self.failures {
            write!(f, "\n  {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchError {}

impl From<BatchError> for LibraryError {
    fn from(err: BatchError) -> Self {
        Self::BatchPartialFailure(err)
    }
}
