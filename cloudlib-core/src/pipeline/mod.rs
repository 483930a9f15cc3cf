//! Concurrent batch pipeline
//!
//! A batch flows through three stages:
//!
//! - Dispatching: [`dispatch::dispatch`] offers units in input order
//! - Processing: [`pool::spawn_workers`] runs a fixed number of workers,
//!   each unit under its own deadline
//! - Drained: [`aggregate::drain`] has seen the operation stream close and
//!   the [`BatchResult`] is final
//!
//! A failing or timed-out unit never affects its siblings. Completion order
//! is not input order.

pub mod aggregate;
pub mod dispatch;
pub mod pool;

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, error, info, instrument};

use crate::error::{BatchError, LibraryError, Result};

/// Worker count used when none is configured
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Per-operation deadline used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pipeline configuration, fixed for the lifetime of a service.
///
/// Zero values are replaced by the defaults on construction, so a built
/// config always has `concurrency >= 1` and a non-zero timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    concurrency: usize,
    timeout: Duration,
}

impl PipelineConfig {
    pub fn new(concurrency: usize, timeout: Duration) -> Self {
        Self {
            concurrency: if concurrency == 0 {
                DEFAULT_CONCURRENCY
            } else {
                concurrency
            },
            timeout: if timeout.is_zero() {
                DEFAULT_TIMEOUT
            } else {
                timeout
            },
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

/// Action a worker attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Store,
    Get,
    Delete,
    List,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Store => "store",
            Self::Get => "get",
            Self::Delete => "delete",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// Outcome of one unit, produced by one worker
#[derive(Debug)]
pub struct Operation<T> {
    /// Position of the unit in the input batch
    pub index: usize,
    pub kind: OperationKind,
    pub outcome: Result<T>,
}

/// Pipeline stage, reported in traces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Dispatching,
    Processing,
    Drained,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dispatching => "dispatching",
            Self::Processing => "processing",
            Self::Drained => "drained",
        };
        f.write_str(name)
    }
}

/// Aggregate outcome of a batch.
///
/// `successes` are in completion order. `error` is `Some` iff at least one
/// unit failed, and `successes.len() + error.len()` equals the batch size.
#[derive(Debug)]
pub struct BatchResult<T> {
    pub successes: Vec<T>,
    pub error: Option<BatchError>,
}

impl<T> BatchResult<T> {
    /// Result of a batch with no units
    pub fn empty() -> Self {
        Self {
            successes: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn failed(&self) -> usize {
        self.error.as_ref().map_or(0, BatchError::len)
    }

    /// Total outcomes, successes and failures together
    pub fn outcomes(&self) -> usize {
        self.successes.len() + self.failed()
    }

    /// Treat any failed unit as failure of the whole batch
    pub fn into_result(self) -> Result<Vec<T>> {
        match self.error {
            None => Ok(self.successes),
            Some(err) => Err(LibraryError::BatchPartialFailure(err)),
        }
    }
}

/// Run `task` over every item with a bounded worker pool.
///
/// Returns once every unit has an outcome. An empty batch returns at once
/// without spawning anything.
#[instrument(skip_all, fields(kind = %kind, units = items.len(), concurrency = config.concurrency()))]
pub async fn run_batch<I, T, F, Fut>(
    items: Vec<I>,
    config: PipelineConfig,
    kind: OperationKind,
    task: F,
) -> BatchResult<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let total = items.len();
    if total == 0 {
        debug!("empty batch, nothing to dispatch");
        return BatchResult::empty();
    }

    let started = Instant::now();

    debug!(stage = %PipelineStage::Dispatching);
    let units = dispatch::dispatch(items, config.concurrency());

    debug!(stage = %PipelineStage::Processing);
    let (ops, workers) = pool::spawn_workers(units, config, kind, task);
    let result = aggregate::drain(ops, total).await;

    for joined in join_all(workers).await {
        if let Err(err) = joined {
            error!(error = %err, "worker task failed");
        }
    }

    debug!(stage = %PipelineStage::Drained);
    info!(
        succeeded = result.successes.len(),
        failed = result.failed(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch complete"
    );

    result
}
