//! Worker pool: drains the unit stream with a fixed number of workers

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::dispatch::UnitStream;
use super::{Operation, OperationKind, PipelineConfig};
use crate::error::{LibraryError, Result};

/// Spawn `config.concurrency()` workers over `units`.
///
/// Every unit gets its own `config.timeout()` deadline; an expired deadline
/// drops the call and reports a storage failure for that unit only. The
/// returned operation stream closes once every worker has exited, since each
/// worker owns one sender and the pool keeps none.
pub fn spawn_workers<I, T, F, Fut>(
    units: UnitStream<I>,
    config: PipelineConfig,
    kind: OperationKind,
    task: F,
) -> (mpsc::Receiver<Operation<T>>, Vec<JoinHandle<()>>)
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.concurrency());
    let task = Arc::new(task);
    let timeout = config.timeout();

    let workers = (0..config.concurrency())
        .map(|worker| {
            let units = units.clone();
            let tx = tx.clone();
            let task = Arc::clone(&task);

            tokio::spawn(async move {
                let mut handled = 0usize;
                while let Some((index, item)) = units.next().await {
                    let outcome = match tokio::time::timeout(timeout, task(item)).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(LibraryError::timeout(timeout)),
                    };
                    handled += 1;

                    debug!(worker, index, ok = outcome.is_ok(), "unit processed");
                    if tx.send(Operation { index, kind, outcome }).await.is_err() {
                        break;
                    }
                }
                debug!(worker, handled, "worker exited");
            })
        })
        .collect();

    (rx, workers)
}
