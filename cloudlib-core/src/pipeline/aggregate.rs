//! Result aggregator: drains operations and partitions outcomes

use tokio::sync::mpsc;
use tracing::warn;

use super::{BatchResult, Operation};
use crate::error::{BatchError, LibraryError, UnitFailure};

/// Drain `ops` until it closes, then combine the outcomes.
///
/// `total` is the batch size. Any unit that never produced an operation
/// (its worker died mid-call) is reported as a storage failure so the
/// result always accounts for every unit exactly once.
pub async fn drain<T>(mut ops: mpsc::Receiver<Operation<T>>, total: usize) -> BatchResult<T> {
    let mut successes = Vec::with_capacity(total);
    let mut failures = Vec::new();
    let mut reported = vec![false; total];

    while let Some(op) = ops.recv().await {
        match reported.get_mut(op.index) {
            Some(seen) if !*seen => *seen = true,
            _ => {
                warn!(index = op.index, "ignoring operation for unknown or duplicate unit");
                continue;
            }
        }

        match op.outcome {
            Ok(payload) => successes.push(payload),
            Err(error) => {
                warn!(index = op.index, kind = %op.kind, error = %error, "unit failed");
                failures.push(UnitFailure {
                    index: op.index,
                    error,
                });
            }
        }
    }

    for (index, _) in reported.iter().enumerate().filter(|(_, seen)| !**seen) {
        warn!(index, "unit lost by its worker");
        failures.push(UnitFailure {
            index,
            error: LibraryError::storage("worker exited before reporting this unit"),
        });
    }

    BatchResult {
        successes,
        error: BatchError::join(failures, total),
    }
}
