//! Batch dispatcher: turns a batch into a stream of work units

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

/// One unit of work: its position in the input plus the item itself
pub type Unit<I> = (usize, I);

/// Receiving end of the unit stream, shared by every worker.
///
/// Each unit is handed to exactly one caller of [`UnitStream::next`].
pub struct UnitStream<I> {
    rx: Arc<Mutex<mpsc::Receiver<Unit<I>>>>,
}

impl<I> Clone for UnitStream<I> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<I> UnitStream<I> {
    /// Next unit, or `None` once the stream is closed and empty
    pub async fn next(&self) -> Option<Unit<I>> {
        self.rx.lock().await.recv().await
    }
}

/// Offer `items` in input order on a bounded stream.
///
/// The producer runs on its own task so the caller can start workers right
/// away; it waits whenever `capacity` units are queued. The stream closes
/// after the last item has been offered, or early if every receiver is gone.
pub fn dispatch<I>(items: Vec<I>, capacity: usize) -> UnitStream<I>
where
    I: Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(async move {
        for unit in items.into_iter().enumerate() {
            if tx.send(unit).await.is_err() {
                tracing::debug!("unit stream has no receivers left, stopping dispatch");
                break;
            }
        }
    });

    UnitStream {
        rx: Arc::new(Mutex::new(rx)),
    }
}
