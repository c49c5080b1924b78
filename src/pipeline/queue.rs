//! FIFO task queue
//!
//! Tasks are served strictly in enqueue order; there is no priority lane and
//! no internal bound. Backpressure, if any, is the dispatcher's job (it
//! rejects colliding destinations before calling [`TaskQueue::enqueue`]).

use crate::error::{Error, Result};
use crate::types::DownloadTask;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};

/// Unbounded multi-producer FIFO of pending download tasks
///
/// `enqueue` is safe from many producers; `dequeue` is safe from many
/// consumers (the worker pool) and suspends cooperatively until a task is
/// available - no polling.
#[derive(Clone)]
pub(crate) struct TaskQueue {
    tx: mpsc::UnboundedSender<DownloadTask>,
    /// Receiver shared by all workers; the lock is held only across one
    /// `recv`, so exactly one worker wakes per task
    rx: Arc<Mutex<mpsc::UnboundedReceiver<DownloadTask>>>,
    depth: Arc<AtomicUsize>,
}

impl TaskQueue {
    /// Create an empty queue
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            depth: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Append a task, returning its position in the queue (1-based)
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] if the queue has been closed.
    pub(crate) fn enqueue(&self, task: DownloadTask) -> Result<usize> {
        // The increment must land before the send: a consumer parked in
        // `dequeue` runs its decrement the moment the task arrives, and the
        // counter may never go below the number of sent tasks.
        let position = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        if self.tx.send(task).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::ShuttingDown);
        }
        Ok(position)
    }

    /// Wait for and take the next task in FIFO order
    ///
    /// Suspends the calling worker until a task arrives. Returns `None` only
    /// when the queue is closed and drained.
    pub(crate) async fn dequeue(&self) -> Option<DownloadTask> {
        let mut rx = self.rx.lock().await;
        let task = rx.recv().await;
        if task.is_some() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
        }
        task
    }

    /// Number of tasks currently waiting (excludes active tasks)
    pub(crate) fn len(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}
