//! Startup and shutdown coordination.

use crate::error::Result;
use crate::types::Event;
use std::sync::atomic::Ordering;

use super::MediaPipeline;

impl MediaPipeline {
    /// Start the worker pool
    ///
    /// Launches `worker_count` workers, each running an unbounded
    /// dequeue-process loop. The count is fixed for the lifetime of the
    /// pipeline; calling `start` again while workers are running is a no-op.
    pub async fn start(&self) -> Result<()> {
        let mut workers = self.workers.lock().await;

        if !workers.is_empty() {
            tracing::warn!("Worker pool already started, ignoring");
            return Ok(());
        }

        for worker_id in 0..self.config.worker_count {
            workers.push(self.spawn_worker(worker_id));
        }

        tracing::info!(
            worker_count = self.config.worker_count,
            download_dir = %self.config.download_dir.display(),
            "Worker pool started"
        );

        Ok(())
    }

    /// Gracefully shut down the pipeline
    ///
    /// The shutdown sequence:
    /// 1. Stops accepting new downloads (enqueue returns `ShuttingDown`)
    /// 2. Signals all workers to stop
    /// 3. Waits for each worker to finish its current task and exit
    /// 4. Emits the `Shutdown` event
    ///
    /// A worker that is mid-transfer completes that task normally before
    /// exiting; only idle waits are interrupted.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);
        self.shutdown_token.cancel();

        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Worker ended abnormally during shutdown");
            }
        }

        self.emit_event(Event::Shutdown);
        tracing::info!("Graceful shutdown complete");

        Ok(())
    }
}
