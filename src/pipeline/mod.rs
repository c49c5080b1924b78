//! Core pipeline implementation split into focused submodules.
//!
//! The `MediaPipeline` struct and its methods are organized by domain:
//! - [`queue`] - FIFO task queue
//! - [`registry`] - in-flight task registry
//! - [`dispatch`] - task admission and enqueueing
//! - [`worker`] - worker pool and the per-task state machine
//! - [`lifecycle`] - startup and shutdown coordination

mod dispatch;
mod lifecycle;
mod queue;
mod registry;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use dispatch::{DownloadRequest, Enqueued};

use crate::classify::{ExtensionClassifier, FileClassifier};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::ports::{MediaTransfer, Notifier};
use crate::types::{Event, QueueStats};
use queue::TaskQueue;
use registry::Registry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64};
use tokio_util::sync::CancellationToken;

/// Main pipeline instance (cloneable - all fields are Arc-wrapped)
///
/// Owns the task queue, the in-flight registry and the worker pool. All
/// state lives inside the value; there are no ambient globals, and dropping
/// the last clone after [`shutdown`](MediaPipeline::shutdown) releases
/// everything.
#[derive(Clone)]
pub struct MediaPipeline {
    /// Configuration (wrapped in Arc for sharing across workers)
    pub(crate) config: Arc<Config>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Media transfer port (trait object for pluggable implementations)
    pub(crate) transfer: Arc<dyn MediaTransfer>,
    /// Notification port for requester-visible status messages
    pub(crate) notifier: Arc<dyn Notifier>,
    /// Filename classification port
    pub(crate) classifier: Arc<dyn FileClassifier>,
    /// FIFO of pending tasks
    pub(crate) queue: TaskQueue,
    /// Registry of queued and active tasks
    pub(crate) registry: Registry,
    /// Counter behind fresh task identities
    pub(crate) next_task_id: Arc<AtomicU64>,
    /// Cancellation signal observed by idle workers
    pub(crate) shutdown_token: CancellationToken,
    /// Join handles of the running workers
    pub(crate) workers: Arc<tokio::sync::Mutex<Vec<tokio::task::JoinHandle<()>>>>,
    /// Flag cleared during shutdown so new enqueues are refused
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl MediaPipeline {
    /// Create a new pipeline
    ///
    /// Validates the configuration, creates the download directory, and wires
    /// the given ports. Filename classification defaults to
    /// [`ExtensionClassifier`]; override it with
    /// [`with_classifier`](MediaPipeline::with_classifier).
    ///
    /// Workers are not running yet - call [`start`](MediaPipeline::start).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the download
    /// directory cannot be created.
    pub async fn new(
        config: Config,
        transfer: Arc<dyn MediaTransfer>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download_dir.display(),
                        e
                    ),
                ))
            })?;

        // Buffer of 1000 events; subscribers that fall further behind see
        // RecvError::Lagged rather than blocking the pipeline.
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        Ok(Self {
            config: Arc::new(config),
            event_tx,
            transfer,
            notifier,
            classifier: Arc::new(ExtensionClassifier),
            queue: TaskQueue::new(),
            registry: Registry::new(),
            next_task_id: Arc::new(AtomicU64::new(1)),
            shutdown_token: CancellationToken::new(),
            workers: Arc::new(tokio::sync::Mutex::new(Vec::new())),
            accepting_new: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Replace the filename classification port
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn FileClassifier>) -> Self {
        tracing::debug!(classifier = classifier.name(), "Classifier replaced");
        self.classifier = classifier;
        self
    }

    /// Subscribe to pipeline events
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Number of tasks currently waiting in the queue
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Snapshot of queued and active task counts
    pub async fn stats(&self) -> QueueStats {
        self.registry.stats().await
    }

    /// Point-in-time listing of queued and active tasks, ordered by identity
    pub async fn tasks(&self) -> Vec<crate::types::TaskSnapshot> {
        self.registry.snapshot().await
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// download processing never depends on anyone listening.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
