//! Shared test helpers: mock ports and pipeline construction.

use crate::config::{Config, ProgressConfig};
use crate::error::{NotifyError, TransferError};
use crate::pipeline::{DownloadRequest, MediaPipeline};
use crate::ports::{MediaTransfer, Notifier, TransferProgress};
use crate::types::{NoticeHandle, RequesterId, SourceRef};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};

/// What a [`MockTransfer`] does when asked to fetch
pub(crate) enum TransferBehavior {
    /// Emit `steps` evenly spaced progress observations, then write the file
    Succeed {
        total_bytes: u64,
        steps: u64,
        delay: Duration,
    },
    /// Like `Succeed` but "forget" to write the destination file
    SucceedWithoutFile { total_bytes: u64 },
    /// Fail with a remote error
    Fail(String),
    /// Never return (timeout tests)
    Hang,
}

/// Scripted media transfer port that records call and concurrency counts
pub(crate) struct MockTransfer {
    behavior: TransferBehavior,
    pub(crate) calls: AtomicUsize,
    active: AtomicUsize,
    pub(crate) max_active: AtomicUsize,
}

impl MockTransfer {
    fn with_behavior(behavior: TransferBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    pub(crate) fn succeed(total_bytes: u64, steps: u64) -> Arc<Self> {
        Self::with_behavior(TransferBehavior::Succeed {
            total_bytes,
            steps,
            delay: Duration::ZERO,
        })
    }

    pub(crate) fn succeed_slow(total_bytes: u64, steps: u64, delay: Duration) -> Arc<Self> {
        Self::with_behavior(TransferBehavior::Succeed {
            total_bytes,
            steps,
            delay,
        })
    }

    pub(crate) fn succeed_without_file(total_bytes: u64) -> Arc<Self> {
        Self::with_behavior(TransferBehavior::SucceedWithoutFile { total_bytes })
    }

    pub(crate) fn fail(message: &str) -> Arc<Self> {
        Self::with_behavior(TransferBehavior::Fail(message.to_string()))
    }

    pub(crate) fn hang() -> Arc<Self> {
        Self::with_behavior(TransferBehavior::Hang)
    }
}

#[async_trait]
impl MediaTransfer for MockTransfer {
    async fn fetch(
        &self,
        _source: &SourceRef,
        destination: &Path,
        progress: mpsc::UnboundedSender<TransferProgress>,
    ) -> Result<(), TransferError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let result = match &self.behavior {
            TransferBehavior::Succeed {
                total_bytes,
                steps,
                delay,
            } => {
                for step in 1..=*steps {
                    if !delay.is_zero() {
                        tokio::time::sleep(*delay).await;
                    }
                    let _ = progress.send(TransferProgress {
                        received_bytes: total_bytes * step / steps,
                        total_bytes: *total_bytes,
                    });
                }
                tokio::fs::write(destination, b"media payload")
                    .await
                    .map_err(TransferError::Io)
            }
            TransferBehavior::SucceedWithoutFile { total_bytes } => {
                let _ = progress.send(TransferProgress {
                    received_bytes: *total_bytes,
                    total_bytes: *total_bytes,
                });
                Ok(())
            }
            TransferBehavior::Fail(message) => Err(TransferError::Remote(message.clone())),
            TransferBehavior::Hang => {
                futures::future::pending::<()>().await;
                unreachable!("pending future never resolves")
            }
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// One recorded notifier operation
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum NoticeOp {
    Send {
        requester: RequesterId,
        message_id: i64,
        text: String,
    },
    Edit {
        message_id: i64,
        text: String,
    },
    Delete {
        message_id: i64,
    },
}

/// Recording notifier with scriptable failure modes
pub(crate) struct MockNotifier {
    next_message_id: AtomicI64,
    fail_sends: bool,
    edits_return_not_modified: bool,
    log: Mutex<Vec<NoticeOp>>,
}

impl MockNotifier {
    fn build(fail_sends: bool, edits_return_not_modified: bool) -> Arc<Self> {
        Arc::new(Self {
            next_message_id: AtomicI64::new(1),
            fail_sends,
            edits_return_not_modified,
            log: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn recording() -> Arc<Self> {
        Self::build(false, false)
    }

    pub(crate) fn failing_sends() -> Arc<Self> {
        Self::build(true, false)
    }

    pub(crate) fn edits_not_modified() -> Arc<Self> {
        Self::build(false, true)
    }

    pub(crate) async fn ops(&self) -> Vec<NoticeOp> {
        self.log.lock().await.clone()
    }

    pub(crate) async fn sent_texts(&self) -> Vec<String> {
        self.log
            .lock()
            .await
            .iter()
            .filter_map(|op| match op {
                NoticeOp::Send { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) async fn edits_for(&self, message_id: i64) -> Vec<String> {
        self.log
            .lock()
            .await
            .iter()
            .filter_map(|op| match op {
                NoticeOp::Edit {
                    message_id: id,
                    text,
                } if *id == message_id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) async fn deleted_ids(&self) -> Vec<i64> {
        self.log
            .lock()
            .await
            .iter()
            .filter_map(|op| match op {
                NoticeOp::Delete { message_id } => Some(*message_id),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, requester: RequesterId, text: &str) -> Result<NoticeHandle, NotifyError> {
        if self.fail_sends {
            return Err(NotifyError::Other("send refused".to_string()));
        }

        let message_id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.log.lock().await.push(NoticeOp::Send {
            requester,
            message_id,
            text: text.to_string(),
        });

        Ok(NoticeHandle {
            requester,
            message_id,
        })
    }

    async fn edit(&self, handle: &NoticeHandle, text: &str) -> Result<(), NotifyError> {
        self.log.lock().await.push(NoticeOp::Edit {
            message_id: handle.message_id,
            text: text.to_string(),
        });

        if self.edits_return_not_modified {
            return Err(NotifyError::NotModified);
        }
        Ok(())
    }

    async fn delete(&self, handle: &NoticeHandle) -> Result<(), NotifyError> {
        self.log.lock().await.push(NoticeOp::Delete {
            message_id: handle.message_id,
        });
        Ok(())
    }
}

/// Test configuration with short delays so suites stay fast
pub(crate) fn test_config(download_dir: std::path::PathBuf) -> Config {
    Config {
        download_dir,
        worker_count: 2,
        transfer_timeout: Duration::from_secs(6 * 3600),
        completion_notice_delay: Duration::from_millis(10),
        inter_task_pause: Duration::from_millis(10),
        progress: ProgressConfig {
            min_interval: Duration::from_millis(50),
            min_percent_step: 2,
        },
    }
}

/// Helper to create a test pipeline wired to mock ports.
/// Returns the pipeline and the tempdir (which must be kept alive).
pub(crate) async fn create_test_pipeline(
    transfer: Arc<MockTransfer>,
    notifier: Arc<MockNotifier>,
) -> (MediaPipeline, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = test_config(temp_dir.path().join("downloads"));

    let pipeline = MediaPipeline::new(config, transfer, notifier).await.unwrap();

    (pipeline, temp_dir)
}

/// A download request for the given raw filename
pub(crate) fn request(raw_filename: &str) -> DownloadRequest {
    DownloadRequest {
        source: SourceRef::new(format!("msg-{raw_filename}")),
        raw_filename: raw_filename.to_string(),
        requester: RequesterId(7),
        size_bytes: 5 * 1024 * 1024,
    }
}

/// Wait until the registry no longer tracks any task, or panic after ~2s
pub(crate) async fn wait_until_idle(pipeline: &MediaPipeline) {
    for _ in 0..200 {
        let stats = pipeline.stats().await;
        if stats.queued == 0 && stats.active == 0 && pipeline.queue_depth() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("pipeline did not go idle in time");
}
