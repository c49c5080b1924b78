//! In-flight task registry
//!
//! The registry is the single shared mutable structure of the pipeline: a
//! map from task identity to its live record, restricted to tasks that are
//! Queued or Active. All mutation happens under one mutex so that
//! "check-not-already-active, then mark-active" and "remove-on-terminal" are
//! atomic with respect to each other - the race that matters under task
//! redelivery.

use crate::types::{DownloadTask, NoticeHandle, QueueStats, RequesterId, Status, TaskId, TaskSnapshot};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Live record of a queued or active task
#[derive(Clone, Debug)]
pub(crate) struct TaskRecord {
    /// Target filename
    pub(crate) filename: String,
    /// Destination path, unique among all records
    pub(crate) destination: PathBuf,
    /// Who asked for the download
    pub(crate) requester: RequesterId,
    /// Queued or Active - terminal tasks are evicted, never stored
    pub(crate) status: Status,
    /// When the task was created
    pub(crate) created_at: DateTime<Utc>,
    /// Handle to the "added to queue" notice, attached by the dispatcher
    /// once the notice is delivered and cleared with the record
    pub(crate) accepted_notice: Option<NoticeHandle>,
}

impl TaskRecord {
    /// Build a Queued record from a task
    pub(crate) fn queued(task: &DownloadTask) -> Self {
        Self {
            filename: task.filename.clone(),
            destination: task.destination.clone(),
            requester: task.requester,
            status: Status::Queued,
            created_at: task.created_at,
            accepted_notice: None,
        }
    }
}

/// Mapping of in-flight task identities to their records
#[derive(Clone)]
pub(crate) struct Registry {
    inner: Arc<Mutex<HashMap<TaskId, TaskRecord>>>,
}

impl Registry {
    /// Create an empty registry
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Admit a task as Queued unless its destination collides with an
    /// in-flight record
    ///
    /// The collision check and the insert happen under one lock acquisition,
    /// so two racing enqueues for the same destination cannot both succeed.
    /// Returns the colliding path on refusal.
    pub(crate) async fn try_admit(&self, id: TaskId, record: TaskRecord) -> Result<(), PathBuf> {
        let mut inner = self.inner.lock().await;

        if inner
            .values()
            .any(|existing| existing.destination == record.destination)
        {
            return Err(record.destination);
        }

        inner.insert(id, record);
        Ok(())
    }

    /// Claim a task for processing, flipping its record to Active
    ///
    /// Returns `false` if the identity is already Active - the caller must
    /// then drop the redelivered task without starting a second transfer.
    /// A missing record (task evicted between delivery attempts) is
    /// re-created from the task, so a lone redelivery still runs.
    pub(crate) async fn claim_active(&self, task: &DownloadTask) -> bool {
        let mut inner = self.inner.lock().await;

        match inner.get_mut(&task.id) {
            Some(record) if record.status == Status::Active => false,
            Some(record) => {
                record.status = Status::Active;
                true
            }
            None => {
                let mut record = TaskRecord::queued(task);
                record.status = Status::Active;
                inner.insert(task.id, record);
                true
            }
        }
    }

    /// Attach the accepted-notice handle to a live record
    ///
    /// Returns `false` when the task has already left the registry; the
    /// caller then owns the handle and must clean the notice up itself.
    pub(crate) async fn attach_notice(&self, id: TaskId, handle: NoticeHandle) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.get_mut(&id) {
            Some(record) => {
                record.accepted_notice = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Evict a task on reaching a terminal status
    pub(crate) async fn remove(&self, id: TaskId) -> Option<TaskRecord> {
        self.inner.lock().await.remove(&id)
    }

    /// Whether an identity is currently tracked
    pub(crate) async fn contains(&self, id: TaskId) -> bool {
        self.inner.lock().await.contains_key(&id)
    }

    /// Count records by status
    pub(crate) async fn stats(&self) -> QueueStats {
        let inner = self.inner.lock().await;
        let active = inner
            .values()
            .filter(|record| record.status == Status::Active)
            .count();

        QueueStats {
            queued: inner.len() - active,
            active,
        }
    }

    /// Point-in-time listing of all tracked tasks, ordered by identity
    pub(crate) async fn snapshot(&self) -> Vec<TaskSnapshot> {
        let inner = self.inner.lock().await;
        let mut tasks: Vec<TaskSnapshot> = inner
            .iter()
            .map(|(id, record)| TaskSnapshot {
                id: *id,
                filename: record.filename.clone(),
                destination: record.destination.clone(),
                requester: record.requester,
                status: record.status,
                created_at: record.created_at,
            })
            .collect();
        tasks.sort_by_key(|task| task.id);
        tasks
    }
}
