//! Core types for chat-media-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a download task
///
/// Generated from a process-wide counter at enqueue time and never reused
/// within the lifetime of a pipeline instance.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Create a new TaskId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the user who requested a download
///
/// Opaque to the core; the notification port interprets it when addressing
/// status messages. Allow-list checks happen in the caller, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(pub i64);

impl std::fmt::Display for RequesterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a remote object
///
/// Meaningful only to the [`MediaTransfer`](crate::ports::MediaTransfer) port
/// that resolves it (e.g., a chat message reference). The core never inspects
/// the contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(pub String);

impl SourceRef {
    /// Create a new source reference from any string-like token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

/// Handle to a status message previously sent through a notification port
///
/// Returned by [`Notifier::send`](crate::ports::Notifier::send) and passed
/// back for edits and deletes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeHandle {
    /// The requester the message was addressed to
    pub requester: RequesterId,
    /// Provider-assigned message identifier
    pub message_id: i64,
}

/// Download task status
///
/// Transitions are `Queued → Active → {Completed, Failed, TimedOut}`.
/// Terminal states never transition further, and terminal tasks are evicted
/// from the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Waiting in the queue
    Queued,
    /// Owned by a worker and transferring
    Active,
    /// Transfer finished and the output file verified on disk
    Completed,
    /// Transfer failed for any non-timeout reason
    Failed,
    /// Transfer exceeded the wall-clock ceiling
    TimedOut,
}

impl Status {
    /// Whether this status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed | Status::TimedOut)
    }
}

/// Category assigned to a filename by the classification port
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// Video file
    Video,
    /// Music file
    Music,
    /// Document file
    Document,
    /// Anything else - rejected at enqueue time
    Unrecognized,
}

impl FileCategory {
    /// Folder name under the download directory for this category
    ///
    /// Returns `None` for [`FileCategory::Unrecognized`], which is never
    /// admitted and therefore has no folder.
    pub fn folder(&self) -> Option<&'static str> {
        match self {
            FileCategory::Video => Some("Video"),
            FileCategory::Music => Some("Music"),
            FileCategory::Document => Some("Documents"),
            FileCategory::Unrecognized => None,
        }
    }
}

/// Unit of work tracked from enqueue to terminal outcome
///
/// Created by the dispatcher; ownership moves through the queue to the worker
/// that processes it. State transitions are owned exclusively by that worker.
#[derive(Clone, Debug)]
pub struct DownloadTask {
    /// Unique task identity
    pub id: TaskId,
    /// Opaque handle to the remote object
    pub source: SourceRef,
    /// Target filename, post-sanitization
    pub filename: String,
    /// Absolute destination path
    pub destination: PathBuf,
    /// Who asked for the download
    pub requester: RequesterId,
    /// Size reported by the caller, used for the initial status message
    pub size_bytes: u64,
    /// When the task was created
    pub created_at: DateTime<Utc>,
    /// Reserved for an external retry policy; never incremented by the pool
    pub retry_count: u32,
}

/// Point-in-time view of one queued or active task
///
/// Returned by [`MediaPipeline::tasks`](crate::MediaPipeline::tasks) for
/// embedders that surface a queue listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Task identity
    pub id: TaskId,
    /// Target filename
    pub filename: String,
    /// Destination path
    pub destination: PathBuf,
    /// Who asked for the download
    pub requester: RequesterId,
    /// Queued or Active
    pub status: Status,
    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Snapshot of queue and registry occupancy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Tasks waiting in the queue
    pub queued: usize,
    /// Tasks currently owned by a worker
    pub active: usize,
}

/// Event emitted during the download lifecycle
///
/// Events are broadcast to all subscribers alongside the requester-facing
/// notifications, so embedders can drive UIs or logs without polling.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task admitted and added to the queue
    Queued {
        /// Task ID
        id: TaskId,
        /// Target filename
        filename: String,
        /// Position in the queue at enqueue time
        position: usize,
    },

    /// Worker claimed the task and posted the initial status notice
    Started {
        /// Task ID
        id: TaskId,
        /// Target filename
        filename: String,
    },

    /// Throttled progress update
    Progress {
        /// Task ID
        id: TaskId,
        /// Progress percentage (0 to 100)
        percent: u8,
        /// Bytes received so far
        received_bytes: u64,
        /// Total bytes expected
        total_bytes: u64,
        /// Instantaneous speed in bytes per second, when computable
        #[serde(skip_serializing_if = "Option::is_none")]
        speed_bps: Option<u64>,
    },

    /// Transfer finished and the output file verified on disk
    Completed {
        /// Task ID
        id: TaskId,
        /// Final destination path
        path: PathBuf,
        /// Size of the file on disk
        size_bytes: u64,
    },

    /// Transfer failed for a non-timeout reason
    Failed {
        /// Task ID
        id: TaskId,
        /// Description of the underlying error
        error: String,
    },

    /// Transfer exceeded the wall-clock ceiling
    TimedOut {
        /// Task ID
        id: TaskId,
    },

    /// Pipeline is shutting down
    Shutdown,
}
