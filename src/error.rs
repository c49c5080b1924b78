//! Error types for chat-media-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Enqueue, Transfer, Notify)
//! - A strict containment policy: transfer and notification failures are
//!   scoped to a single task and never escalate to the pool or the process

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for chat-media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for chat-media-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "worker_count")
        key: Option<String>,
    },

    /// Task admission refused by the dispatcher
    #[error("enqueue rejected: {0}")]
    Enqueue(#[from] EnqueueError),

    /// Transfer-layer error from the media transfer port
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Notification delivery error
    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown in progress - not accepting new downloads
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Reasons a download request is refused at admission time
///
/// All admission checks run before a task is created; a rejected request
/// never enters the queue or the registry.
#[derive(Debug, Error)]
pub enum EnqueueError {
    /// Filename classified as Unrecognized
    #[error("unsupported file type: {filename}")]
    UnsupportedFileType {
        /// The filename that could not be classified
        filename: String,
    },

    /// A file already occupies the destination path on disk
    #[error("destination already exists: {path}")]
    DestinationExists {
        /// The colliding destination path
        path: PathBuf,
    },

    /// Another queued or active task already targets the destination path
    #[error("destination already queued or downloading: {path}")]
    DestinationInFlight {
        /// The colliding destination path
        path: PathBuf,
    },
}

/// Transfer-layer errors surfaced by a [`MediaTransfer`](crate::ports::MediaTransfer) port
///
/// A timeout is not represented here: the wall-clock ceiling is enforced by
/// the worker as a race against the transfer call, and produces the
/// `TimedOut` terminal status rather than an error value.
#[derive(Debug, Error)]
pub enum TransferError {
    /// I/O error while writing the destination file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by the remote transfer service
    #[error("remote error: {0}")]
    Remote(String),

    /// Transfer reported success but left no file at the destination
    #[error("transfer produced no file at {path}")]
    MissingOutput {
        /// The destination path that was expected to exist
        path: PathBuf,
    },
}

/// Errors surfaced by a [`Notifier`](crate::ports::Notifier) port
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Edit would not change the message content
    #[error("message not modified")]
    NotModified,

    /// Provider rate limit hit, retry later
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds the provider asked us to wait before retrying
        retry_after_secs: u64,
    },

    /// Any other delivery failure
    #[error("{0}")]
    Other(String),
}

impl NotifyError {
    /// Whether this failure is expected churn on progress edits
    ///
    /// Unchanged-content and rate-limit responses are swallowed by the
    /// progress reporter; everything else is logged.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            NotifyError::NotModified | NotifyError::RateLimited { .. }
        )
    }
}

/// Machine-readable error code for embedders that surface errors over a wire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Admission refused (unsupported type or destination collision)
    EnqueueRejected,
    /// Transfer exceeded the wall-clock ceiling
    TransferTimeout,
    /// Transfer failed for any non-timeout reason
    TransferFailed,
    /// Status notification could not be delivered
    NotificationFailed,
    /// Anything else
    Internal,
}

impl Error {
    /// Map this error to a machine-readable code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Enqueue(_) => ErrorCode::EnqueueRejected,
            Error::Transfer(_) => ErrorCode::TransferFailed,
            Error::Notify(_) => ErrorCode::NotificationFailed,
            _ => ErrorCode::Internal,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_error_messages_name_the_offending_path() {
        let err = EnqueueError::DestinationExists {
            path: PathBuf::from("/downloads/Video/movie.mkv"),
        };
        assert!(err.to_string().contains("movie.mkv"));

        let err = EnqueueError::DestinationInFlight {
            path: PathBuf::from("/downloads/Music/track.mp3"),
        };
        assert!(err.to_string().contains("track.mp3"));
    }

    #[test]
    fn benign_notify_errors_are_swallowable() {
        assert!(NotifyError::NotModified.is_benign());
        assert!(NotifyError::RateLimited { retry_after_secs: 5 }.is_benign());
        assert!(!NotifyError::Other("boom".to_string()).is_benign());
    }

    #[test]
    fn error_codes_map_by_domain() {
        let err: Error = EnqueueError::UnsupportedFileType {
            filename: "a.xyz".to_string(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::EnqueueRejected);

        let err: Error = TransferError::Remote("connection reset".to_string()).into();
        assert_eq!(err.code(), ErrorCode::TransferFailed);
    }
}
