//! Port traits for the external collaborators the pipeline calls into
//!
//! The chat-protocol client and the media transfer machinery are deliberately
//! outside this crate. The pipeline reaches them through two narrow traits:
//! [`MediaTransfer`] fetches bytes of a remote object to a local path, and
//! [`Notifier`] sends, edits and deletes status messages visible to the
//! requester. Implementations can wrap any chat SDK or be stubbed for tests.

use crate::error::{NotifyError, TransferError};
use crate::types::{NoticeHandle, RequesterId, SourceRef};
use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

/// One progress observation during a transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes received so far (non-decreasing across observations)
    pub received_bytes: u64,
    /// Total bytes expected
    pub total_bytes: u64,
}

/// Trait for fetching a remote object to a local path
///
/// Implementations send [`TransferProgress`] observations on the provided
/// channel zero or more times while transferring. Observations must be
/// non-decreasing in `received_bytes`, and a successful fetch must emit a
/// final observation with `received_bytes == total_bytes` before returning.
///
/// The channel receiver may be dropped at any time (e.g., when the task's
/// timeout fires); implementations should ignore send failures and keep
/// going or abort on their own terms.
#[async_trait]
pub trait MediaTransfer: Send + Sync {
    /// Fetch the object behind `source` into `destination`
    ///
    /// # Errors
    ///
    /// Returns a [`TransferError`] on any failure. Timeouts are not the
    /// port's concern: the worker races this call against its own deadline.
    async fn fetch(
        &self,
        source: &SourceRef,
        destination: &Path,
        progress: mpsc::UnboundedSender<TransferProgress>,
    ) -> Result<(), TransferError>;
}

/// Trait for requester-visible status messages
///
/// Text is free-form; markdown-like emphasis is allowed but not required.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a new message to the requester
    ///
    /// # Errors
    ///
    /// Returns a [`NotifyError`] when the message cannot be delivered.
    async fn send(&self, requester: RequesterId, text: &str) -> Result<NoticeHandle, NotifyError>;

    /// Replace the text of a previously sent message
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotModified`] when the text is unchanged and
    /// [`NotifyError::RateLimited`] when the provider asks to retry later;
    /// callers treat both as benign for progress edits.
    async fn edit(&self, handle: &NoticeHandle, text: &str) -> Result<(), NotifyError>;

    /// Delete a previously sent message
    ///
    /// # Errors
    ///
    /// Returns a [`NotifyError`] when deletion fails. All pipeline deletes
    /// are best-effort; failures are logged and swallowed.
    async fn delete(&self, handle: &NoticeHandle) -> Result<(), NotifyError>;
}

/// Notifier that discards everything
///
/// Useful for headless embedding and tests, where download outcomes are
/// observed through the event stream instead of chat messages.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn send(&self, requester: RequesterId, _text: &str) -> Result<NoticeHandle, NotifyError> {
        Ok(NoticeHandle {
            requester,
            message_id: 0,
        })
    }

    async fn edit(&self, _handle: &NoticeHandle, _text: &str) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn delete(&self, _handle: &NoticeHandle) -> Result<(), NotifyError> {
        Ok(())
    }
}
