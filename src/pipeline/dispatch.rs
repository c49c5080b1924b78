//! Task admission and enqueueing
//!
//! The dispatcher is the only entry point for new work. It classifies the
//! filename, computes the destination, refuses collisions, creates the task
//! and reports the queue position back to the requester. Everything that can
//! be rejected is rejected here, synchronously - the queue itself never
//! pushes back.

use crate::error::{EnqueueError, Error, Result};
use crate::types::{DownloadTask, Event, FileCategory, RequesterId, SourceRef, TaskId};
use crate::utils::{format_size, sanitize_filename};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use super::MediaPipeline;
use super::registry::TaskRecord;

/// A request to download one file-bearing chat message
#[derive(Clone, Debug)]
pub struct DownloadRequest {
    /// Opaque handle to the remote object, resolved by the transfer port
    pub source: SourceRef,
    /// Raw filename as carried by the message (pre-sanitization)
    pub raw_filename: String,
    /// Who asked for the download (already allow-list checked by the caller)
    pub requester: RequesterId,
    /// Size reported by the message metadata
    pub size_bytes: u64,
}

/// Outcome of a successful enqueue
#[derive(Clone, Debug)]
pub struct Enqueued {
    /// Identity assigned to the new task
    pub id: TaskId,
    /// Position in the queue at enqueue time (1-based)
    pub position: usize,
    /// Destination path the file will land at
    pub destination: PathBuf,
    /// Category the filename classified as
    pub category: FileCategory,
}

impl MediaPipeline {
    /// Admit a download request and append it to the queue
    ///
    /// Admission checks, in order:
    /// 1. the pipeline is accepting new work (not shutting down),
    /// 2. the filename classifies as a recognized category,
    /// 3. no file already occupies the destination path,
    /// 4. no queued or active task targets the destination path.
    ///
    /// On success the requester receives a "added to queue" notice carrying
    /// the position the queue assigned; its handle is stored on the task's
    /// registry record so the worker can delete it after completion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] during shutdown and
    /// [`Error::Enqueue`] for any admission refusal. A refused request never
    /// creates a task.
    pub async fn enqueue(&self, request: DownloadRequest) -> Result<Enqueued> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let category = self.classifier.classify(&request.raw_filename);
        let Some(folder) = category.folder() else {
            tracing::info!(
                filename = %request.raw_filename,
                requester = %request.requester,
                "Rejected unsupported file type"
            );
            return Err(EnqueueError::UnsupportedFileType {
                filename: request.raw_filename,
            }
            .into());
        };

        let filename = sanitize_filename(&request.raw_filename);
        let category_dir = self.config.download_dir.join(folder);
        tokio::fs::create_dir_all(&category_dir).await?;
        let destination = category_dir.join(&filename);

        if tokio::fs::try_exists(&destination).await? {
            tracing::info!(
                destination = %destination.display(),
                "Rejected download, destination already exists on disk"
            );
            return Err(EnqueueError::DestinationExists { path: destination }.into());
        }

        let id = TaskId(self.next_task_id.fetch_add(1, Ordering::SeqCst));
        let task = DownloadTask {
            id,
            source: request.source,
            filename: filename.clone(),
            destination: destination.clone(),
            requester: request.requester,
            size_bytes: request.size_bytes,
            created_at: chrono::Utc::now(),
            retry_count: 0,
        };

        // Collision check against in-flight tasks and the insert are one
        // critical section; two racing enqueues cannot both win.
        if let Err(path) = self.registry.try_admit(id, TaskRecord::queued(&task)).await {
            tracing::info!(
                destination = %path.display(),
                "Rejected download, destination already queued or downloading"
            );
            return Err(EnqueueError::DestinationInFlight { path }.into());
        }

        let position = match self.queue.enqueue(task) {
            Ok(position) => position,
            Err(e) => {
                // Queue closed under us; roll the admission back.
                self.registry.remove(id).await;
                return Err(e);
            }
        };

        // Best-effort "accepted" notice carrying the position the queue
        // actually assigned. The handle lives in the registry record so the
        // worker can clear the notice on completion; if the task already
        // finished, clearing it falls to us.
        match self
            .notifier
            .send(
                request.requester,
                &queued_text(&filename, position, request.size_bytes),
            )
            .await
        {
            Ok(handle) => {
                if !self.registry.attach_notice(id, handle.clone()).await
                    && let Err(e) = self.notifier.delete(&handle).await
                {
                    tracing::warn!(task_id = id.0, error = %e, "Could not delete queue notice");
                }
            }
            Err(e) => {
                tracing::warn!(task_id = id.0, error = %e, "Could not send queue notice");
            }
        }

        tracing::info!(
            task_id = id.0,
            filename = %filename,
            position,
            category = ?category,
            "Download queued"
        );

        self.emit_event(Event::Queued {
            id,
            filename: filename.clone(),
            position,
        });

        Ok(Enqueued {
            id,
            position,
            destination,
            category,
        })
    }
}

/// Body of the "added to queue" notice
fn queued_text(filename: &str, position: usize, size_bytes: u64) -> String {
    format!(
        "📥 **Added to queue**\n📄 `{}`\n💾 Size: {}\n🔄 Queue position: {}",
        filename,
        format_size(size_bytes),
        position
    )
}
