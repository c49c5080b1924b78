//! Worker pool and the per-task download state machine
//!
//! Each worker is an unbounded loop: wait on the queue, drive one task from
//! Active to a terminal status, pause briefly, repeat. All failure handling
//! happens at task granularity - nothing a task does can exit the loop or
//! disturb a sibling worker.

use crate::error::TransferError;
use crate::progress::{ProgressThrottle, render_update};
use crate::types::{DownloadTask, Event, NoticeHandle, TaskId};
use crate::utils::format_size;
use std::time::Instant;
use tokio::sync::mpsc;

use super::MediaPipeline;

/// Terminal outcome of one task's transfer phase
enum TaskOutcome {
    /// Transfer returned cleanly and the file is on disk
    Completed {
        /// Size of the verified output file
        size_bytes: u64,
    },
    /// The wall-clock ceiling elapsed before the transfer finished
    TimedOut,
    /// The transfer failed for any other reason
    Failed(String),
}

impl MediaPipeline {
    /// Spawn one worker task
    pub(crate) fn spawn_worker(&self, worker_id: usize) -> tokio::task::JoinHandle<()> {
        let pipeline = self.clone();

        tokio::spawn(async move {
            tracing::debug!(worker_id, "Worker started");

            loop {
                let task = tokio::select! {
                    _ = pipeline.shutdown_token.cancelled() => break,
                    task = pipeline.queue.dequeue() => match task {
                        Some(task) => task,
                        None => break,
                    },
                };

                pipeline.run_task(task).await;

                // Deliberate pacing toward the transfer service between
                // tasks, not an incidental delay.
                tokio::select! {
                    _ = pipeline.shutdown_token.cancelled() => break,
                    _ = tokio::time::sleep(pipeline.config.inter_task_pause) => {}
                }
            }

            tracing::debug!(worker_id, "Worker stopped");
        })
    }

    /// Drive one task from claim to terminal status
    ///
    /// Every error is absorbed here; the caller's loop continues regardless
    /// of the outcome.
    async fn run_task(&self, task: DownloadTask) {
        // Re-delivery guard and Active transition in one critical section.
        // The queue delivers each task once, so this is a safety net.
        if !self.registry.claim_active(&task).await {
            tracing::warn!(
                task_id = task.id.0,
                "Task already active, dropping redelivered copy"
            );
            return;
        }

        tracing::info!(
            task_id = task.id.0,
            filename = %task.filename,
            "Starting download"
        );
        self.emit_event(Event::Started {
            id: task.id,
            filename: task.filename.clone(),
        });

        let header = downloading_text(self.queue.len(), &task.filename, task.size_bytes);
        let status_notice = match self.notifier.send(task.requester, &header).await {
            Ok(handle) => handle,
            Err(e) => {
                // Without a status message the requester would get no
                // feedback at all; give the task up rather than download
                // silently.
                tracing::error!(
                    task_id = task.id.0,
                    error = %e,
                    "Could not post status notification, abandoning task"
                );
                self.emit_event(Event::Failed {
                    id: task.id,
                    error: format!("could not post status notification: {e}"),
                });
                self.registry.remove(task.id).await;
                return;
            }
        };

        let outcome = self.execute_transfer(&task, &status_notice, &header).await;

        match outcome {
            TaskOutcome::Completed { size_bytes } => {
                tracing::info!(
                    task_id = task.id.0,
                    path = %task.destination.display(),
                    size_bytes,
                    "Download complete"
                );
                self.edit_best_effort(
                    task.id,
                    &status_notice,
                    &completed_text(&task.filename, size_bytes, &task.destination),
                )
                .await;
                self.emit_event(Event::Completed {
                    id: task.id,
                    path: task.destination.clone(),
                    size_bytes,
                });

                // Give the requester time to read the completion notice,
                // then clear both status messages out of the chat. The
                // accepted notice rides on the registry record.
                tokio::time::sleep(self.config.completion_notice_delay).await;
                self.delete_best_effort(task.id, &status_notice).await;
                if let Some(record) = self.registry.remove(task.id).await
                    && let Some(accepted) = record.accepted_notice
                {
                    self.delete_best_effort(task.id, &accepted).await;
                }
            }
            TaskOutcome::TimedOut => {
                // The partial file stays on disk; cleanup is not this
                // pipeline's job.
                tracing::warn!(
                    task_id = task.id.0,
                    filename = %task.filename,
                    "Download timed out"
                );
                self.edit_best_effort(task.id, &status_notice, &timed_out_text(&task.filename))
                    .await;
                self.emit_event(Event::TimedOut { id: task.id });
                self.registry.remove(task.id).await;
            }
            TaskOutcome::Failed(error) => {
                tracing::error!(
                    task_id = task.id.0,
                    filename = %task.filename,
                    error = %error,
                    "Download failed"
                );
                self.edit_best_effort(
                    task.id,
                    &status_notice,
                    &failed_text(&task.filename, &error),
                )
                .await;
                self.emit_event(Event::Failed { id: task.id, error });
                self.registry.remove(task.id).await;
            }
        }
    }

    /// Race the transfer against the timeout ceiling, reporting progress
    ///
    /// Returning drops the transfer future, which cancels the in-flight
    /// fetch on timeout without touching sibling tasks.
    async fn execute_transfer(
        &self,
        task: &DownloadTask,
        status_notice: &NoticeHandle,
        header: &str,
    ) -> TaskOutcome {
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let mut throttle = ProgressThrottle::new(&self.config.progress);

        let fetch = self
            .transfer
            .fetch(&task.source, &task.destination, progress_tx);
        tokio::pin!(fetch);

        let deadline = tokio::time::sleep(self.config.transfer_timeout);
        tokio::pin!(deadline);

        let result = loop {
            tokio::select! {
                result = &mut fetch => break result,
                _ = &mut deadline => return TaskOutcome::TimedOut,
                Some(update) = progress_rx.recv() => {
                    self.report_progress(
                        task,
                        status_notice,
                        header,
                        &mut throttle,
                        update.received_bytes,
                        update.total_bytes,
                    )
                    .await;
                }
            }
        };

        // The select races the final progress observations against fetch
        // completion; drain what is left so the 100% update is delivered.
        while let Ok(update) = progress_rx.try_recv() {
            self.report_progress(
                task,
                status_notice,
                header,
                &mut throttle,
                update.received_bytes,
                update.total_bytes,
            )
            .await;
        }

        match result {
            Ok(()) => match tokio::fs::metadata(&task.destination).await {
                Ok(metadata) => TaskOutcome::Completed {
                    size_bytes: metadata.len(),
                },
                Err(_) => TaskOutcome::Failed(
                    TransferError::MissingOutput {
                        path: task.destination.clone(),
                    }
                    .to_string(),
                ),
            },
            Err(e) => TaskOutcome::Failed(e.to_string()),
        }
    }

    /// Feed one progress observation through the throttle and, when it
    /// emits, edit the status message and broadcast an event
    async fn report_progress(
        &self,
        task: &DownloadTask,
        status_notice: &NoticeHandle,
        header: &str,
        throttle: &mut ProgressThrottle,
        received_bytes: u64,
        total_bytes: u64,
    ) {
        let Some(frame) = throttle.observe(received_bytes, total_bytes, Instant::now()) else {
            return;
        };

        self.emit_event(Event::Progress {
            id: task.id,
            percent: frame.percent,
            received_bytes: frame.received_bytes,
            total_bytes: frame.total_bytes,
            speed_bps: frame.speed_bps,
        });

        let text = format!("{header}\n\n{}", render_update(&frame));
        if let Err(e) = self.notifier.edit(status_notice, &text).await {
            // Unchanged-content and rate-limit responses are routine here.
            if !e.is_benign() {
                tracing::warn!(
                    task_id = task.id.0,
                    error = %e,
                    "Could not edit progress notification"
                );
            }
        }
    }

    /// Edit a status message, logging instead of propagating failure
    async fn edit_best_effort(&self, task_id: TaskId, handle: &NoticeHandle, text: &str) {
        if let Err(e) = self.notifier.edit(handle, text).await
            && !e.is_benign()
        {
            tracing::warn!(task_id = task_id.0, error = %e, "Could not edit status notification");
        }
    }

    /// Delete a status message, logging instead of propagating failure
    async fn delete_best_effort(&self, task_id: TaskId, handle: &NoticeHandle) {
        if let Err(e) = self.notifier.delete(handle).await {
            tracing::warn!(task_id = task_id.0, error = %e, "Could not delete status notification");
        }
    }
}

/// Header of the status message posted when a task becomes Active
fn downloading_text(queue_depth: usize, filename: &str, size_bytes: u64) -> String {
    format!(
        "⬇️ **In queue: {}**\n**Downloading:** `{}`\n💾 Size: {}",
        queue_depth,
        filename,
        format_size(size_bytes)
    )
}

/// Body of the completion message
fn completed_text(filename: &str, size_bytes: u64, path: &std::path::Path) -> String {
    format!(
        "✅ **Download complete**\n📁 `{}`\n💾 Size: {}\n📂 Saved to: `{}`",
        filename,
        format_size(size_bytes),
        path.display()
    )
}

/// Body of the timeout message; wording is distinct from the failure text
fn timed_out_text(filename: &str) -> String {
    format!(
        "⏱️ **Download timed out**\n`{}`\nThe download took too long. Try again later.",
        filename
    )
}

/// Body of the failure message
fn failed_text(filename: &str, error: &str) -> String {
    format!("❌ **Download failed**\n`{}`\nError: {}", filename, error)
}
