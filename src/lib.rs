//! # chat-media-dl
//!
//! Embeddable media download pipeline for chat-driven download bots.
//!
//! ## Design Philosophy
//!
//! chat-media-dl is designed to be:
//! - **Protocol-agnostic** - the chat client and transfer machinery are
//!   plugged in through two narrow port traits
//! - **Sensible defaults** - two workers, a 6 hour transfer ceiling, and
//!   throttled progress edits out of the box
//! - **Library-first** - no CLI or UI, purely a Rust crate for embedding
//! - **Failure-isolated** - one task's failure never stalls the pool or a
//!   sibling task
//!
//! ## Quick Start
//!
//! ```no_run
//! use chat_media_dl::{
//!     Config, DownloadRequest, MediaPipeline, MediaTransfer, NoOpNotifier, RequesterId,
//!     SourceRef, TransferError, TransferProgress,
//! };
//! use async_trait::async_trait;
//! use std::path::Path;
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! struct MyTransfer;
//!
//! #[async_trait]
//! impl MediaTransfer for MyTransfer {
//!     async fn fetch(
//!         &self,
//!         source: &SourceRef,
//!         destination: &Path,
//!         progress: mpsc::UnboundedSender<TransferProgress>,
//!     ) -> Result<(), TransferError> {
//!         // Resolve `source` with your chat SDK and stream it to `destination`,
//!         // sending TransferProgress observations along the way.
//!         let _ = (source, destination, progress);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = MediaPipeline::new(
//!         Config::default(),
//!         Arc::new(MyTransfer),
//!         Arc::new(NoOpNotifier),
//!     )
//!     .await?;
//!     pipeline.start().await?;
//!
//!     let enqueued = pipeline
//!         .enqueue(DownloadRequest {
//!             source: SourceRef::new("chat-message-1234"),
//!             raw_filename: "Show.S01E02.mkv".to_string(),
//!             requester: RequesterId(42),
//!             size_bytes: 700 * 1024 * 1024,
//!         })
//!         .await?;
//!     println!("queued at position {}", enqueued.position);
//!
//!     pipeline.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Filename classification
pub mod classify;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Core pipeline implementation (decomposed into focused submodules)
pub mod pipeline;
/// Port traits for external collaborators
pub mod ports;
/// Progress throttling and rendering
pub mod progress;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use classify::{ExtensionClassifier, FileClassifier};
pub use config::{Config, ProgressConfig};
pub use error::{EnqueueError, Error, ErrorCode, NotifyError, Result, TransferError};
pub use pipeline::{DownloadRequest, Enqueued, MediaPipeline};
pub use ports::{MediaTransfer, NoOpNotifier, Notifier, TransferProgress};
pub use progress::{ProgressFrame, ProgressThrottle};
pub use types::{
    DownloadTask, Event, FileCategory, NoticeHandle, QueueStats, RequesterId, SourceRef, Status,
    TaskId, TaskSnapshot,
};

/// Run the pipeline until a termination signal arrives, then shut it down.
///
/// On Unix this waits for SIGTERM or SIGINT, falling back to the portable
/// Ctrl+C listener when signal registration is unavailable (some container
/// and test environments); elsewhere it waits for Ctrl+C directly.
///
/// # Errors
///
/// Propagates any error from [`MediaPipeline::shutdown`].
pub async fn run_with_shutdown(pipeline: MediaPipeline) -> Result<()> {
    wait_for_signal().await;
    pipeline.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut term), Ok(mut int)) => {
            tokio::select! {
                _ = term.recv() => tracing::info!("SIGTERM received, shutting down"),
                _ = int.recv() => tracing::info!("SIGINT received, shutting down"),
            }
        }
        _ => {
            tracing::warn!("Unix signal registration unavailable, waiting for Ctrl+C instead");
            wait_for_ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Ctrl+C listener failed");
    } else {
        tracing::info!("Ctrl+C received, shutting down");
    }
}
