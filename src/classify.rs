//! Filename classification
//!
//! Classification decides routing: every admitted task lands in the folder of
//! its category, and Unrecognized filenames are refused at enqueue time.
//! The trait allows embedders to plug in smarter heuristics; the shipped
//! [`ExtensionClassifier`] matches on the file extension alone.

use crate::types::FileCategory;
use std::path::Path;

/// Trait for filename classification
///
/// Implementations must be cheap and infallible: classification runs
/// synchronously inside the dispatcher's admission path.
pub trait FileClassifier: Send + Sync {
    /// Classify a raw (pre-sanitization) filename
    fn classify(&self, filename: &str) -> FileCategory;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Video file extensions recognized by [`ExtensionClassifier`]
const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mkv", "avi", "mov", "wmv", "flv"];

/// Music file extensions recognized by [`ExtensionClassifier`]
const MUSIC_EXTENSIONS: [&str; 5] = ["mp3", "wav", "aac", "flac", "ogg"];

/// Document file extensions recognized by [`ExtensionClassifier`]
const DOCUMENT_EXTENSIONS: [&str; 8] = ["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt"];

/// Extension-based classifier
///
/// Matches the lowercased file extension against fixed lists. Anything
/// without an extension, or with an unknown one, is
/// [`FileCategory::Unrecognized`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtensionClassifier;

impl FileClassifier for ExtensionClassifier {
    fn classify(&self, filename: &str) -> FileCategory {
        let Some(extension) = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
        else {
            return FileCategory::Unrecognized;
        };

        if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            FileCategory::Video
        } else if MUSIC_EXTENSIONS.contains(&extension.as_str()) {
            FileCategory::Music
        } else if DOCUMENT_EXTENSIONS.contains(&extension.as_str()) {
            FileCategory::Document
        } else {
            FileCategory::Unrecognized
        }
    }

    fn name(&self) -> &'static str {
        "extension"
    }
}
