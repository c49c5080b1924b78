//! Utility functions for filename sanitization and size formatting

/// Bytes per megabyte, used by progress and notification rendering
pub(crate) const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Sanitize a raw filename for filesystem use
///
/// Trims surrounding whitespace and replaces path separators, newlines,
/// carriage returns and colons with underscores. The result is a plain file
/// name, never a path.
///
/// # Examples
///
/// ```
/// use chat_media_dl::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename(" a/b:c.mkv "), "a_b_c.mkv");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.trim().replace(['/', '\\', '\n', '\r', ':'], "_")
}

/// Convert a byte count to megabytes
pub fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Format a byte count as a human-readable size with one decimal
///
/// # Examples
///
/// ```
/// use chat_media_dl::utils::format_size;
///
/// assert_eq!(format_size(0), "0B");
/// assert_eq!(format_size(1536), "1.5KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{}B", bytes)
    } else {
        format!("{:.1}{}", size, UNITS[unit])
    }
}
