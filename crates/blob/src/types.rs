use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a stored attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    /// Unique blob identifier (a UUID).
    pub id: String,
    /// ID of the record the blob is attached to.
    pub owner_id: String,
    /// Content type as supplied by the uploader.
    pub content_type: String,
    /// Where the content lives on disk.
    pub path: PathBuf,
    /// Size in bytes.
    pub size_bytes: u64,
    /// When the blob was stored.
    pub created_at: DateTime<Utc>,
}

/// File suffix for a content type.
///
/// A content type that is already a plain suffix (`.jpg`: a dot followed by
/// at most [`MAX_SUFFIX_LEN`] ASCII letters or digits) is used as-is; known
/// image MIME types map to their usual extension; anything else is stored
/// as `.bin`. The result never contains a path separator.
pub fn file_suffix(content_type: &str) -> String {
    let content_type = content_type.trim();
    if is_plain_suffix(content_type) {
        return content_type.to_owned();
    }
    let suffix = match content_type.to_ascii_lowercase().as_str() {
        "image/png" => ".png",
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        _ => ".bin",
    };
    suffix.to_owned()
}

/// Longest extension accepted verbatim, not counting the dot.
pub const MAX_SUFFIX_LEN: usize = 10;

fn is_plain_suffix(candidate: &str) -> bool {
    candidate.strip_prefix('.').is_some_and(|ext| {
        (1..=MAX_SUFFIX_LEN).contains(&ext.len()) && ext.bytes().all(|b| b.is_ascii_alphanumeric())
    })
}
