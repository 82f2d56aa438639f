use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobError;
use crate::types::BlobRecord;

/// Storage backend for record attachments.
///
/// Stored blobs are immutable; a blob ID is never reused.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob owned by `owner_id` and return its metadata.
    ///
    /// The store assigns a unique ID and derives the file suffix from
    /// `content_type`.
    async fn save(
        &self,
        owner_id: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<BlobRecord, BlobError>;

    /// Retrieve only the metadata for a blob.
    async fn get_metadata(&self, id: &str) -> Result<Option<BlobRecord>, BlobError>;

    /// Retrieve a blob by ID, returning both metadata and content.
    async fn get(&self, id: &str) -> Result<Option<(BlobRecord, Bytes)>, BlobError>;

    /// List the blobs attached to `owner_id`, oldest first.
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<BlobRecord>, BlobError>;
}
