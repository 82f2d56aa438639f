use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::BlobError;
use crate::store::BlobStore;
use crate::types::{BlobRecord, file_suffix};

/// [`BlobStore`] writing each blob to its own file under one directory.
///
/// Metadata is indexed in memory; the files outlive the process but the
/// index does not.
#[derive(Debug)]
pub struct DiskBlobStore {
    dir: PathBuf,
    max_size: Option<u64>,
    index: RwLock<HashMap<String, BlobRecord>>,
}

impl DiskBlobStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            BlobError::Storage(format!("cannot create {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir,
            max_size: None,
            index: RwLock::new(HashMap::new()),
        })
    }

    /// Reject blobs larger than `limit` bytes.
    #[must_use]
    pub fn with_max_size(mut self, limit: u64) -> Self {
        self.max_size = Some(limit);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn save(
        &self,
        owner_id: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<BlobRecord, BlobError> {
        let size = data.len() as u64;
        if let Some(limit) = self.max_size
            && size > limit
        {
            return Err(BlobError::TooLarge { size, limit });
        }

        let id = Uuid::new_v4().to_string();
        let path = self.dir.join(format!("{id}{}", file_suffix(content_type)));

        tokio::fs::write(&path, &data).await.map_err(|e| {
            BlobError::Storage(format!("cannot write {}: {e}", path.display()))
        })?;

        let record = BlobRecord {
            id: id.clone(),
            owner_id: owner_id.to_owned(),
            content_type: content_type.to_owned(),
            path,
            size_bytes: size,
            created_at: Utc::now(),
        };
        self.index.write().await.insert(id, record.clone());

        debug!(blob_id = %record.id, owner_id, size = record.size_bytes, "blob stored");
        Ok(record)
    }

    async fn get_metadata(&self, id: &str) -> Result<Option<BlobRecord>, BlobError> {
        Ok(self.index.read().await.get(id).cloned())
    }

    async fn get(&self, id: &str) -> Result<Option<(BlobRecord, Bytes)>, BlobError> {
        let Some(record) = self.get_metadata(id).await? else {
            return Ok(None);
        };
        let data = tokio::fs::read(&record.path).await?;
        Ok(Some((record, Bytes::from(data))))
    }

    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<BlobRecord>, BlobError> {
        let mut blobs: Vec<BlobRecord> = self
            .index
            .read()
            .await
            .values()
            .filter(|blob| blob.owner_id == owner_id)
            .cloned()
            .collect();
        blobs.sort_by_key(|blob| blob.created_at);
        Ok(blobs)
    }
}
