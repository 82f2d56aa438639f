use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;
use vitrine_core::{CallContext, Filter, Record};

use crate::error::StoreError;

/// Check a caller-supplied record ID. An empty ID is valid: the store
/// assigns one on save.
pub fn validate_record_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() {
        return Ok(());
    }
    Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_owned()))?;
    Ok(())
}

/// Outcome of a search that ran to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchSummary {
    /// Records present in the store when the search started.
    pub scanned: usize,
    /// Matching records handed to the sink.
    pub emitted: usize,
}

/// Receiver of records produced by [`RecordStore::search`].
///
/// An error returned from [`emit`](Self::emit) aborts the search and is
/// surfaced to the caller unchanged.
#[async_trait]
pub trait RecordSink: Send {
    async fn emit(&mut self, record: Record) -> Result<(), StoreError>;
}

#[async_trait]
impl RecordSink for Vec<Record> {
    async fn emit(&mut self, record: Record) -> Result<(), StoreError> {
        self.push(record);
        Ok(())
    }
}

#[async_trait]
impl RecordSink for mpsc::Sender<Record> {
    async fn emit(&mut self, record: Record) -> Result<(), StoreError> {
        self.send(record)
            .await
            .map_err(|_| StoreError::SinkClosed("receiver dropped".into()))
    }
}

/// Trait for storing catalog records.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Records are cloned on the way in and on the way out.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Store a record and return its ID.
    ///
    /// An empty ID is replaced by a freshly generated UUID. A non-empty ID
    /// must parse as a UUID, and must not already be present; the first
    /// writer wins and the stored record is never overwritten.
    async fn save(&self, record: Record) -> Result<String, StoreError>;

    /// Get a copy of the record with the given ID.
    async fn find(&self, id: &str) -> Result<Option<Record>, StoreError>;

    /// Check whether a record exists without copying it.
    async fn contains(&self, id: &str) -> Result<bool, StoreError>;

    /// Hand every record matching `filter` to `sink`.
    ///
    /// The call context is checked before each emission; an interrupted
    /// search returns [`StoreError::Interrupted`].
    async fn search(
        &self,
        filter: &Filter,
        ctx: &CallContext,
        sink: &mut dyn RecordSink,
    ) -> Result<SearchSummary, StoreError>;

    /// Number of stored records.
    async fn len(&self) -> Result<usize, StoreError>;

    async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }
}
