use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use futures::Stream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use vitrine_blob::{BlobError, BlobStore};
use vitrine_core::{
    CallContext, CreateRecordRequest, CreateRecordResponse, MAX_ATTACHMENT_BYTES,
    RateRecordRequest, RateRecordResponse, Record, SearchRecordsRequest, SearchRecordsResponse,
    Status, UploadAttachmentResponse, UploadMessage,
};
use vitrine_store::{RatingStore, RecordSink, RecordStore, StoreError, validate_record_id};

use super::receive;

/// Handlers for the catalog methods.
#[derive(Clone)]
pub struct CatalogService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    ratings: Arc<RatingStore>,
}

/// Forwards search results into a response channel.
struct ResponseSink {
    out: mpsc::Sender<Result<SearchRecordsResponse, Status>>,
}

#[async_trait]
impl RecordSink for ResponseSink {
    async fn emit(&mut self, record: Record) -> Result<(), StoreError> {
        self.out
            .send(Ok(SearchRecordsResponse { record }))
            .await
            .map_err(|_| StoreError::SinkClosed("search response stream closed".into()))
    }
}

/// Log a terminal error once, where it is translated.
fn log_status(method: &'static str, status: Status) -> Status {
    match status.code {
        vitrine_core::Code::Internal => error!(method, error = %status, "call failed"),
        _ => warn!(method, error = %status, "call failed"),
    }
    status
}

impl CatalogService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        ratings: Arc<RatingStore>,
    ) -> Self {
        Self {
            records,
            blobs,
            ratings,
        }
    }

    /// Unary: store a new record, assigning an ID when none is given.
    pub async fn create_record(
        &self,
        ctx: &CallContext,
        req: CreateRecordRequest,
    ) -> Result<CreateRecordResponse, Status> {
        const METHOD: &str = "CreateRecord";

        validate_record_id(&req.record.id).map_err(|e| log_status(METHOD, e.into()))?;
        ctx.check().map_err(|i| log_status(METHOD, i.into()))?;

        let id = self.records.save(req.record).await.map_err(|e| {
            let status = match e {
                StoreError::InvalidId(_) | StoreError::AlreadyExists { .. } => Status::from(e),
                other => Status::internal(format!("cannot save record to the store: {other}")),
            };
            log_status(METHOD, status)
        })?;

        info!(record_id = %id, "record created");
        Ok(CreateRecordResponse { id })
    }

    /// Server streaming: send every record matching the filter.
    ///
    /// An interrupted search ends the stream early without an error, and a
    /// closed outbound channel counts as cancellation.
    pub async fn search_records(
        &self,
        ctx: &CallContext,
        req: SearchRecordsRequest,
        out: mpsc::Sender<Result<SearchRecordsResponse, Status>>,
    ) -> Result<(), Status> {
        const METHOD: &str = "SearchRecords";

        req.filter
            .validate()
            .map_err(|msg| log_status(METHOD, Status::invalid_argument(msg)))?;

        let mut sink = ResponseSink { out };
        match self.records.search(&req.filter, ctx, &mut sink).await {
            Ok(summary) => {
                debug!(
                    scanned = summary.scanned,
                    emitted = summary.emitted,
                    "search finished"
                );
                Ok(())
            }
            Err(StoreError::Interrupted(interrupt)) => {
                info!(reason = ?interrupt, "search interrupted");
                Ok(())
            }
            Err(StoreError::SinkClosed(_)) => {
                info!("search client went away");
                Ok(())
            }
            Err(e) => Err(log_status(
                METHOD,
                Status::internal(format!("unexpected error: {e}")),
            )),
        }
    }

    /// Client streaming: one info header, then chunks of attachment data.
    ///
    /// Nothing is stored unless the client closes its stream cleanly.
    pub async fn upload_attachment<S>(
        &self,
        ctx: &CallContext,
        mut inbound: S,
    ) -> Result<UploadAttachmentResponse, Status>
    where
        S: Stream<Item = Result<UploadMessage, Status>> + Send + Unpin,
    {
        const METHOD: &str = "UploadAttachment";
        let fail = |status: Status| log_status(METHOD, status);

        let info = match receive(ctx, &mut inbound).await.map_err(fail)? {
            Some(UploadMessage::Info(info)) => info,
            Some(UploadMessage::Chunk(_)) => {
                return Err(fail(Status::invalid_argument(
                    "first message must carry attachment info",
                )));
            }
            None => return Err(fail(Status::invalid_argument("missing attachment info"))),
        };
        self.require_record(&info.record_id).await.map_err(fail)?;
        debug!(record_id = %info.record_id, content_type = %info.content_type, "receiving attachment");

        let mut data = BytesMut::new();
        while let Some(message) = receive(ctx, &mut inbound).await.map_err(fail)? {
            let UploadMessage::Chunk(chunk) = message else {
                return Err(fail(Status::invalid_argument(
                    "attachment info may only be sent once",
                )));
            };
            self.require_record(&info.record_id).await.map_err(fail)?;

            let size = data.len() + chunk.len();
            if size > MAX_ATTACHMENT_BYTES {
                return Err(fail(Status::invalid_argument(format!(
                    "attachment is too large: {size} > {MAX_ATTACHMENT_BYTES}"
                ))));
            }
            data.extend_from_slice(&chunk);
        }

        let blob = self
            .blobs
            .save(&info.record_id, &info.content_type, data.freeze())
            .await
            .map_err(|e| match e {
                BlobError::TooLarge { .. } => fail(Status::invalid_argument(e.to_string())),
                BlobError::Storage(detail) => {
                    error!(method = METHOD, error = %detail, "attachment write failed");
                    Status::internal("cannot save attachment to the store")
                }
            })?;

        info!(blob_id = %blob.id, record_id = %info.record_id, size = blob.size_bytes, "attachment saved");
        Ok(UploadAttachmentResponse {
            id: blob.id,
            size: u32::try_from(blob.size_bytes).unwrap_or(u32::MAX),
        })
    }

    /// Bidirectional streaming: fold each score into its record's rating
    /// and reply with the updated aggregate straight away.
    pub async fn rate_record<S>(
        &self,
        ctx: &CallContext,
        mut inbound: S,
        out: mpsc::Sender<Result<RateRecordResponse, Status>>,
    ) -> Result<(), Status>
    where
        S: Stream<Item = Result<RateRecordRequest, Status>> + Send + Unpin,
    {
        const METHOD: &str = "RateRecord";
        let fail = |status: Status| log_status(METHOD, status);

        let mut rated = 0usize;
        while let Some(req) = receive(ctx, &mut inbound).await.map_err(fail)? {
            if !req.score.is_finite() {
                return Err(fail(Status::invalid_argument(format!(
                    "score must be a finite number, got {}",
                    req.score
                ))));
            }
            self.require_record(&req.record_id).await.map_err(fail)?;

            let rating = self.ratings.add(&req.record_id, req.score);
            let resp = RateRecordResponse {
                record_id: req.record_id,
                rated_count: rating.count,
                average_score: rating.average(),
            };
            if out.send(Ok(resp)).await.is_err() {
                return Err(fail(Status::canceled("cannot send response: stream closed")));
            }
            rated += 1;
        }

        debug!(rated, "rating stream closed by client");
        Ok(())
    }

    /// Number of stored records, for diagnostics.
    pub async fn record_count(&self) -> usize {
        self.records.len().await.unwrap_or_default()
    }

    /// The record must exist for an attachment or score to target it.
    async fn require_record(&self, record_id: &str) -> Result<(), Status> {
        match self.records.contains(record_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Status::invalid_argument(format!(
                "record {record_id} doesn't exist"
            ))),
            Err(e) => Err(Status::internal(format!("cannot find record: {e}"))),
        }
    }
}
