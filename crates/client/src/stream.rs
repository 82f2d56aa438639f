//! SSE record stream for `SearchRecords`.
//!
//! Parses the `record` and `status` events the server sends on
//! `/v1/records/search` into an async [`Stream`] of records.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::StreamExt;
use futures::stream::Stream;
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;
use vitrine_core::{Record, SearchRecordsResponse, Status};

use crate::Error;

const RECORD_EVENT: &str = "record";
const STATUS_EVENT: &str = "status";

/// A single SSE frame received from the server.
#[derive(Debug, Clone, Default)]
struct SseFrame {
    event: Option<String>,
    data: String,
}

/// What one frame means for the caller.
enum Parsed {
    Record(Record),
    Failed(Status),
    Skip,
}

/// An async stream of records matching a search.
///
/// Created via [`VitrineClient::search_records`](crate::VitrineClient::search_records).
/// A search that fails on the server after it started yields one
/// [`Error::Api`] and then ends. Dropping the stream closes the connection,
/// which cancels the search on the server.
pub struct RecordStream {
    inner: Pin<Box<dyn Stream<Item = Result<Record, Error>> + Send>>,
}

impl RecordStream {
    /// Collect every remaining record, stopping at the first error.
    pub async fn collect_all(mut self) -> Result<Vec<Record>, Error> {
        let mut records = Vec::new();
        while let Some(item) = self.next().await {
            records.push(item?);
        }
        Ok(records)
    }
}

impl Stream for RecordStream {
    type Item = Result<Record, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Create a `RecordStream` from a response carrying SSE data.
pub(crate) fn record_stream_from_response(response: reqwest::Response) -> RecordStream {
    let byte_stream = response.bytes_stream();
    let reader = StreamReader::new(byte_stream.map(|result| result.map_err(std::io::Error::other)));
    let lines = tokio::io::BufReader::new(reader).lines();

    let stream = futures::stream::unfold(
        (Some(lines), SseFrameState::default()),
        |(lines, mut frame_state)| async move {
            let mut lines = lines?;
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.is_empty() {
                            // Blank line = end of SSE frame.
                            let Some(frame) = frame_state.take_frame() else {
                                continue;
                            };
                            match parse_sse_frame(&frame) {
                                Ok(Parsed::Record(record)) => {
                                    return Some((Ok(record), (Some(lines), frame_state)));
                                }
                                Ok(Parsed::Failed(status)) => {
                                    return Some((Err(Error::Api(status)), (None, frame_state)));
                                }
                                Ok(Parsed::Skip) => continue,
                                Err(e) => return Some((Err(e), (None, frame_state))),
                            }
                        }

                        if line.starts_with(':') {
                            // Keep-alive comment.
                            continue;
                        }

                        if let Some(value) = line.strip_prefix("event:") {
                            frame_state.event = Some(value.trim().to_string());
                        } else if let Some(value) = line.strip_prefix("data:") {
                            frame_state.push_data(value.trim());
                        }
                    }
                    Ok(None) => return None,
                    Err(e) => {
                        return Some((
                            Err(Error::Connection(format!("SSE stream error: {e}"))),
                            (None, frame_state),
                        ));
                    }
                }
            }
        },
    );

    RecordStream {
        inner: Box::pin(stream),
    }
}

/// Intermediate state for parsing SSE frames line-by-line.
#[derive(Default)]
struct SseFrameState {
    event: Option<String>,
    data: Vec<String>,
}

impl SseFrameState {
    fn push_data(&mut self, line: &str) {
        self.data.push(line.to_string());
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        if self.data.is_empty() && self.event.is_none() {
            return None;
        }
        Some(SseFrame {
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

fn parse_sse_frame(frame: &SseFrame) -> Result<Parsed, Error> {
    match frame.event.as_deref().unwrap_or("message") {
        RECORD_EVENT => {
            let resp: SearchRecordsResponse = serde_json::from_str(&frame.data)
                .map_err(|e| Error::Deserialization(format!("failed to parse record event: {e}")))?;
            Ok(Parsed::Record(resp.record))
        }
        STATUS_EVENT => {
            let status: Status = serde_json::from_str(&frame.data)
                .map_err(|e| Error::Deserialization(format!("failed to parse status event: {e}")))?;
            Ok(Parsed::Failed(status))
        }
        _ => Ok(Parsed::Skip),
    }
}
