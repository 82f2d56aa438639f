//! Newline-delimited JSON framing for streamed request and response bodies.

use std::convert::Infallible;

use axum::body::Body;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;
use tokio_util::sync::DropGuard;
use tracing::warn;
use vitrine_core::{ResponseFrame, Status};

/// Longest accepted frame. Fits a base64-encoded chunk of a maximum-size
/// attachment.
pub const MAX_FRAME_BYTES: usize = 2 << 20;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Decode a request body of newline-delimited JSON messages.
///
/// Blank lines are skipped. A malformed, non-UTF-8 or oversized frame
/// yields `InvalidArgument`; a broken body yields `Canceled`.
pub fn decode_ndjson<T>(body: Body) -> impl Stream<Item = Result<T, Status>> + Send + Unpin
where
    T: DeserializeOwned + Send + 'static,
{
    let reader = StreamReader::new(
        body.into_data_stream()
            .map(|result| result.map_err(std::io::Error::other)),
    );
    FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_FRAME_BYTES)).filter_map(
        |line| async move {
            match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(serde_json::from_str::<T>(&line).map_err(|e| {
                    Status::invalid_argument(format!("malformed stream frame: {e}"))
                })),
                Err(LinesCodecError::MaxLineLengthExceeded) => Some(Err(
                    Status::invalid_argument(format!(
                        "stream frame exceeds {MAX_FRAME_BYTES} bytes"
                    )),
                )),
                Err(LinesCodecError::Io(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                    Some(Err(Status::invalid_argument(format!(
                        "malformed stream frame: {e}"
                    ))))
                }
                Err(LinesCodecError::Io(e)) => Some(Err(Status::canceled(format!(
                    "cannot receive stream frame: {e}"
                )))),
            }
        },
    )
    .boxed()
}

/// Encode a frame as one line of JSON.
pub fn encode_frame<T: Serialize>(frame: &ResponseFrame<T>) -> Bytes {
    match serde_json::to_vec(frame) {
        Ok(mut line) => {
            line.push(b'\n');
            Bytes::from(line)
        }
        Err(e) => {
            warn!(error = %e, "cannot serialize stream frame");
            let fallback: ResponseFrame<()> =
                ResponseFrame::Status(Status::internal("cannot serialize stream frame"));
            let mut line = serde_json::to_vec(&fallback).unwrap_or_default();
            line.push(b'\n');
            Bytes::from(line)
        }
    }
}

/// Turn a channel of outbound messages into a streaming NDJSON body.
///
/// `guard` is dropped together with the body, which cancels the call when
/// the client goes away.
pub fn ndjson_body<T>(rx: mpsc::Receiver<Result<T, Status>>, guard: DropGuard) -> Body
where
    T: Serialize + Send + 'static,
{
    let stream = ReceiverStream::new(rx).map(move |item| {
        let _ = &guard;
        Ok::<_, Infallible>(encode_frame(&ResponseFrame::from(item)))
    });
    Body::from_stream(stream)
}

#[cfg(test)]
mod tests {
    use vitrine_core::{Code, RateRecordRequest};

    use super::*;

    #[tokio::test]
    async fn decodes_frames_and_skips_blank_lines() {
        let body = Body::from(
            "{\"record_id\":\"a\",\"score\":1.0}\n\n{\"record_id\":\"b\",\"score\":2.5}\n",
        );
        let frames: Vec<_> = decode_ndjson::<RateRecordRequest>(body).collect().await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].as_ref().unwrap().record_id, "b");
    }

    #[tokio::test]
    async fn last_frame_needs_no_trailing_newline() {
        let body = Body::from("{\"record_id\":\"a\",\"score\":1.0}");
        let frames: Vec<_> = decode_ndjson::<RateRecordRequest>(body).collect().await;
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_ok());
    }

    #[tokio::test]
    async fn malformed_frame_is_invalid_argument() {
        let body = Body::from("{\"record_id\":\n");
        let frames: Vec<_> = decode_ndjson::<RateRecordRequest>(body).collect().await;
        assert_eq!(frames[0].as_ref().unwrap_err().code, Code::InvalidArgument);
    }

    #[tokio::test]
    async fn non_utf8_frame_is_invalid_argument() {
        let body = Body::from(vec![b'{', 0xff, 0xfe, b'}', b'\n']);
        let frames: Vec<_> = decode_ndjson::<RateRecordRequest>(body).collect().await;
        assert_eq!(frames[0].as_ref().unwrap_err().code, Code::InvalidArgument);
    }

    #[tokio::test]
    async fn broken_body_is_canceled() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"{\"record_id\":\"a\",\"score\":1.0}\n")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let body = Body::from_stream(futures::stream::iter(chunks));
        let frames: Vec<_> = decode_ndjson::<RateRecordRequest>(body).collect().await;
        assert!(frames[0].is_ok());
        assert_eq!(frames[1].as_ref().unwrap_err().code, Code::Canceled);
    }

    #[test]
    fn encoded_frame_is_one_line() {
        let line = encode_frame::<()>(&ResponseFrame::Status(Status::canceled("gone")));
        let text = std::str::from_utf8(&line).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 1);
        assert!(text.contains("\"canceled\""));
    }
}
